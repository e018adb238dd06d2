//! Grafo de etapas: topología fija fetch → convert → map → [vary] →
//! select_reconstruct → reduce → aggregate, con construcción estática y
//! ejecución memoizada.

pub mod build;
pub mod collab;
pub mod run;

pub use build::{BranchUnit, DatasetPipeline, GraphBuilder, StageGraph};
pub use collab::{Aggregator, Converter, Reconstructor, RemoteSource, SelectionResult, Selector, ShiftVarier};
pub use run::{Collaborators, FlowRunner, RunReport};
