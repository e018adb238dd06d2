//! ana-core: motor determinista de map-reduce por etapas.
//!
//! Resuelve por tarea qué variación sistemática aplica realmente (colapsando
//! etapas insensibles al resultado nominal), direcciona artifacts de forma
//! canónica y libre de colisiones, y particiona datasets en branches
//! acotados que se procesan de forma independiente y se funden bajo
//! barreras.

pub mod constants;
pub mod errors;
pub mod event;
pub mod graph;
pub mod hashing;
pub mod identity;
pub mod partition;
pub mod shifts;
pub mod store;

pub use errors::{CoreError, StageError};
pub use event::{EventSink, InMemoryEventSink, NullEventSink, StageEvent, StageEventKind};
pub use graph::{Aggregator, BranchUnit, Collaborators, Converter, DatasetPipeline, FlowRunner,
                GraphBuilder, Reconstructor, RemoteSource, RunReport, SelectionResult, Selector,
                ShiftVarier, StageGraph};
pub use identity::{IdentityBuilder, StageKind, TaskIdentity};
pub use partition::{equal_slices, partial_slices, round_base, Partition};
pub use shifts::{resolve_effective, ShiftSensitivity};
pub use store::{Artifact, ArtifactKind, ArtifactStore, FsArtifactStore, InMemoryArtifactStore};
