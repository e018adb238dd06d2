//! ana-domain: modelo de configuración del análisis.
//!
//! Campañas, datasets (con overrides por shift), shifts sistemáticos,
//! procesos, variables y la representación tabular de eventos. Todo es de
//! sólo lectura durante una ejecución: se define en tiempo de configuración
//! y se consulta a través de un [`Registry`] explícito.

pub mod campaign;
pub mod config;
pub mod dataset;
pub mod error;
pub mod process;
pub mod shift;
pub mod table;
pub mod variable;

pub use campaign::Campaign;
pub use config::{AnalysisConfig, Channel, Registry};
pub use dataset::{Dataset, DatasetInfo};
pub use error::DomainError;
pub use process::Process;
pub use shift::{Shift, ShiftDirection, ShiftKind, NOMINAL};
pub use table::EventTable;
pub use variable::{Binning, Variable};
