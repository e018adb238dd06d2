//! ana-adapters: colaboradores concretos del motor.
//!
//! Implementaciones de los traits de `ana-core` para el análisis single-top
//! sobre el formato de eventos aplanado de Open Data 2011: fuente estática,
//! conversor JSON, smearing JER, selección y reconstrucción del canal muón,
//! histogramas apilables y la configuración de referencia.

pub mod histogram;
pub mod opendata;
pub mod reconstruction;
pub mod selection;
pub mod setup;
pub mod source;
pub mod systematics;

pub use histogram::{Histogram, StackAggregator};
pub use reconstruction::SingleTopReconstructor;
pub use selection::SingleTopSelector;
pub use setup::{singletop_registry, synthetic_source, synthetic_table};
pub use source::{JsonConverter, StaticSource};
pub use systematics::JerVarier;
