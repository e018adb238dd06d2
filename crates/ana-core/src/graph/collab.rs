//! Traits de colaboradores externos del pipeline.
//!
//! El motor no implementa descarga remota, parsing de formatos, fórmulas de
//! selección/reconstrucción ni la perturbación numérica de los shifts; todo
//! eso se inyecta detrás de estos traits. Las etapas de branch ejecutan en
//! paralelo, por lo que los colaboradores deben ser `Send + Sync`.

use indexmap::IndexMap;
use serde_json::Value;

use crate::errors::CoreError;
use crate::identity::TaskIdentity;
use crate::shifts::ShiftSensitivity;
use ana_domain::{AnalysisConfig, EventTable, Shift};

/// Fuente remota usada por Fetch. Los fallos son IO transitorio; la política
/// de reintentos vive fuera del motor.
pub trait RemoteSource: Send + Sync {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, CoreError>;
}

/// Convierte los bytes crudos de un dataset en la representación tabular.
pub trait Converter: Send + Sync {
    fn convert(&self, raw: &[u8]) -> Result<EventTable, CoreError>;
}

/// Aplica la perturbación de un shift sobre una tabla de branch, in place.
/// `sensitivity` declara a qué shifts reacciona: define también la
/// sensibilidad de las etapas aguas abajo (SelectReconstruct, Reduce,
/// Aggregate), como en la cadena original.
pub trait ShiftVarier: Send + Sync {
    fn sensitivity(&self) -> ShiftSensitivity;
    fn apply(&self,
             events: &mut EventTable,
             shift: &Shift,
             identity: &TaskIdentity)
             -> Result<(), CoreError>;
}

/// Resultado de la selección: índices de filas supervivientes (orden
/// original) más un objeto auxiliar por fila seleccionada.
#[derive(Debug, Clone)]
pub struct SelectionResult {
    pub indexes: Vec<usize>,
    pub objects: Vec<Value>,
}

/// Predicado de selección sobre una tabla de branch.
pub trait Selector: Send + Sync {
    fn select(&self, events: &EventTable) -> Result<SelectionResult, CoreError>;
}

/// Paso de reconstrucción: produce una tabla de columnas derivadas, una fila
/// por evento seleccionado. El motor la une a las columnas originales.
pub trait Reconstructor: Send + Sync {
    fn reconstruct(&self, events: &EventTable, objects: &[Value]) -> Result<EventTable, CoreError>;
}

/// Combinación entre datasets: recibe una tabla por proceso declarado y
/// produce el payload del artifact agregado (p.ej. histogramas por variable).
pub trait Aggregator: Send + Sync {
    fn aggregate(&self,
                 per_process: &IndexMap<String, EventTable>,
                 config: &AnalysisConfig)
                 -> Result<Value, CoreError>;
}
