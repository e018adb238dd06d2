//! Errores del modelo de configuración y de la representación tabular.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("validation: {0}")] Validation(String),
    #[error("unknown campaign '{0}'")] UnknownCampaign(String),
    #[error("unknown dataset '{0}'")] UnknownDataset(String),
    #[error("unknown shift '{0}'")] UnknownShift(String),
    #[error("unknown config '{0}' for analysis '{1}'")] UnknownConfig(String, String),
    #[error("unknown process '{0}'")] UnknownProcess(String),
    #[error("unknown column '{0}'")] UnknownColumn(String),
    #[error("schema mismatch: {0}")] SchemaMismatch(String),
}
