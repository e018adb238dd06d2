//! Taxonomía de errores del motor.
//!
//! - `Configuration`: fatal en construcción del grafo; nunca se reintenta.
//! - `UpstreamMissing`: una etapa arranca sin su artifact de entrada; fatal
//!   sólo para esa unidad (stage, identidad).
//! - `SchemaMismatch`: los branches de un Reduce no comparten columnas.
//! - `TransientIo`: fallo de IO del fetch o del store; la política de
//!   reintentos vive fuera del motor.
//! - `InvalidData`: entrada malformada para una etapa concreta.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::identity::TaskIdentity;
use ana_domain::DomainError;

#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoreError {
    #[error("configuration: {0}")] Configuration(String),
    #[error("upstream artifact missing at '{0}'")] UpstreamMissing(String),
    #[error("schema mismatch: {0}")] SchemaMismatch(String),
    #[error("transient io: {0}")] TransientIo(String),
    #[error("invalid data: {0}")] InvalidData(String),
}

impl From<DomainError> for CoreError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::SchemaMismatch(msg) => CoreError::SchemaMismatch(msg),
            DomainError::UnknownCampaign(_)
            | DomainError::UnknownDataset(_)
            | DomainError::UnknownShift(_)
            | DomainError::UnknownConfig(_, _)
            | DomainError::UnknownProcess(_) => CoreError::Configuration(err.to_string()),
            DomainError::UnknownColumn(_) | DomainError::Validation(_) => {
                CoreError::InvalidData(err.to_string())
            }
        }
    }
}

/// Error de una unidad concreta (stage, identidad). Lleva la identidad
/// completa para permitir re-ejecutar exactamente la unidad fallida.
#[derive(Debug, Error, Clone, PartialEq, Serialize, Deserialize)]
#[error("{kind} [{identity}]")]
pub struct StageError {
    pub identity: TaskIdentity,
    pub kind: CoreError,
}

impl StageError {
    pub fn new(identity: TaskIdentity, kind: CoreError) -> Self {
        Self { identity, kind }
    }
}
