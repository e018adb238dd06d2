//! Campañas: colecciones de datasets tomados en condiciones comunes.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{Dataset, DomainError};

/// Campaña de toma de datos (p.ej. Open Data 2011 @ 7 TeV). Agrupa datasets
/// y las condiciones bajo las que fueron producidos.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Campaign {
    name: String,
    id: u32,
    /// Energía de centro de masa en TeV.
    ecm: f64,
    /// Separación entre cruces de haz en ns.
    bx: f64,
    datasets: IndexMap<String, Dataset>,
}

impl Campaign {
    pub fn new(name: &str, id: u32, ecm: f64, bx: f64) -> Self {
        Self { name: name.to_string(),
               id,
               ecm,
               bx,
               datasets: IndexMap::new() }
    }

    pub fn add_dataset(&mut self, dataset: Dataset) -> Result<(), DomainError> {
        if self.datasets.contains_key(dataset.name()) {
            return Err(DomainError::Validation(format!("dataset '{}' already defined in campaign '{}'",
                                                       dataset.name(),
                                                       self.name)));
        }
        self.datasets.insert(dataset.name().to_string(), dataset);
        Ok(())
    }

    pub fn get_dataset(&self, name: &str) -> Result<&Dataset, DomainError> {
        self.datasets
            .get(name)
            .ok_or_else(|| DomainError::UnknownDataset(name.to_string()))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn ecm(&self) -> f64 {
        self.ecm
    }

    pub fn bx(&self) -> f64 {
        self.bx
    }

    /// Datasets en orden de inserción.
    pub fn datasets(&self) -> impl Iterator<Item = &Dataset> {
        self.datasets.values()
    }
}
