//! Datasets y sus overrides por shift.
//!
//! Un `Dataset` es inmutable una vez registrado en una campaña. Su
//! información por defecto (`nominal`) puede ser sobreescrita por shift:
//! claves de origen, número de particiones (`n_files`) y número de eventos
//! pueden diferir para una variación concreta.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::shift::NOMINAL;

/// Información de un dataset para un shift concreto.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetInfo {
    /// Claves de origen ordenadas (URLs).
    pub keys: Vec<String>,
    /// Número de particiones (branches) declarado.
    pub n_files: usize,
    /// Número de eventos declarado (metadato, no se valida contra los datos).
    pub n_events: u64,
}

impl DatasetInfo {
    pub fn new(keys: Vec<String>, n_files: usize, n_events: u64) -> Self {
        Self { keys, n_files, n_events }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    name: String,
    id: u32,
    /// Proceso físico declarado al que se asignan los eventos del dataset.
    process: String,
    /// Info por shift; la entrada `nominal` siempre existe.
    info: IndexMap<String, DatasetInfo>,
}

impl Dataset {
    pub fn new(name: &str, id: u32, process: &str, nominal: DatasetInfo) -> Self {
        let mut info = IndexMap::new();
        info.insert(NOMINAL.to_string(), nominal);
        Self { name: name.to_string(),
               id,
               process: process.to_string(),
               info }
    }

    /// Registra un override de info para un shift concreto.
    pub fn with_info(mut self, shift: &str, info: DatasetInfo) -> Self {
        self.info.insert(shift.to_string(), info);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn process(&self) -> &str {
        &self.process
    }

    /// Info correspondiente a un shift; si no hay override cae a `nominal`.
    pub fn info(&self, shift: &str) -> &DatasetInfo {
        self.info
            .get(shift)
            .unwrap_or_else(|| &self.info[NOMINAL])
    }

    /// Indica si el dataset declara un override para el shift dado.
    pub fn has_info(&self, shift: &str) -> bool {
        self.info.contains_key(shift)
    }

    /// Nombres de shift con override (excluye `nominal`).
    pub fn override_shifts(&self) -> impl Iterator<Item = &str> {
        self.info.keys().map(|k| k.as_str()).filter(|k| *k != NOMINAL)
    }
}
