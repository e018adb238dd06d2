//! Fuente remota estática y conversor JSON.
//!
//! `StaticSource` sirve bytes preparados en memoria por URL: el doble de la
//! descarga real para demos y tests (el fetch de producción es un
//! colaborador externo al motor). `JsonConverter` parsea esos bytes como una
//! [`EventTable`] serializada.

use indexmap::IndexMap;

use ana_core::{Converter, CoreError, RemoteSource};
use ana_domain::EventTable;

#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    files: IndexMap<String, Vec<u8>>,
}

impl StaticSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, url: &str, bytes: Vec<u8>) {
        self.files.insert(url.to_string(), bytes);
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl RemoteSource for StaticSource {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, CoreError> {
        self.files
            .get(url)
            .cloned()
            .ok_or_else(|| CoreError::TransientIo(format!("unknown source '{}'", url)))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonConverter;

impl Converter for JsonConverter {
    fn convert(&self, raw: &[u8]) -> Result<EventTable, CoreError> {
        serde_json::from_slice(raw)
            .map_err(|e| CoreError::InvalidData(format!("raw blob is not a serialized event table: {}", e)))
    }
}
