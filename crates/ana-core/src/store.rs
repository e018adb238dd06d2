//! Artifacts y su almacenamiento.
//!
//! Un `Artifact` es el output persistido de una unidad (etapa, identidad):
//! payload JSON neutral con hash de contenido blake3 sobre el JSON canónico.
//! El hash verifica idempotencia y da trazabilidad; la dirección la decide
//! la identidad ([`crate::identity::TaskIdentity::store_path`]).
//!
//! El trait [`ArtifactStore`] exige visibilidad atómica: un lector nunca
//! observa un artifact a medio escribir. Con la escritura "first write wins"
//! la producción es como máximo una vez por identidad; recrear tras un
//! borrado externo es seguro porque el contenido es determinista.

use std::fs;
use std::path::{Path, PathBuf};

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::constants::ENGINE_VERSION;
use crate::errors::CoreError;
use crate::hashing::hash_value;
use ana_domain::EventTable;

/// Tipos neutrales de artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArtifactKind {
    /// Bytes crudos tal como los entregó la fuente remota.
    RawBytes,
    /// Tabla de eventos serializada.
    EventTable,
    /// Paquete agregado entre datasets (keyed por variable/proceso).
    Bundle,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    pub kind: ArtifactKind,
    /// Hash canónico del payload.
    pub hash: String,
    pub payload: Value,
    /// Información auxiliar; no entra al hash.
    pub metadata: Option<Value>,
}

impl Artifact {
    pub fn new(kind: ArtifactKind, payload: Value) -> Self {
        let hash = hash_value(&payload);
        Self { kind,
               hash,
               payload,
               metadata: Some(json!({ "engine_version": ENGINE_VERSION })) }
    }

    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self::new(ArtifactKind::RawBytes, json!(bytes))
    }

    pub fn from_table(table: &EventTable) -> Result<Self, CoreError> {
        let payload = serde_json::to_value(table)
            .map_err(|e| CoreError::InvalidData(format!("cannot serialize table: {}", e)))?;
        Ok(Self::new(ArtifactKind::EventTable, payload))
    }

    pub fn as_bytes(&self) -> Result<Vec<u8>, CoreError> {
        serde_json::from_value(self.payload.clone())
            .map_err(|e| CoreError::InvalidData(format!("artifact payload is not raw bytes: {}", e)))
    }

    pub fn as_table(&self) -> Result<EventTable, CoreError> {
        serde_json::from_value(self.payload.clone())
            .map_err(|e| CoreError::InvalidData(format!("artifact payload is not an event table: {}", e)))
    }
}

/// Colaborador de almacenamiento de artifacts.
pub trait ArtifactStore: Send + Sync {
    fn exists(&self, path: &str) -> bool;
    /// Lee un artifact; si no existe, `UpstreamMissing`.
    fn read(&self, path: &str) -> Result<Artifact, CoreError>;
    /// Escribe con visibilidad atómica. Si la ruta ya tiene contenido, la
    /// escritura se ignora (first write wins).
    fn write(&self, path: &str, artifact: &Artifact) -> Result<(), CoreError>;
}

/// Store en memoria, apto para ejecución paralela de branches.
#[derive(Debug, Default)]
pub struct InMemoryArtifactStore {
    inner: DashMap<String, Artifact>,
}

impl InMemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Borra un artifact (simula borrado externo; re-creación idempotente).
    pub fn remove(&self, path: &str) -> Option<Artifact> {
        self.inner.remove(path).map(|(_, artifact)| artifact)
    }
}

impl ArtifactStore for InMemoryArtifactStore {
    fn exists(&self, path: &str) -> bool {
        self.inner.contains_key(path)
    }

    fn read(&self, path: &str) -> Result<Artifact, CoreError> {
        self.inner
            .get(path)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| CoreError::UpstreamMissing(path.to_string()))
    }

    fn write(&self, path: &str, artifact: &Artifact) -> Result<(), CoreError> {
        match self.inner.entry(path.to_string()) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                log::debug!("artifact already present at '{}', keeping existing content", path);
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(artifact.clone());
            }
        }
        Ok(())
    }
}

/// Store en disco bajo un directorio raíz. Cada artifact es un archivo JSON;
/// la escritura pasa por un archivo temporal en el mismo directorio seguido
/// de un rename, lo que da la visibilidad atómica requerida.
#[derive(Debug)]
pub struct FsArtifactStore {
    root: PathBuf,
}

impl FsArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, CoreError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| CoreError::TransientIo(e.to_string()))?;
        Ok(Self { root })
    }

    /// Raíz tomada de `ANALYSIS_LOCAL_STORE`.
    pub fn from_env() -> Result<Self, CoreError> {
        let root = std::env::var("ANALYSIS_LOCAL_STORE")
            .map_err(|_| CoreError::Configuration("ANALYSIS_LOCAL_STORE is not set".to_string()))?;
        Self::new(root)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    // El sufijo se concatena literal: `with_extension` reemplazaría lo que
    // siga al último punto del segmento final y colapsaría rutas distintas.
    fn file_path(&self, path: &str) -> PathBuf {
        let mut file = self.root.join(path).into_os_string();
        file.push(".json");
        PathBuf::from(file)
    }
}

impl ArtifactStore for FsArtifactStore {
    fn exists(&self, path: &str) -> bool {
        self.file_path(path).is_file()
    }

    fn read(&self, path: &str) -> Result<Artifact, CoreError> {
        let file = self.file_path(path);
        if !file.is_file() {
            return Err(CoreError::UpstreamMissing(path.to_string()));
        }
        let bytes = fs::read(&file).map_err(|e| CoreError::TransientIo(e.to_string()))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| CoreError::InvalidData(format!("malformed artifact at '{}': {}", path, e)))
    }

    fn write(&self, path: &str, artifact: &Artifact) -> Result<(), CoreError> {
        let file = self.file_path(path);
        if file.is_file() {
            log::debug!("artifact already present at '{}', keeping existing content", path);
            return Ok(());
        }
        let parent = file.parent()
                         .ok_or_else(|| CoreError::TransientIo(format!("bad artifact path '{}'", path)))?;
        fs::create_dir_all(parent).map_err(|e| CoreError::TransientIo(e.to_string()))?;
        let tmp = tempfile::NamedTempFile::new_in(parent)
            .map_err(|e| CoreError::TransientIo(e.to_string()))?;
        serde_json::to_writer(tmp.as_file(), artifact).map_err(|e| CoreError::TransientIo(e.to_string()))?;
        tmp.persist(&file).map_err(|e| CoreError::TransientIo(e.to_string()))?;
        Ok(())
    }
}
