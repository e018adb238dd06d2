//! Stream de eventos de progreso.
//!
//! Observabilidad opcional: cada ejecución emite eventos estructurados a un
//! [`EventSink`]. Los eventos no afectan al contenido de los outputs; un
//! consumidor externo puede usarlos para progreso, auditoría o replay de la
//! traza de una ejecución.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::CoreError;
use crate::identity::TaskIdentity;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StageEventKind {
    /// El grafo quedó construido: topología fijada, edges condicionales
    /// decididos. Debe ser el primer evento de un `run_id`.
    GraphBuilt {
        requested_shift: String,
        datasets: usize,
        units: usize,
    },
    /// Una unidad comenzó a ejecutar. No implica éxito.
    StageStarted { identity: TaskIdentity },
    /// El artifact ya existía en su ruta; la unidad no se ejecuta
    /// (memoización, no es un error).
    StageSkipped { identity: TaskIdentity, path: String },
    /// La unidad terminó y su artifact quedó visible.
    StageFinished {
        identity: TaskIdentity,
        path: String,
        output_hash: String,
    },
    /// La unidad falló de forma terminal. Los siblings no se ven afectados.
    StageFailed { identity: TaskIdentity, error: CoreError },
    /// Hito ligero publicado por una etapa (p.ej. "selected N of M events").
    Message { identity: TaskIdentity, text: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageEvent {
    /// Orden de append dentro del run.
    pub seq: u64,
    pub run_id: Uuid,
    pub kind: StageEventKind,
    /// Metadato; no participa en ningún hash.
    pub ts: DateTime<Utc>,
}

/// Sink de eventos append-only. Las etapas de branch emiten en paralelo, por
/// lo que el sink debe aceptar appends concurrentes.
pub trait EventSink: Send + Sync {
    fn append(&self, run_id: Uuid, kind: StageEventKind) -> StageEvent;
    /// Eventos de un run en orden ascendente de `seq`.
    fn list(&self, run_id: Uuid) -> Vec<StageEvent>;
}

#[derive(Debug, Default)]
pub struct InMemoryEventSink {
    inner: DashMap<Uuid, Vec<StageEvent>>,
}

impl InMemoryEventSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EventSink for InMemoryEventSink {
    fn append(&self, run_id: Uuid, kind: StageEventKind) -> StageEvent {
        let mut events = self.inner.entry(run_id).or_default();
        let event = StageEvent { seq: events.len() as u64,
                                 run_id,
                                 kind,
                                 ts: Utc::now() };
        events.push(event.clone());
        event
    }

    fn list(&self, run_id: Uuid) -> Vec<StageEvent> {
        self.inner.get(&run_id).map(|e| e.clone()).unwrap_or_default()
    }
}

/// Sink que descarta todo; para ejecuciones sin observador.
#[derive(Debug, Default)]
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn append(&self, run_id: Uuid, kind: StageEventKind) -> StageEvent {
        StageEvent { seq: 0, run_id, kind, ts: Utc::now() }
    }

    fn list(&self, _run_id: Uuid) -> Vec<StageEvent> {
        Vec::new()
    }
}
