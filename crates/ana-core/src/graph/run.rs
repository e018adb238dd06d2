//! Ejecución del grafo.
//!
//! El runner recorre un [`StageGraph`] ya construido. Antes de ejecutar cada
//! unidad comprueba si su artifact existe en la ruta derivada: si existe, la
//! unidad se salta (memoización, producción como máximo una vez por
//! identidad). Las etapas de branch corren en paralelo con rayon; no tocan
//! estado mutable compartido. Reduce y Aggregate son barreras: sólo
//! concatenan cuando observan completo su conjunto de dependencias.
//!
//! Un fallo es fatal únicamente para su unidad (stage, identidad): los
//! branches y datasets hermanos continúan, y una barrera con dependencias
//! ausentes falla con `UpstreamMissing` sin afectar al resto.

use indexmap::IndexMap;
use rayon::prelude::*;
use uuid::Uuid;

use crate::errors::{CoreError, StageError};
use crate::event::{EventSink, StageEventKind};
use crate::graph::build::{BranchUnit, DatasetPipeline, StageGraph};
use crate::graph::collab::{Aggregator, Converter, Reconstructor, RemoteSource, Selector, ShiftVarier};
use crate::identity::TaskIdentity;
use crate::partition::equal_slices;
use crate::store::{Artifact, ArtifactKind, ArtifactStore};
use ana_domain::{AnalysisConfig, EventTable, Registry};

/// Colaboradores inyectados en el runner.
pub struct Collaborators {
    pub source: Box<dyn RemoteSource>,
    pub converter: Box<dyn Converter>,
    pub varier: Box<dyn ShiftVarier>,
    pub selector: Box<dyn Selector>,
    pub reconstructor: Box<dyn Reconstructor>,
    pub aggregator: Box<dyn Aggregator>,
}

/// Resultado de una ejecución, a granularidad de unidad.
#[derive(Debug)]
pub struct RunReport {
    pub run_id: Uuid,
    pub completed: Vec<TaskIdentity>,
    pub skipped: Vec<TaskIdentity>,
    pub failed: Vec<StageError>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// Unidades que el runner llegó a considerar.
    pub fn n_units(&self) -> usize {
        self.completed.len() + self.skipped.len() + self.failed.len()
    }
}

enum UnitOutcome {
    Completed(TaskIdentity),
    Skipped(TaskIdentity),
    Failed(StageError),
}

impl UnitOutcome {
    fn is_failed(&self) -> bool {
        matches!(self, UnitOutcome::Failed(_))
    }
}

pub struct FlowRunner<'a, S: ArtifactStore, E: EventSink> {
    registry: &'a Registry,
    store: S,
    events: E,
    collab: Collaborators,
}

impl<'a, S: ArtifactStore, E: EventSink> FlowRunner<'a, S, E> {
    pub fn new(registry: &'a Registry, store: S, events: E, collab: Collaborators) -> Self {
        Self { registry, store, events, collab }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn events(&self) -> &E {
        &self.events
    }

    /// Ejecuta el grafo completo y devuelve el reporte por unidad. El único
    /// error directo es de configuración (registro inconsistente con el
    /// grafo); todo fallo de ejecución queda aislado en el reporte.
    pub fn run(&self, graph: &StageGraph) -> Result<RunReport, CoreError> {
        let config = self.registry.get_config(&graph.analysis, &graph.config)?;
        let run_id = Uuid::new_v4();
        self.events.append(run_id,
                           StageEventKind::GraphBuilt { requested_shift: graph.requested_shift.clone(),
                                                        datasets: graph.pipelines.len(),
                                                        units: graph.n_units() });
        log::info!("run {}: shift '{}', {} datasets, {} units",
                   run_id,
                   graph.requested_shift,
                   graph.pipelines.len(),
                   graph.n_units());

        let mut outcomes: Vec<UnitOutcome> = graph.pipelines
                                                  .par_iter()
                                                  .map(|p| self.run_pipeline(run_id, config, p))
                                                  .collect::<Vec<_>>()
                                                  .into_iter()
                                                  .flatten()
                                                  .collect();
        outcomes.push(self.run_aggregate(run_id, config, graph));

        let mut report = RunReport { run_id,
                                     completed: Vec::new(),
                                     skipped: Vec::new(),
                                     failed: Vec::new() };
        for outcome in outcomes {
            match outcome {
                UnitOutcome::Completed(identity) => report.completed.push(identity),
                UnitOutcome::Skipped(identity) => report.skipped.push(identity),
                UnitOutcome::Failed(error) => report.failed.push(error),
            }
        }
        Ok(report)
    }

    /// Cadena de un dataset. Si fetch o convert fallan, el resto del
    /// subgrafo ni se intenta: sus barreras quedan insatisfechas hasta una
    /// ejecución posterior.
    fn run_pipeline(&self, run_id: Uuid, config: &AnalysisConfig, p: &DatasetPipeline) -> Vec<UnitOutcome> {
        let mut outcomes = Vec::new();

        let fetch = self.execute(run_id, &p.fetch, || {
            let bytes = self.collab.source.fetch(&p.source_key)?;
            Ok(Artifact::from_bytes(&bytes))
        });
        let failed = fetch.is_failed();
        outcomes.push(fetch);
        if failed {
            return outcomes;
        }

        let convert = self.execute(run_id, &p.convert, || {
            let raw = self.store.read(&p.fetch.store_path())?;
            let table = self.collab.converter.convert(&raw.as_bytes()?)?;
            Artifact::from_table(&table)
        });
        let failed = convert.is_failed();
        outcomes.push(convert);
        if failed {
            return outcomes;
        }

        let branch_outcomes: Vec<Vec<UnitOutcome>> = p.branches
                                                      .par_iter()
                                                      .map(|b| self.run_branch(run_id, config, p, b))
                                                      .collect();
        outcomes.extend(branch_outcomes.into_iter().flatten());

        outcomes.push(self.run_reduce(run_id, p));
        outcomes
    }

    fn run_branch(&self,
                  run_id: Uuid,
                  config: &AnalysisConfig,
                  p: &DatasetPipeline,
                  b: &BranchUnit)
                  -> Vec<UnitOutcome> {
        let mut outcomes = Vec::new();

        let map = self.execute(run_id, &b.map, || {
            let table = self.store.read(&p.convert.store_path())?.as_table()?;
            let branch = b.map
                          .branch()
                          .ok_or_else(|| CoreError::Configuration("map identity without branch".to_string()))?;
            // particiones a granularidad de fila (block = 1)
            let slices = equal_slices(table.n_rows(), p.n_branches, 1)?;
            let slice = slices[branch];
            Artifact::from_table(&table.slice(slice.start, slice.end)?)
        });
        let failed = map.is_failed();
        outcomes.push(map);
        if failed {
            return outcomes;
        }

        if let Some(vary) = &b.vary {
            let outcome = self.execute(run_id, vary, || {
                let mut table = self.store.read(&b.map.store_path())?.as_table()?;
                let shift = config.get_shift(vary.effective_shift())?;
                self.collab.varier.apply(&mut table, shift, vary)?;
                Artifact::from_table(&table)
            });
            let failed = outcome.is_failed();
            outcomes.push(outcome);
            if failed {
                return outcomes;
            }
        }

        let select = self.execute(run_id, &b.select, || {
            let table = self.store.read(&b.select_input().store_path())?.as_table()?;
            let selection = self.collab.selector.select(&table)?;
            self.publish(run_id,
                         &b.select,
                         format!("selected {} of {} events", selection.indexes.len(), table.n_rows()));
            let selected = table.select(&selection.indexes)?;
            let reco = self.collab.reconstructor.reconstruct(&selected, &selection.objects)?;
            self.publish(run_id, &b.select, format!("reconstructed {} variables", reco.n_columns()));
            Artifact::from_table(&selected.join(&reco)?)
        });
        outcomes.push(select);
        outcomes
    }

    /// Barrera por dataset: concatena los outputs de SelectReconstruct en
    /// orden estricto de índice de branch, independiente del orden real de
    /// terminación.
    fn run_reduce(&self, run_id: Uuid, p: &DatasetPipeline) -> UnitOutcome {
        self.execute(run_id, &p.reduce, || {
            let mut parts = Vec::with_capacity(p.branches.len());
            for b in &p.branches {
                parts.push(self.store.read(&b.select.store_path())?.as_table()?);
            }
            let table = EventTable::concat(&parts)?;
            Artifact::from_table(&table)
        })
    }

    /// Barrera por configuración: exige el Reduce de cada dataset
    /// seleccionado y agrupa las tablas por proceso declarado.
    fn run_aggregate(&self, run_id: Uuid, config: &AnalysisConfig, graph: &StageGraph) -> UnitOutcome {
        self.execute(run_id, &graph.aggregate, || {
            let mut per_process: IndexMap<String, Vec<EventTable>> = IndexMap::new();
            for p in &graph.pipelines {
                let table = self.store.read(&p.reduce.store_path())?.as_table()?;
                self.publish(run_id,
                             &graph.aggregate,
                             format!("loaded events for dataset {}", p.dataset));
                per_process.entry(p.process.clone()).or_default().push(table);
            }
            let mut grouped = IndexMap::new();
            for (process, tables) in per_process {
                grouped.insert(process, EventTable::concat(&tables)?);
            }
            let payload = self.collab.aggregator.aggregate(&grouped, config)?;
            Ok(Artifact::new(ArtifactKind::Bundle, payload))
        })
    }

    /// Patrón común de toda unidad: memoización por existencia, eventos de
    /// progreso y aislamiento del fallo con su identidad completa.
    fn execute<F>(&self, run_id: Uuid, identity: &TaskIdentity, f: F) -> UnitOutcome
        where F: FnOnce() -> Result<Artifact, CoreError>
    {
        let path = identity.store_path();
        if self.store.exists(&path) {
            log::debug!("skip {}: artifact exists at '{}'", identity, path);
            self.events.append(run_id,
                               StageEventKind::StageSkipped { identity: identity.clone(), path });
            return UnitOutcome::Skipped(identity.clone());
        }
        self.events.append(run_id, StageEventKind::StageStarted { identity: identity.clone() });
        let result = f().and_then(|artifact| {
                             self.store.write(&path, &artifact)?;
                             Ok(artifact)
                         });
        match result {
            Ok(artifact) => {
                log::info!("finished {} -> '{}'", identity, path);
                self.events.append(run_id,
                                   StageEventKind::StageFinished { identity: identity.clone(),
                                                                   path,
                                                                   output_hash: artifact.hash.clone() });
                UnitOutcome::Completed(identity.clone())
            }
            Err(kind) => {
                log::warn!("failed {}: {}", identity, kind);
                self.events.append(run_id,
                                   StageEventKind::StageFailed { identity: identity.clone(),
                                                                 error: kind.clone() });
                UnitOutcome::Failed(StageError::new(identity.clone(), kind))
            }
        }
    }

    fn publish(&self, run_id: Uuid, identity: &TaskIdentity, text: String) {
        self.events.append(run_id,
                           StageEventKind::Message { identity: identity.clone(), text });
    }
}
