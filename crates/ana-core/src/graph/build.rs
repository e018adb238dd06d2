//! Construcción del grafo de etapas.
//!
//! La topología es fija (fetch → convert → map → [vary] → select_reconstruct
//! → reduce → aggregate) y queda completamente decidida aquí, una vez por
//! petición de ejecución: shifts efectivos resueltos, número de branches
//! fijado y el edge condicional de Vary presente o ausente. El runner no
//! re-evalúa nada de esto.

use serde::{Deserialize, Serialize};

use crate::errors::CoreError;
use crate::identity::{IdentityBuilder, StageKind, TaskIdentity};
use crate::shifts::{resolve_effective, ShiftSensitivity};
use ana_domain::{Registry, NOMINAL};

/// Unidades de un branch concreto. `vary` sólo está presente cuando el shift
/// efectivo del branch no es nominal y la sensibilidad declarada lo cubre;
/// en su ausencia, SelectReconstruct lee directamente el output de Map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BranchUnit {
    pub map: TaskIdentity,
    pub vary: Option<TaskIdentity>,
    pub select: TaskIdentity,
}

impl BranchUnit {
    /// Identidad cuyo artifact consume SelectReconstruct.
    pub fn select_input(&self) -> &TaskIdentity {
        self.vary.as_ref().unwrap_or(&self.map)
    }
}

/// Subgrafo de un dataset: cadena por dataset más sus branches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetPipeline {
    pub dataset: String,
    pub process: String,
    /// Clave de origen que descarga Fetch.
    pub source_key: String,
    pub fetch: TaskIdentity,
    pub convert: TaskIdentity,
    pub n_branches: usize,
    pub branches: Vec<BranchUnit>,
    pub reduce: TaskIdentity,
}

/// Grafo estático de una petición de ejecución.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageGraph {
    pub analysis: String,
    pub config: String,
    pub version: Option<String>,
    pub requested_shift: String,
    pub pipelines: Vec<DatasetPipeline>,
    pub aggregate: TaskIdentity,
}

impl StageGraph {
    /// Número total de unidades (etapa, identidad) del grafo.
    pub fn n_units(&self) -> usize {
        let per_dataset: usize = self.pipelines
                                     .iter()
                                     .map(|p| {
                                         let vary: usize =
                                             p.branches.iter().filter(|b| b.vary.is_some()).count();
                                         // fetch + convert + map*k + vary + select*k + reduce
                                         3 + 2 * p.n_branches + vary
                                     })
                                     .sum();
        per_dataset + 1
    }
}

/// Construye grafos para una configuración concreta. La sensibilidad de la
/// cadena vary/select/reduce/aggregate se toma del varier inyectado.
#[derive(Debug, Clone)]
pub struct GraphBuilder<'a> {
    registry: &'a Registry,
    analysis: String,
    config: String,
    version: Option<String>,
    sensitivity: ShiftSensitivity,
}

impl<'a> GraphBuilder<'a> {
    pub fn new(registry: &'a Registry, analysis: &str, config: &str) -> Self {
        Self { registry,
               analysis: analysis.to_string(),
               config: config.to_string(),
               version: None,
               sensitivity: ShiftSensitivity::none() }
    }

    pub fn version(mut self, version: &str) -> Self {
        self.version = Some(version.to_string());
        self
    }

    pub fn sensitivity(mut self, sensitivity: ShiftSensitivity) -> Self {
        self.sensitivity = sensitivity;
        self
    }

    /// Construye el grafo para el shift solicitado. Un shift desconocido
    /// para la configuración es fatal aquí, no en ejecución.
    pub fn build(&self, requested_shift: &str) -> Result<StageGraph, CoreError> {
        let config = self.registry.get_config(&self.analysis, &self.config)?;

        let mut base = IdentityBuilder::for_analysis(&self.analysis).config(&self.config);
        if let Some(version) = &self.version {
            base = base.version(version);
        }

        let mut pipelines = Vec::new();
        for dataset_name in config.datasets() {
            let dataset = self.registry.dataset(config, dataset_name)?;

            // La cadena por dataset (fetch, convert, map) no declara
            // sensibilidad: su shift efectivo sólo puede venir de un override
            // del dataset, que también fija n_files y las claves de origen.
            // Si el override cambia las claves, sus artifacts deben vivir
            // bajo el shift del override, nunca en la ruta nominal.
            let map_shift = resolve_effective(config,
                                              Some(dataset),
                                              requested_shift,
                                              &ShiftSensitivity::none())?;
            let branch_shift =
                resolve_effective(config, Some(dataset), requested_shift, &self.sensitivity)?;

            let fetch = base.clone()
                            .stage(StageKind::Fetch)
                            .dataset(dataset_name)
                            .shift(requested_shift, &map_shift)
                            .build()?;
            let convert = base.clone()
                              .stage(StageKind::Convert)
                              .dataset(dataset_name)
                              .shift(requested_shift, &map_shift)
                              .build()?;

            let info = dataset.info(&map_shift);
            let n_branches = info.n_files;
            if n_branches == 0 {
                return Err(CoreError::Configuration(format!("dataset '{}' declares n_files = 0",
                                                            dataset_name)));
            }
            let source_key = info.keys
                                 .first()
                                 .cloned()
                                 .ok_or_else(|| CoreError::Configuration(format!("dataset '{}' has no source keys",
                                                                                 dataset_name)))?;

            let vary_here =
                branch_shift != NOMINAL && self.sensitivity.contains(&branch_shift);

            let mut branches = Vec::with_capacity(n_branches);
            for branch in 0..n_branches {
                let map = base.clone()
                              .stage(StageKind::Map)
                              .dataset(dataset_name)
                              .shift(requested_shift, &map_shift)
                              .branch(branch)
                              .build()?;
                let vary = if vary_here {
                    Some(base.clone()
                             .stage(StageKind::Vary)
                             .dataset(dataset_name)
                             .shift(requested_shift, &branch_shift)
                             .branch(branch)
                             .build()?)
                } else {
                    None
                };
                let select = base.clone()
                                 .stage(StageKind::SelectReconstruct)
                                 .dataset(dataset_name)
                                 .shift(requested_shift, &branch_shift)
                                 .branch(branch)
                                 .build()?;
                branches.push(BranchUnit { map, vary, select });
            }

            let reduce = base.clone()
                             .stage(StageKind::Reduce)
                             .dataset(dataset_name)
                             .shift(requested_shift, &branch_shift)
                             .build()?;

            pipelines.push(DatasetPipeline { dataset: dataset_name.to_string(),
                                             process: dataset.process().to_string(),
                                             source_key,
                                             fetch,
                                             convert,
                                             n_branches,
                                             branches,
                                             reduce });
        }

        let aggregate_shift = resolve_effective(config, None, requested_shift, &self.sensitivity)?;
        let aggregate = base.stage(StageKind::Aggregate)
                            .shift(requested_shift, &aggregate_shift)
                            .build()?;

        Ok(StageGraph { analysis: self.analysis.clone(),
                        config: self.config.clone(),
                        version: self.version.clone(),
                        requested_shift: requested_shift.to_string(),
                        pipelines,
                        aggregate })
    }
}
