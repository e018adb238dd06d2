//! Identidad de tarea y direccionamiento canónico de artifacts.
//!
//! Una `TaskIdentity` es la tupla inmutable que identifica la unidad
//! (etapa, parámetros) que produce un artifact. Se construye de forma
//! progresiva con [`IdentityBuilder`]: cada capa (análisis → config → etapa →
//! dataset → shift → branch) aporta campos, ninguna sobreescribe
//! comportamiento. La dirección de almacenamiento se deriva con
//! [`TaskIdentity::store_path`]; identidades que sólo difieren en el shift
//! solicitado pero comparten el efectivo colapsan a la misma ruta — así se
//! evita recomputar.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::CoreError;
use ana_domain::NOMINAL;

/// Etapas del pipeline fijo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StageKind {
    Fetch,
    Convert,
    Map,
    Vary,
    SelectReconstruct,
    Reduce,
    Aggregate,
}

impl StageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StageKind::Fetch => "fetch",
            StageKind::Convert => "convert",
            StageKind::Map => "map",
            StageKind::Vary => "vary",
            StageKind::SelectReconstruct => "select_reconstruct",
            StageKind::Reduce => "reduce",
            StageKind::Aggregate => "aggregate",
        }
    }

    /// Etapas que trabajan a nivel de branch (una partición del dataset).
    pub fn is_branched(&self) -> bool {
        matches!(self, StageKind::Map | StageKind::Vary | StageKind::SelectReconstruct)
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskIdentity {
    analysis: String,
    config: String,
    stage: StageKind,
    version: Option<String>,
    /// Ausente para unidades de nivel configuración (Aggregate).
    dataset: Option<String>,
    requested_shift: String,
    effective_shift: String,
    /// Presente sólo para etapas de branch.
    branch: Option<usize>,
}

impl TaskIdentity {
    pub fn analysis(&self) -> &str {
        &self.analysis
    }

    pub fn config(&self) -> &str {
        &self.config
    }

    pub fn stage(&self) -> StageKind {
        self.stage
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn dataset(&self) -> Option<&str> {
        self.dataset.as_deref()
    }

    pub fn requested_shift(&self) -> &str {
        &self.requested_shift
    }

    pub fn effective_shift(&self) -> &str {
        &self.effective_shift
    }

    pub fn branch(&self) -> Option<usize> {
        self.branch
    }

    /// Dirección canónica del artifact de esta identidad.
    ///
    /// Orden fijo de campos:
    /// `analysis/stage/[version/]config/[dataset/]effective-shift[/branch-N]`.
    /// El shift solicitado no participa: identidades con el mismo efectivo
    /// comparten ruta de forma intencionada.
    pub fn store_path(&self) -> String {
        let mut parts: Vec<&str> = vec![&self.analysis, self.stage.as_str()];
        if let Some(version) = &self.version {
            parts.push(version);
        }
        parts.push(&self.config);
        if let Some(dataset) = &self.dataset {
            parts.push(dataset);
        }
        parts.push(&self.effective_shift);
        let branch_part;
        if let Some(branch) = self.branch {
            branch_part = format!("branch-{}", branch);
            parts.push(&branch_part);
        }
        parts.join("/")
    }
}

impl fmt::Display for TaskIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.analysis, self.config, self.stage)?;
        if let Some(dataset) = &self.dataset {
            write!(f, ":{}", dataset)?;
        }
        write!(f, ":{}", self.requested_shift)?;
        if self.effective_shift != self.requested_shift {
            write!(f, "->{}", self.effective_shift)?;
        }
        if let Some(branch) = self.branch {
            write!(f, "#{}", branch)?;
        }
        Ok(())
    }
}

/// Builder progresivo de identidades. Las capas externas (análisis, config)
/// se fijan primero y se reutilizan clonando el builder por etapa/dataset.
#[derive(Debug, Clone)]
pub struct IdentityBuilder {
    analysis: String,
    version: Option<String>,
    config: Option<String>,
    stage: Option<StageKind>,
    dataset: Option<String>,
    requested_shift: String,
    effective_shift: String,
    branch: Option<usize>,
}

impl IdentityBuilder {
    pub fn for_analysis(analysis: &str) -> Self {
        Self { analysis: analysis.to_string(),
               version: None,
               config: None,
               stage: None,
               dataset: None,
               requested_shift: NOMINAL.to_string(),
               effective_shift: NOMINAL.to_string(),
               branch: None }
    }

    pub fn version(mut self, version: &str) -> Self {
        self.version = Some(version.to_string());
        self
    }

    pub fn config(mut self, config: &str) -> Self {
        self.config = Some(config.to_string());
        self
    }

    pub fn stage(mut self, stage: StageKind) -> Self {
        self.stage = Some(stage);
        self
    }

    pub fn dataset(mut self, dataset: &str) -> Self {
        self.dataset = Some(dataset.to_string());
        self
    }

    /// Fija el par (solicitado, efectivo) resuelto por el resolver.
    pub fn shift(mut self, requested: &str, effective: &str) -> Self {
        self.requested_shift = requested.to_string();
        self.effective_shift = effective.to_string();
        self
    }

    pub fn branch(mut self, branch: usize) -> Self {
        self.branch = Some(branch);
        self
    }

    pub fn build(self) -> Result<TaskIdentity, CoreError> {
        let config = self.config
                         .ok_or_else(|| CoreError::Configuration("identity without config".to_string()))?;
        let stage = self.stage
                        .ok_or_else(|| CoreError::Configuration("identity without stage".to_string()))?;
        if self.analysis.is_empty() {
            return Err(CoreError::Configuration("identity without analysis".to_string()));
        }
        if stage.is_branched() != self.branch.is_some() {
            return Err(CoreError::Configuration(format!("stage '{}' {} a branch index",
                                                        stage,
                                                        if stage.is_branched() { "requires" } else { "does not take" })));
        }
        if stage == StageKind::Aggregate && self.dataset.is_some() {
            return Err(CoreError::Configuration("aggregate identities are config-level, no dataset".to_string()));
        }
        if stage != StageKind::Aggregate && self.dataset.is_none() {
            return Err(CoreError::Configuration(format!("stage '{}' requires a dataset", stage)));
        }
        Ok(TaskIdentity { analysis: self.analysis,
                          config,
                          stage,
                          version: self.version,
                          dataset: self.dataset,
                          requested_shift: self.requested_shift,
                          effective_shift: self.effective_shift,
                          branch: self.branch })
    }
}
