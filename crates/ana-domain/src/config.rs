//! Configuración de análisis y registro explícito.
//!
//! `AnalysisConfig` liga un análisis con una campaña y declara el subconjunto
//! de datasets y procesos de interés, el conjunto cerrado de shifts válidos,
//! los canales y las variables de salida. `Registry` reemplaza los lookups
//! globales por nombre del diseño original: es un objeto explícito que se
//! inyecta en la resolución y en la construcción del grafo.

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

use crate::{Campaign, Dataset, DomainError, Process, Shift, Variable};

/// Canal de análisis (p.ej. muón).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    pub name: String,
    pub id: u32,
    pub label: String,
    /// Luminosidad integrada en 1/fb.
    pub luminosity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    name: String,
    analysis: String,
    campaign: String,
    datasets: IndexSet<String>,
    processes: IndexMap<String, Process>,
    shifts: IndexMap<String, Shift>,
    channels: Vec<Channel>,
    variables: IndexMap<String, Variable>,
}

impl AnalysisConfig {
    /// Crea una configuración vacía. El shift `nominal` queda declarado
    /// siempre; el resto del conjunto se cierra con `add_shift`.
    pub fn new(name: &str, analysis: &str, campaign: &str) -> Self {
        let mut shifts = IndexMap::new();
        let nominal = Shift::nominal();
        shifts.insert(nominal.name().to_string(), nominal);
        Self { name: name.to_string(),
               analysis: analysis.to_string(),
               campaign: campaign.to_string(),
               datasets: IndexSet::new(),
               processes: IndexMap::new(),
               shifts,
               channels: Vec::new(),
               variables: IndexMap::new() }
    }

    pub fn add_dataset(&mut self, name: &str) {
        self.datasets.insert(name.to_string());
    }

    pub fn add_process(&mut self, process: Process) {
        self.processes.insert(process.name().to_string(), process);
    }

    pub fn add_shift(&mut self, shift: Shift) {
        self.shifts.insert(shift.name().to_string(), shift);
    }

    pub fn add_channel(&mut self, channel: Channel) {
        self.channels.push(channel);
    }

    pub fn add_variable(&mut self, variable: Variable) {
        self.variables.insert(variable.name().to_string(), variable);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn analysis(&self) -> &str {
        &self.analysis
    }

    pub fn campaign(&self) -> &str {
        &self.campaign
    }

    /// Nombres de datasets seleccionados, en orden de declaración.
    pub fn datasets(&self) -> impl Iterator<Item = &str> {
        self.datasets.iter().map(|s| s.as_str())
    }

    pub fn processes(&self) -> impl Iterator<Item = &Process> {
        self.processes.values()
    }

    pub fn get_process(&self, name: &str) -> Result<&Process, DomainError> {
        self.processes
            .get(name)
            .ok_or_else(|| DomainError::UnknownProcess(name.to_string()))
    }

    pub fn has_shift(&self, name: &str) -> bool {
        self.shifts.contains_key(name)
    }

    pub fn get_shift(&self, name: &str) -> Result<&Shift, DomainError> {
        self.shifts
            .get(name)
            .ok_or_else(|| DomainError::UnknownShift(name.to_string()))
    }

    pub fn shifts(&self) -> impl Iterator<Item = &Shift> {
        self.shifts.values()
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    pub fn variables(&self) -> impl Iterator<Item = &Variable> {
        self.variables.values()
    }
}

/// Registro explícito de campañas y configuraciones.
///
/// De sólo lectura durante una ejecución: se construye en tiempo de
/// configuración y se pasa por referencia a quien lo necesite.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    campaigns: IndexMap<String, Campaign>,
    configs: IndexMap<String, AnalysisConfig>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_campaign(&mut self, campaign: Campaign) {
        self.campaigns.insert(campaign.name().to_string(), campaign);
    }

    /// Registra una configuración, validando que su campaña exista y que
    /// todos los datasets seleccionados estén definidos en ella.
    pub fn add_config(&mut self, config: AnalysisConfig) -> Result<(), DomainError> {
        let campaign = self.get_campaign(config.campaign())?;
        for name in config.datasets() {
            campaign.get_dataset(name)?;
        }
        self.configs.insert(config.name().to_string(), config);
        Ok(())
    }

    pub fn get_campaign(&self, name: &str) -> Result<&Campaign, DomainError> {
        self.campaigns
            .get(name)
            .ok_or_else(|| DomainError::UnknownCampaign(name.to_string()))
    }

    pub fn get_config(&self, analysis: &str, name: &str) -> Result<&AnalysisConfig, DomainError> {
        self.configs
            .get(name)
            .filter(|c| c.analysis() == analysis)
            .ok_or_else(|| DomainError::UnknownConfig(name.to_string(), analysis.to_string()))
    }

    /// Dataset tal como lo ve una configuración (debe pertenecer a su
    /// campaña y estar seleccionado).
    pub fn dataset(&self, config: &AnalysisConfig, name: &str) -> Result<&Dataset, DomainError> {
        if !config.datasets().any(|d| d == name) {
            return Err(DomainError::UnknownDataset(name.to_string()));
        }
        self.get_campaign(config.campaign())?.get_dataset(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DatasetInfo, ShiftKind};

    fn registry() -> Registry {
        let mut campaign = Campaign::new("opendata_2011", 1, 7.0, 50.0);
        campaign.add_dataset(Dataset::new("singleTop",
                                          210,
                                          "singleTop",
                                          DatasetInfo::new(vec!["http://example.org/st.root".to_string()], 2, 5684)))
                .unwrap();

        let mut config = AnalysisConfig::new("singletop_opendata_2011", "singletop", "opendata_2011");
        config.add_dataset("singleTop");
        config.add_shift(Shift::new("jer_up", ShiftKind::Shape, "Jet energy resolution").unwrap());

        let mut registry = Registry::new();
        registry.add_campaign(campaign);
        registry.add_config(config).unwrap();
        registry
    }

    #[test]
    fn config_lookup_requires_matching_analysis() {
        let registry = registry();
        assert!(registry.get_config("singletop", "singletop_opendata_2011").is_ok());
        assert!(matches!(registry.get_config("other", "singletop_opendata_2011"),
                         Err(DomainError::UnknownConfig(_, _))));
    }

    #[test]
    fn nominal_is_always_declared() {
        let registry = registry();
        let config = registry.get_config("singletop", "singletop_opendata_2011").unwrap();
        assert!(config.has_shift("nominal"));
        assert!(config.has_shift("jer_up"));
        assert!(!config.has_shift("jer_down"));
    }

    #[test]
    fn dataset_must_be_selected_by_config() {
        let mut campaign = Campaign::new("opendata_2011", 1, 7.0, 50.0);
        campaign.add_dataset(Dataset::new("WJets",
                                          205,
                                          "WJets",
                                          DatasetInfo::new(vec![], 1, 0)))
                .unwrap();
        campaign.add_dataset(Dataset::new("singleTop",
                                          210,
                                          "singleTop",
                                          DatasetInfo::new(vec![], 1, 0)))
                .unwrap();
        let mut config = AnalysisConfig::new("cfg", "ana", "opendata_2011");
        config.add_dataset("singleTop");

        let mut registry = Registry::new();
        registry.add_campaign(campaign);
        registry.add_config(config).unwrap();

        let config = registry.get_config("ana", "cfg").unwrap();
        assert!(registry.dataset(config, "singleTop").is_ok());
        // WJets existe en la campaña pero no está seleccionado
        assert!(registry.dataset(config, "WJets").is_err());
    }
}
