//! Resolución del shift efectivo.
//!
//! Una etapa que no declara sensibilidad a un shift (y cuyo dataset no
//! declara override para él) debe reutilizar el artifact nominal de forma
//! transparente: eso evita recomputar y mantiene canónico el espacio de
//! direcciones. La resolución ocurre una sola vez, al construir el grafo.

use indexmap::IndexSet;

use crate::errors::CoreError;
use ana_domain::{AnalysisConfig, Dataset, NOMINAL};

/// Conjunto de sensibilidad de una definición de etapa: los shifts a los que
/// la etapa reacciona. Es un valor explícito adjunto a la definición, no
/// estado heredado.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShiftSensitivity(IndexSet<String>);

impl ShiftSensitivity {
    /// Etapa insensible a todo shift.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn of(names: &[&str]) -> Self {
        Self(names.iter().map(|n| n.to_string()).collect())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|s| s.as_str())
    }
}

/// Shift efectivo para una unidad dadas su sensibilidad y el dataset.
///
/// - `requested == "nominal"` resuelve siempre a `"nominal"`.
/// - Un `requested` desconocido para la configuración es un error de
///   configuración fatal.
/// - Si la etapa es sensible al shift, o el dataset declara un override para
///   él, el efectivo es el solicitado; en otro caso colapsa a `"nominal"`.
///
/// Para unidades de nivel configuración (sin dataset) se pasa `None`.
pub fn resolve_effective(config: &AnalysisConfig,
                         dataset: Option<&Dataset>,
                         requested: &str,
                         sensitivity: &ShiftSensitivity)
                         -> Result<String, CoreError> {
    if requested == NOMINAL {
        return Ok(NOMINAL.to_string());
    }
    if !config.has_shift(requested) {
        return Err(CoreError::Configuration(format!("shift '{}' unknown to config '{}'",
                                                    requested,
                                                    config.name())));
    }
    let overridden = dataset.map_or(false, |d| d.has_info(requested));
    if sensitivity.contains(requested) || overridden {
        Ok(requested.to_string())
    } else {
        Ok(NOMINAL.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ana_domain::{Campaign, DatasetInfo, Registry, Shift, ShiftKind};

    fn setup() -> (Registry, &'static str, &'static str) {
        let mut campaign = Campaign::new("test_campaign", 1, 7.0, 50.0);
        campaign.add_dataset(Dataset::new("plain",
                                          1,
                                          "plain",
                                          DatasetInfo::new(vec![], 2, 100)))
                .unwrap();
        campaign.add_dataset(Dataset::new("overridden",
                                          2,
                                          "overridden",
                                          DatasetInfo::new(vec![], 2, 100))
                                 .with_info("lumi_up", DatasetInfo::new(vec![], 4, 100)))
                .unwrap();

        let mut config = AnalysisConfig::new("test_config", "test", "test_campaign");
        config.add_dataset("plain");
        config.add_dataset("overridden");
        config.add_shift(Shift::new("jer_up", ShiftKind::Shape, "JER").unwrap());
        config.add_shift(Shift::new("lumi_up", ShiftKind::Rate, "Luminosity").unwrap());

        let mut registry = Registry::new();
        registry.add_campaign(campaign);
        registry.add_config(config).unwrap();
        (registry, "test", "test_config")
    }

    #[test]
    fn nominal_always_resolves_to_nominal() {
        let (registry, analysis, name) = setup();
        let config = registry.get_config(analysis, name).unwrap();
        let effective =
            resolve_effective(config, None, NOMINAL, &ShiftSensitivity::of(&["jer_up"])).unwrap();
        assert_eq!(effective, NOMINAL);
    }

    #[test]
    fn sensitive_stage_keeps_the_requested_shift() {
        let (registry, analysis, name) = setup();
        let config = registry.get_config(analysis, name).unwrap();
        let dataset = registry.dataset(config, "plain").unwrap();
        let sensitivity = ShiftSensitivity::of(&["jer_up", "jer_down"]);
        assert_eq!(resolve_effective(config, Some(dataset), "jer_up", &sensitivity).unwrap(),
                   "jer_up");
    }

    #[test]
    fn insensitive_stage_collapses_to_nominal() {
        let (registry, analysis, name) = setup();
        let config = registry.get_config(analysis, name).unwrap();
        let dataset = registry.dataset(config, "plain").unwrap();
        assert_eq!(resolve_effective(config, Some(dataset), "jer_up", &ShiftSensitivity::none()).unwrap(),
                   NOMINAL);
    }

    #[test]
    fn dataset_override_keeps_the_requested_shift() {
        let (registry, analysis, name) = setup();
        let config = registry.get_config(analysis, name).unwrap();
        let dataset = registry.dataset(config, "overridden").unwrap();
        assert_eq!(resolve_effective(config, Some(dataset), "lumi_up", &ShiftSensitivity::none()).unwrap(),
                   "lumi_up");
    }

    #[test]
    fn unknown_shift_is_a_configuration_error() {
        let (registry, analysis, name) = setup();
        let config = registry.get_config(analysis, name).unwrap();
        assert!(matches!(resolve_effective(config, None, "pileup_up", &ShiftSensitivity::none()),
                         Err(CoreError::Configuration(_))));
    }
}
