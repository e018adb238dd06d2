//! Histogramas por variable y agregación entre procesos.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::opendata::COL_EVENT_WEIGHT;
use ana_core::{Aggregator, CoreError};
use ana_domain::{AnalysisConfig, Binning, EventTable};

/// Histograma 1D de binning regular con pesos por entrada.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    pub binning: Binning,
    pub counts: Vec<f64>,
    pub underflow: f64,
    pub overflow: f64,
    pub n_entries: usize,
}

impl Histogram {
    /// Un binning degenerado (sin bins, o con rango vacío) no puede rellenarse.
    pub fn new(binning: Binning) -> Result<Self, CoreError> {
        if binning.n_bins == 0 {
            return Err(CoreError::Configuration("histogram binning declares 0 bins".to_string()));
        }
        if binning.low >= binning.high {
            return Err(CoreError::Configuration(format!("histogram binning range [{}, {}) is empty",
                                                        binning.low, binning.high)));
        }
        Ok(Self { binning,
                  counts: vec![0.0; binning.n_bins],
                  underflow: 0.0,
                  overflow: 0.0,
                  n_entries: 0 })
    }

    pub fn fill(&mut self, value: f64, weight: f64) {
        self.n_entries += 1;
        if value < self.binning.low {
            self.underflow += weight;
            return;
        }
        if value >= self.binning.high {
            self.overflow += weight;
            return;
        }
        let width = (self.binning.high - self.binning.low) / self.binning.n_bins as f64;
        let bin = (((value - self.binning.low) / width) as usize).min(self.binning.n_bins - 1);
        self.counts[bin] += weight;
    }

    pub fn integral(&self) -> f64 {
        self.counts.iter().sum()
    }
}

/// Combinación final: un histograma por (variable declarada, proceso),
/// listo para apilar. Las entradas se pesan con `EventWeight` si la tabla
/// lo trae; si no, peso unitario.
#[derive(Debug, Clone, Copy, Default)]
pub struct StackAggregator;

impl StackAggregator {
    fn fill_for(variable_expression: &str,
                binning: Binning,
                table: &EventTable)
                -> Result<Histogram, CoreError> {
        let values = table.column(variable_expression)?;
        let weights = table.column(COL_EVENT_WEIGHT).ok();
        let mut histogram = Histogram::new(binning)?;
        for (row, value) in values.iter().enumerate() {
            let weight = weights.map_or(1.0, |w| w[row]);
            histogram.fill(*value, weight);
        }
        Ok(histogram)
    }
}

impl Aggregator for StackAggregator {
    fn aggregate(&self,
                 per_process: &IndexMap<String, EventTable>,
                 config: &AnalysisConfig)
                 -> Result<Value, CoreError> {
        let mut variables = serde_json::Map::new();
        for variable in config.variables() {
            let mut processes = serde_json::Map::new();
            for (process, table) in per_process {
                let histogram = Self::fill_for(variable.expression(), variable.binning(), table)?;
                processes.insert(process.clone(), serde_json::to_value(&histogram)
                    .map_err(|e| CoreError::InvalidData(e.to_string()))?);
            }
            variables.insert(variable.name().to_string(),
                             json!({
                                 "expression": variable.expression(),
                                 "x_title": variable.x_title(),
                                 "unit": variable.unit(),
                                 "processes": Value::Object(processes),
                             }));
        }
        Ok(json!({ "config": config.name(), "variables": Value::Object(variables) }))
    }
}
