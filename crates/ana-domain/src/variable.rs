//! Variables de salida declaradas por la configuración.

use serde::{Deserialize, Serialize};

/// Binning regular de una variable: número de bins y rango.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Binning {
    pub n_bins: usize,
    pub low: f64,
    pub high: f64,
}

/// Variable de salida. La `expression` referencia una columna de la
/// representación tabular; el motor no interpreta su semántica.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    name: String,
    expression: String,
    binning: Binning,
    unit: Option<String>,
    x_title: String,
}

impl Variable {
    pub fn new(name: &str, expression: &str, binning: Binning, x_title: &str) -> Self {
        Self { name: name.to_string(),
               expression: expression.to_string(),
               binning,
               unit: None,
               x_title: x_title.to_string() }
    }

    pub fn with_unit(mut self, unit: &str) -> Self {
        self.unit = Some(unit.to_string());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn binning(&self) -> Binning {
        self.binning
    }

    pub fn unit(&self) -> Option<&str> {
        self.unit.as_deref()
    }

    pub fn x_title(&self) -> &str {
        &self.x_title
    }
}
