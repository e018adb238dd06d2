//! Procesos físicos declarados por la configuración.

use serde::{Deserialize, Serialize};

/// Proceso físico al que pertenece un dataset (p.ej. "singleTop", "WJets").
/// Los metadatos de presentación (labels, sección eficaz) son opacos para el
/// motor; sólo el nombre participa en la agregación.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Process {
    name: String,
    id: u32,
    label: String,
    label_short: String,
    /// Sección eficaz en pb, si se conoce (sólo metadato).
    xsec: Option<f64>,
}

impl Process {
    pub fn new(name: &str, id: u32, label: &str, label_short: &str) -> Self {
        Self { name: name.to_string(),
               id,
               label: label.to_string(),
               label_short: label_short.to_string(),
               xsec: None }
    }

    pub fn with_xsec(mut self, xsec: f64) -> Self {
        self.xsec = Some(xsec);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn label_short(&self) -> &str {
        &self.label_short
    }

    pub fn xsec(&self) -> Option<f64> {
        self.xsec
    }
}
