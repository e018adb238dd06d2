//! Shifts sistemáticos ("variaciones").
//!
//! Un `Shift` describe una alternativa sistemática al cálculo nominal (por
//! ejemplo, la resolución de energía de jets subida/bajada). El nombre
//! `"nominal"` está reservado y representa la línea base; el conjunto de
//! shifts válidos queda cerrado por la configuración que los declara.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::DomainError;

/// Nombre reservado para la línea base.
pub const NOMINAL: &str = "nominal";

/// Tipo general del shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShiftKind {
    /// Sin efecto sobre formas; sólo la línea base lo usa.
    None,
    /// Afecta únicamente la normalización.
    Rate,
    /// Afecta la forma de las distribuciones.
    Shape,
}

/// Dirección del shift, derivada del sufijo `_up` / `_down` del nombre.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShiftDirection {
    Nominal,
    Up,
    Down,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shift {
    name: String,
    kind: ShiftKind,
    direction: ShiftDirection,
    label: String,
}

impl Shift {
    /// Crea un shift sistemático. La dirección se deriva del sufijo del
    /// nombre (`_up` / `_down`); el nombre `"nominal"` está reservado y sólo
    /// puede crearse mediante [`Shift::nominal`].
    pub fn new(name: &str, kind: ShiftKind, label: &str) -> Result<Self, DomainError> {
        if name.is_empty() {
            return Err(DomainError::Validation("shift name must not be empty".to_string()));
        }
        if name == NOMINAL {
            return Err(DomainError::Validation(
                "'nominal' is reserved, use Shift::nominal()".to_string(),
            ));
        }
        let direction = if name.ends_with("_up") {
            ShiftDirection::Up
        } else if name.ends_with("_down") {
            ShiftDirection::Down
        } else {
            ShiftDirection::Nominal
        };
        Ok(Self { name: name.to_string(),
                  kind,
                  direction,
                  label: label.to_string() })
    }

    /// Shift de línea base.
    pub fn nominal() -> Self {
        Self { name: NOMINAL.to_string(),
               kind: ShiftKind::None,
               direction: ShiftDirection::Nominal,
               label: "Nominal".to_string() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ShiftKind {
        self.kind
    }

    pub fn direction(&self) -> ShiftDirection {
        self.direction
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_nominal(&self) -> bool {
        self.name == NOMINAL
    }
}

impl fmt::Display for Shift {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}
