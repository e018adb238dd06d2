//! Aplicación numérica de shifts de forma.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::opendata::{self, COL_N_JET, MAX_JETS};
use ana_core::{CoreError, ShiftSensitivity, ShiftVarier, TaskIdentity};
use ana_domain::{EventTable, Shift, ShiftDirection};

/// Smearing de resolución de energía de jets (JER): escala cada `Jet{i}_Pt`
/// ocupado por un factor base según la dirección del shift más un término
/// aleatorio acotado. El RNG se siembra con la identidad de la tarea, así la
/// perturbación es una función pura de (branch, shift) y repetir la unidad
/// reproduce byte a byte el mismo artifact.
#[derive(Debug, Clone, Copy)]
pub struct JerVarier {
    pub smear: f64,
}

impl Default for JerVarier {
    fn default() -> Self {
        Self { smear: 0.05 }
    }
}

impl JerVarier {
    fn seed_for(identity: &TaskIdentity) -> u64 {
        let digest = blake3::hash(identity.store_path().as_bytes());
        u64::from_le_bytes(digest.as_bytes()[..8].try_into().unwrap_or([0; 8]))
    }
}

impl ShiftVarier for JerVarier {
    fn sensitivity(&self) -> ShiftSensitivity {
        ShiftSensitivity::of(&["jer_up", "jer_down"])
    }

    fn apply(&self,
             events: &mut EventTable,
             shift: &Shift,
             identity: &TaskIdentity)
             -> Result<(), CoreError> {
        let base = match shift.direction() {
            ShiftDirection::Up => 1.0 + self.smear,
            ShiftDirection::Down => 1.0 - self.smear,
            ShiftDirection::Nominal => return Ok(()),
        };
        let mut rng = StdRng::seed_from_u64(Self::seed_for(identity));
        let counts: Vec<f64> = events.column(COL_N_JET)?.to_vec();
        for (row, n) in counts.iter().enumerate() {
            let n = (n.max(0.0) as usize).min(MAX_JETS);
            for slot in 1..=n {
                let jitter = self.smear * (2.0 * rng.random::<f64>() - 1.0);
                let pt = events.column_mut(&opendata::jet_col(slot, "Pt"))?;
                pt[row] *= base + jitter;
            }
        }
        Ok(())
    }
}
