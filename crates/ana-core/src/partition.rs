//! Particionado determinista de secuencias.
//!
//! `partial_slices` divide una secuencia de longitud `n` en rangos contiguos
//! `[start, end)` según fracciones objetivo, con todos los límites alineados
//! a múltiplos de `block`. El redondeo de cada fracción arrastra su resto a
//! la siguiente: redondear cada fracción por separado acumula deriva (rangos
//! solapados o huecos grandes); con el arrastre, la longitud total asignada
//! queda a menos de un bloque del objetivo proporcional exacto.
//!
//! Regla de redondeo: al múltiplo más cercano, con empates al par
//! (`round_ties_even`), reproducible entre ejecuciones.

use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

/// Rango semiabierto de índices `[start, end)` sobre una secuencia.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Partition {
    pub start: usize,
    pub end: usize,
}

impl Partition {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Redondea `num` al múltiplo de `base` más cercano (empates al par).
pub fn round_base(num: f64, base: usize) -> f64 {
    base as f64 * (num / base as f64).round_ties_even()
}

/// Rangos parciales de una secuencia de longitud `n` según `fractions`.
///
/// Precondiciones (violación = error de configuración):
/// - `block` divide a `n`;
/// - fracciones no negativas con suma ≤ 1.
pub fn partial_slices(n: usize, fractions: &[f64], block: usize) -> Result<Vec<Partition>, CoreError> {
    if block == 0 || n % block != 0 {
        return Err(CoreError::Configuration(format!("bad block size {}, must be an integer divider of {}",
                                                    block, n)));
    }
    if fractions.iter().any(|f| *f < 0.0) {
        return Err(CoreError::Configuration("bad fractions, all must be non-negative".to_string()));
    }
    if fractions.iter().sum::<f64>() > 1.0 + 1e-9 {
        return Err(CoreError::Configuration("bad fractions, sum must be <= 1".to_string()));
    }

    let mut slices = Vec::with_capacity(fractions.len());
    let mut rest = 0.0;
    let mut cursor = 0usize;
    for f in fractions {
        let chunk = f * n as f64 + rest;
        let closest = round_base(chunk, block);
        rest = chunk - closest;
        // closest es un múltiplo no negativo de block: rest queda acotado en
        // (-block/2, block/2], por lo que chunk nunca baja de -block/2
        let len = closest.max(0.0) as usize;
        slices.push(Partition::new(cursor, cursor + len));
        cursor += len;
    }
    Ok(slices)
}

/// `k` rangos de igual fracción `1/k`.
pub fn equal_slices(n: usize, k: usize, block: usize) -> Result<Vec<Partition>, CoreError> {
    if k == 0 {
        return Err(CoreError::Configuration("bad partition count, must be >= 1".to_string()));
    }
    partial_slices(n, &vec![1.0 / k as f64; k], block)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(slices: &[Partition]) -> Vec<(usize, usize)> {
        slices.iter().map(|s| (s.start, s.end)).collect()
    }

    #[test]
    fn fractions_with_unit_block() {
        let slices = partial_slices(60, &[0.5, 0.25], 1).unwrap();
        assert_eq!(pairs(&slices), vec![(0, 30), (30, 45)]);
    }

    #[test]
    fn thirds_with_block_of_twelve() {
        let third = 1.0 / 3.0;
        let slices = partial_slices(60, &[third, third, third], 12).unwrap();
        assert_eq!(pairs(&slices), vec![(0, 24), (24, 36), (36, 60)]);
    }

    #[test]
    fn equal_slices_cover_the_sequence() {
        let slices = equal_slices(9, 3, 1).unwrap();
        assert_eq!(pairs(&slices), vec![(0, 3), (3, 6), (6, 9)]);
    }

    #[test]
    fn slices_are_disjoint_ordered_and_block_aligned() {
        for (n, fractions, block) in [(120, vec![0.3, 0.3, 0.4], 4),
                                      (100, vec![0.17, 0.41, 0.13], 5),
                                      (64, vec![0.5, 0.5], 8)]
        {
            let slices = partial_slices(n, &fractions, block).unwrap();
            let mut cursor = 0;
            for s in &slices {
                assert_eq!(s.start, cursor, "ranges must be contiguous and ordered");
                assert_eq!(s.len() % block, 0, "length must be a multiple of the block size");
                cursor = s.end;
            }
            assert!(cursor <= n);
            // la longitud total queda a un bloque del objetivo exacto
            let target: f64 = fractions.iter().sum::<f64>() * n as f64;
            assert!((cursor as f64 - target).abs() <= block as f64 / 2.0 + 1e-9);
        }
    }

    #[test]
    fn bad_inputs_are_configuration_errors() {
        assert!(matches!(partial_slices(10, &[0.5], 3), Err(CoreError::Configuration(_))));
        assert!(matches!(partial_slices(10, &[-0.1], 1), Err(CoreError::Configuration(_))));
        assert!(matches!(partial_slices(10, &[0.7, 0.7], 1), Err(CoreError::Configuration(_))));
        assert!(matches!(equal_slices(10, 0, 1), Err(CoreError::Configuration(_))));
    }

    #[test]
    fn rounding_ties_go_to_even_multiples() {
        // 7 a base 3 cae en 6 (2*3), 18 a base 5 en 20 (4*5)
        assert_eq!(round_base(7.0, 3), 6.0);
        assert_eq!(round_base(18.0, 5), 20.0);
        assert_eq!(round_base(7.5, 5), 10.0);
    }
}
