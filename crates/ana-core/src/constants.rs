//! Constantes del motor.

/// Versión del motor; entra en los metadatos de cada artifact para
/// trazabilidad (no participa en el hash del payload).
pub const ENGINE_VERSION: &str = "ana-core-0.1";
