//! Reconstrucción de variables derivadas por evento seleccionado.

use indexmap::indexmap;
use serde_json::Value;

use ana_core::{CoreError, Reconstructor};
use ana_domain::EventTable;

/// Deriva `LeadingJet_Pt` del objeto auxiliar de la selección: el pt del jet
/// bueno líder, que no tiene por qué coincidir con el slot 1 del formato
/// crudo (de ahí el nombre propio, disjunto de las columnas originales).
#[derive(Debug, Clone, Copy, Default)]
pub struct SingleTopReconstructor;

impl SingleTopReconstructor {
    fn leading_jet_pt(object: &Value) -> Result<f64, CoreError> {
        object.get("jet_pts")
              .and_then(|pts| pts.get(0))
              .and_then(Value::as_f64)
              .ok_or_else(|| CoreError::InvalidData("selection object without jet_pts".to_string()))
    }
}

impl Reconstructor for SingleTopReconstructor {
    fn reconstruct(&self, events: &EventTable, objects: &[Value]) -> Result<EventTable, CoreError> {
        if objects.len() != events.n_rows() {
            return Err(CoreError::InvalidData(format!("{} selection objects for {} selected events",
                                                      objects.len(),
                                                      events.n_rows())));
        }
        let leading: Vec<f64> = objects.iter()
                                       .map(Self::leading_jet_pt)
                                       .collect::<Result<_, _>>()?;
        Ok(EventTable::from_columns(indexmap! {
            "LeadingJet_Pt".to_string() => leading,
        })?)
    }
}
