//! Selección de eventos single-top (canal muón).

use serde_json::json;

use crate::opendata::{self, COL_MET_PT, COL_TRIGGER};
use ana_core::{CoreError, SelectionResult, Selector};
use ana_domain::EventTable;

/// Cortes de la selección single-top del canal muón: trigger de muón
/// aislado, MET, exactamente un muón aislado sin leptones extra, al menos
/// dos jets buenos y al menos un b-tag (TCHP medium).
#[derive(Debug, Clone)]
pub struct SingleTopSelector {
    pub met_min: f64,
    pub muon_pt_min: f64,
    pub muon_eta_max: f64,
    pub muon_iso_max: f64,
    pub veto_pt_min: f64,
    pub veto_eta_max: f64,
    pub veto_iso_max: f64,
    pub jet_pt_min: f64,
    pub jet_eta_max: f64,
    pub btag_min: f64,
    pub n_jets_min: usize,
}

impl Default for SingleTopSelector {
    fn default() -> Self {
        Self { met_min: 25.0,
               muon_pt_min: 20.0,
               muon_eta_max: 2.1,
               muon_iso_max: 0.12,
               veto_pt_min: 10.0,
               veto_eta_max: 2.4,
               veto_iso_max: 0.24,
               jet_pt_min: 25.0,
               jet_eta_max: 4.5,
               btag_min: 1.93,
               n_jets_min: 2 }
    }
}

impl SingleTopSelector {
    /// Evalúa un evento; si sobrevive, devuelve los pts de sus jets buenos
    /// ordenados descendentemente (el objeto auxiliar de la reconstrucción).
    fn select_event(&self, events: &EventTable, row: usize) -> Result<Option<Vec<f64>>, CoreError> {
        if events.value(COL_TRIGGER, row)? == 0.0 {
            return Ok(None);
        }
        if events.value(COL_MET_PT, row)? <= self.met_min {
            return Ok(None);
        }

        let mut good_muons = 0;
        let mut veto_leptons = 0;
        for muon in opendata::muons(events, row)? {
            if muon.pt > self.muon_pt_min && muon.eta.abs() < self.muon_eta_max && muon.iso < self.muon_iso_max {
                good_muons += 1;
            } else if muon.pt > self.veto_pt_min && muon.eta.abs() < self.veto_eta_max && muon.iso < self.veto_iso_max {
                veto_leptons += 1;
            }
        }
        for electron in opendata::electrons(events, row)? {
            if (electron.pt > self.muon_pt_min && electron.eta.abs() < self.muon_eta_max && electron.iso < self.muon_iso_max)
               || (electron.pt > self.veto_pt_min && electron.eta.abs() < self.veto_eta_max && electron.iso < self.veto_iso_max)
            {
                veto_leptons += 1;
            }
        }
        // sólo nos interesa el canal muón: exactamente uno, sin extras
        if good_muons != 1 || veto_leptons > 0 {
            return Ok(None);
        }

        let mut jet_pts: Vec<f64> = opendata::jets(events, row)?
            .iter()
            .filter(|j| j.id && j.pt > self.jet_pt_min && j.eta.abs() < self.jet_eta_max)
            .map(|j| j.pt)
            .collect();
        if jet_pts.len() < self.n_jets_min {
            return Ok(None);
        }
        jet_pts.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));

        let has_btag = opendata::jets(events, row)?
            .iter()
            .any(|j| j.id && j.pt > self.jet_pt_min && j.eta.abs() < self.jet_eta_max && j.btag > self.btag_min);
        if !has_btag {
            return Ok(None);
        }

        Ok(Some(jet_pts))
    }
}

impl Selector for SingleTopSelector {
    fn select(&self, events: &EventTable) -> Result<SelectionResult, CoreError> {
        let mut indexes = Vec::new();
        let mut objects = Vec::new();
        for row in 0..events.n_rows() {
            if let Some(jet_pts) = self.select_event(events, row)? {
                indexes.push(row);
                objects.push(json!({ "jet_pts": jet_pts }));
            }
        }
        Ok(SelectionResult { indexes, objects })
    }
}
