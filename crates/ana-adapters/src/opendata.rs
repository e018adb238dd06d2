//! Layout de columnas del formato de eventos aplanado.
//!
//! Los eventos vienen como filas de columnas escalares: contadores (`NJet`,
//! `NMuon`, `NElectron`) más slots fijos 1-based por objeto
//! (`Jet1_Pt`, `Jet1_Eta`, ...). Los slots por encima del contador valen 0.

use ana_core::CoreError;
use ana_domain::EventTable;

pub const MAX_JETS: usize = 4;
pub const MAX_MUONS: usize = 2;
pub const MAX_ELECTRONS: usize = 2;

pub const COL_TRIGGER: &str = "triggerIsoMu24";
pub const COL_MET_PT: &str = "MET_Pt";
pub const COL_N_JET: &str = "NJet";
pub const COL_N_MUON: &str = "NMuon";
pub const COL_N_ELECTRON: &str = "NElectron";
pub const COL_EVENT_WEIGHT: &str = "EventWeight";

pub fn jet_col(slot: usize, field: &str) -> String {
    format!("Jet{}_{}", slot, field)
}

pub fn muon_col(slot: usize, field: &str) -> String {
    format!("Muon{}_{}", slot, field)
}

pub fn electron_col(slot: usize, field: &str) -> String {
    format!("Electron{}_{}", slot, field)
}

/// Todas las columnas del formato, en orden estable.
pub fn column_names() -> Vec<String> {
    let mut names = vec![COL_TRIGGER.to_string(),
                         COL_MET_PT.to_string(),
                         COL_EVENT_WEIGHT.to_string(),
                         COL_N_JET.to_string(),
                         COL_N_MUON.to_string(),
                         COL_N_ELECTRON.to_string()];
    for slot in 1..=MAX_JETS {
        for field in ["Pt", "Eta", "ID", "btag"] {
            names.push(jet_col(slot, field));
        }
    }
    for slot in 1..=MAX_MUONS {
        for field in ["Pt", "Eta", "Iso"] {
            names.push(muon_col(slot, field));
        }
    }
    for slot in 1..=MAX_ELECTRONS {
        for field in ["Pt", "Eta", "Iso"] {
            names.push(electron_col(slot, field));
        }
    }
    names
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Jet {
    pub pt: f64,
    pub eta: f64,
    pub id: bool,
    pub btag: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lepton {
    pub pt: f64,
    pub eta: f64,
    pub iso: f64,
}

fn count(events: &EventTable, column: &str, row: usize, max: usize) -> Result<usize, CoreError> {
    let n = events.value(column, row)?;
    Ok((n.max(0.0) as usize).min(max))
}

/// Jets de un evento, leídos de los slots `1..=NJet`.
pub fn jets(events: &EventTable, row: usize) -> Result<Vec<Jet>, CoreError> {
    let n = count(events, COL_N_JET, row, MAX_JETS)?;
    let mut jets = Vec::with_capacity(n);
    for slot in 1..=n {
        jets.push(Jet { pt: events.value(&jet_col(slot, "Pt"), row)?,
                        eta: events.value(&jet_col(slot, "Eta"), row)?,
                        id: events.value(&jet_col(slot, "ID"), row)? != 0.0,
                        btag: events.value(&jet_col(slot, "btag"), row)? });
    }
    Ok(jets)
}

pub fn muons(events: &EventTable, row: usize) -> Result<Vec<Lepton>, CoreError> {
    let n = count(events, COL_N_MUON, row, MAX_MUONS)?;
    let mut muons = Vec::with_capacity(n);
    for slot in 1..=n {
        muons.push(Lepton { pt: events.value(&muon_col(slot, "Pt"), row)?,
                            eta: events.value(&muon_col(slot, "Eta"), row)?,
                            iso: events.value(&muon_col(slot, "Iso"), row)? });
    }
    Ok(muons)
}

pub fn electrons(events: &EventTable, row: usize) -> Result<Vec<Lepton>, CoreError> {
    let n = count(events, COL_N_ELECTRON, row, MAX_ELECTRONS)?;
    let mut electrons = Vec::with_capacity(n);
    for slot in 1..=n {
        electrons.push(Lepton { pt: events.value(&electron_col(slot, "Pt"), row)?,
                                eta: events.value(&electron_col(slot, "Eta"), row)?,
                                iso: events.value(&electron_col(slot, "Iso"), row)? });
    }
    Ok(electrons)
}
