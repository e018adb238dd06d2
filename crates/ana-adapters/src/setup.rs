//! Configuración de referencia: análisis single-top sobre Open Data 2011.
//!
//! Reúne la campaña, los datasets con sus claves y particiones, los procesos,
//! el conjunto cerrado de shifts, el canal muón y las variables de salida.
//! También provee una fuente sintética determinista para demos y tests de
//! integración: cada URL produce siempre los mismos bytes.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::opendata::{self, COL_EVENT_WEIGHT, COL_MET_PT, COL_N_ELECTRON, COL_N_JET, COL_N_MUON,
                      COL_TRIGGER, MAX_ELECTRONS, MAX_JETS, MAX_MUONS};
use crate::source::StaticSource;
use ana_domain::{AnalysisConfig, Binning, Campaign, Channel, Dataset, DatasetInfo, DomainError,
                 EventTable, Process, Registry, Shift, ShiftKind, Variable};
use indexmap::IndexMap;

pub const CAMPAIGN: &str = "opendata_2011";
pub const ANALYSIS: &str = "singletop";
pub const CONFIG: &str = "singletop_opendata_2011";

const BASE_URL: &str = "http://opendata.cern.ch/record/203/files";

fn url(file: &str) -> String {
    format!("{}/{}", BASE_URL, file)
}

fn opendata_campaign() -> Result<Campaign, DomainError> {
    let mut campaign = Campaign::new(CAMPAIGN, 1, 7.0, 50.0);
    let datasets = [("singleTop", 210, "st", "single_top.root", 2, 5684),
                    ("WJets", 205, "WJets", "wjets.root", 22, 109_737),
                    ("ZJets", 206, "ZJets", "dy.root", 16, 77_729),
                    ("WWJets", 207, "diboson", "ww.root", 1, 4580),
                    ("WZJets", 208, "diboson", "wz.root", 1, 3367),
                    ("ZZJets", 209, "diboson", "zz.root", 1, 2421)];
    for (name, id, process, file, n_files, n_events) in datasets {
        campaign.add_dataset(Dataset::new(name,
                                          id,
                                          process,
                                          DatasetInfo::new(vec![url(file)], n_files, n_events)))?;
    }
    Ok(campaign)
}

fn singletop_config() -> Result<AnalysisConfig, DomainError> {
    let mut config = AnalysisConfig::new(CONFIG, ANALYSIS, CAMPAIGN);
    for dataset in ["singleTop", "WJets", "ZJets", "WWJets", "WZJets", "ZZJets"] {
        config.add_dataset(dataset);
    }

    config.add_process(Process::new("st", 10, "Single top", "st").with_xsec(80.0));
    config.add_process(Process::new("WJets", 20, "W + jets", "W").with_xsec(31_314.0));
    config.add_process(Process::new("ZJets", 30, "Z + jets", "Z").with_xsec(3048.0));
    config.add_process(Process::new("diboson", 40, "Diboson", "VV").with_xsec(63.4));

    config.add_shift(Shift::new("lumi_up", ShiftKind::Rate, "Luminosity")?);
    config.add_shift(Shift::new("lumi_down", ShiftKind::Rate, "Luminosity")?);
    config.add_shift(Shift::new("jer_up", ShiftKind::Shape, "Jet energy resolution")?);
    config.add_shift(Shift::new("jer_down", ShiftKind::Shape, "Jet energy resolution")?);

    config.add_channel(Channel { name: "mu".to_string(),
                                 id: 1,
                                 label: "#mu".to_string(),
                                 luminosity: 5.55 });

    config.add_variable(Variable::new("jet1_pt",
                                      "LeadingJet_Pt",
                                      Binning { n_bins: 20, low: 0.0, high: 200.0 },
                                      "Leading jet p_{T}").with_unit("GeV"));
    config.add_variable(Variable::new("weight",
                                      "EventWeight",
                                      Binning { n_bins: 20, low: 0.0, high: 1.0 },
                                      "Event weight"));
    Ok(config)
}

/// Registro completo del análisis single-top.
pub fn singletop_registry() -> Result<Registry, DomainError> {
    let mut registry = Registry::new();
    registry.add_campaign(opendata_campaign()?);
    registry.add_config(singletop_config()?)?;
    Ok(registry)
}

fn seed_for(url: &str) -> u64 {
    let digest = blake3::hash(url.as_bytes());
    u64::from_le_bytes(digest.as_bytes()[..8].try_into().unwrap_or([0; 8]))
}

/// Tabla sintética determinista: la misma URL produce siempre la misma
/// tabla, de modo que URLs compartidas entre datasets dan bytes idénticos.
pub fn synthetic_table(url: &str, n_rows: usize) -> EventTable {
    let mut rng = StdRng::seed_from_u64(seed_for(url));
    let mut columns: IndexMap<String, Vec<f64>> = opendata::column_names()
        .into_iter()
        .map(|name| (name, vec![0.0; n_rows]))
        .collect();

    for row in 0..n_rows {
        columns[COL_TRIGGER][row] = if rng.random::<f64>() < 0.7 { 1.0 } else { 0.0 };
        columns[COL_MET_PT][row] = rng.random::<f64>() * 100.0;
        columns[COL_EVENT_WEIGHT][row] = rng.random::<f64>();

        let n_jets = rng.random_range(0..=MAX_JETS);
        columns[COL_N_JET][row] = n_jets as f64;
        for slot in 1..=n_jets {
            columns[&opendata::jet_col(slot, "Pt")][row] = 20.0 + rng.random::<f64>() * 130.0;
            columns[&opendata::jet_col(slot, "Eta")][row] = rng.random::<f64>() * 6.0 - 3.0;
            columns[&opendata::jet_col(slot, "ID")][row] = if rng.random::<f64>() < 0.9 { 1.0 } else { 0.0 };
            columns[&opendata::jet_col(slot, "btag")][row] = rng.random::<f64>() * 5.0;
        }

        let n_muons = rng.random_range(0..=MAX_MUONS);
        columns[COL_N_MUON][row] = n_muons as f64;
        for slot in 1..=n_muons {
            columns[&opendata::muon_col(slot, "Pt")][row] = 10.0 + rng.random::<f64>() * 70.0;
            columns[&opendata::muon_col(slot, "Eta")][row] = rng.random::<f64>() * 4.8 - 2.4;
            columns[&opendata::muon_col(slot, "Iso")][row] = rng.random::<f64>() * 0.5;
        }

        let n_electrons = rng.random_range(0..=MAX_ELECTRONS);
        columns[COL_N_ELECTRON][row] = n_electrons as f64;
        for slot in 1..=n_electrons {
            columns[&opendata::electron_col(slot, "Pt")][row] = 10.0 + rng.random::<f64>() * 70.0;
            columns[&opendata::electron_col(slot, "Eta")][row] = rng.random::<f64>() * 4.8 - 2.4;
            columns[&opendata::electron_col(slot, "Iso")][row] = rng.random::<f64>() * 0.5;
        }
    }

    EventTable::from_columns(columns).unwrap_or_default()
}

/// Fuente estática con una tabla sintética serializada por clave de la
/// campaña. `rows_per_key` dimensiona cada tabla.
pub fn synthetic_source(campaign: &Campaign, rows_per_key: usize) -> StaticSource {
    let mut source = StaticSource::new();
    for dataset in campaign.datasets() {
        for key in &dataset.info(ana_domain::NOMINAL).keys {
            let table = synthetic_table(key, rows_per_key);
            if let Ok(bytes) = serde_json::to_vec(&table) {
                source.insert(key, bytes);
            }
        }
    }
    source
}
