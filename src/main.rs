//! Demo del flujo single-top: construye el grafo, lo ejecuta en nominal y en
//! ambos shifts de JER, y muestra memoización al repetir la corrida nominal.
//!
//! El store es en memoria por defecto; con `ANALYSIS_LOCAL_STORE` definido
//! los artifacts quedan como archivos JSON bajo ese directorio.

use ana_adapters::{setup, singletop_registry, JerVarier, JsonConverter, SingleTopReconstructor,
                   SingleTopSelector, StackAggregator};
use ana_core::{ArtifactStore, Collaborators, EventSink, FlowRunner, FsArtifactStore, GraphBuilder,
               InMemoryArtifactStore, InMemoryEventSink, RunReport, ShiftVarier, StageEventKind};
use ana_domain::Registry;

const ROWS_PER_KEY: usize = 300;

fn collaborators(registry: &Registry) -> Result<Collaborators, Box<dyn std::error::Error>> {
    let campaign = registry.get_campaign(setup::CAMPAIGN)?;
    Ok(Collaborators { source: Box::new(setup::synthetic_source(campaign, ROWS_PER_KEY)),
                       converter: Box::new(JsonConverter),
                       varier: Box::new(JerVarier::default()),
                       selector: Box::new(SingleTopSelector::default()),
                       reconstructor: Box::new(SingleTopReconstructor),
                       aggregator: Box::new(StackAggregator) })
}

fn print_report(shift: &str, report: &RunReport) {
    println!("[{}] run {}: {} completed, {} skipped, {} failed",
             shift,
             report.run_id,
             report.completed.len(),
             report.skipped.len(),
             report.failed.len());
    for error in &report.failed {
        eprintln!("[{}]   {}", shift, error);
    }
}

fn run_all<S: ArtifactStore>(registry: &Registry, store: S) -> Result<(), Box<dyn std::error::Error>> {
    let varier = JerVarier::default();
    let builder = GraphBuilder::new(registry, setup::ANALYSIS, setup::CONFIG)
        .version("v1")
        .sensitivity(varier.sensitivity());
    let events = InMemoryEventSink::new();
    let runner = FlowRunner::new(registry, store, events, collaborators(registry)?);

    for shift in ["nominal", "jer_up", "jer_down"] {
        let graph = builder.build(shift)?;
        let report = runner.run(&graph)?;
        print_report(shift, &report);

        for event in runner.events().list(report.run_id) {
            if let StageEventKind::Message { identity, text } = event.kind {
                log::debug!("{}: {}", identity, text);
            }
        }
    }

    // segunda corrida nominal: todo memoizado
    let graph = builder.build("nominal")?;
    let report = runner.run(&graph)?;
    println!("[nominal, again] {} of {} units skipped",
             report.skipped.len(),
             graph.n_units());

    let bundle = runner.store().read(&graph.aggregate.store_path())?;
    println!("aggregate bundle hash: {}", bundle.hash);
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();
    let registry = singletop_registry()?;

    if std::env::var("ANALYSIS_LOCAL_STORE").is_ok() {
        let store = FsArtifactStore::from_env()?;
        println!("artifact store: {}", store.root().display());
        run_all(&registry, store)
    } else {
        println!("artifact store: in-memory (set ANALYSIS_LOCAL_STORE for files)");
        run_all(&registry, InMemoryArtifactStore::new())
    }
}
