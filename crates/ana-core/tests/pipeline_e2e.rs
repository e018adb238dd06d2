//! Ejecución end-to-end del grafo con colaboradores sintéticos.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use indexmap::{indexmap, IndexMap};
use serde_json::{json, Value};

use ana_adapters::{JsonConverter, StaticSource};
use ana_core::{Aggregator, Artifact, ArtifactStore, Collaborators, CoreError, FlowRunner,
               GraphBuilder, InMemoryArtifactStore, InMemoryEventSink, Reconstructor,
               SelectionResult, Selector, ShiftSensitivity, ShiftVarier, StageGraph, TaskIdentity};
use ana_domain::{AnalysisConfig, Campaign, Dataset, DatasetInfo, EventTable, Process, Registry,
                 Shift, ShiftKind};

const SOURCE_KEY: &str = "mem://demo";

/// Un dataset de 9 eventos en 3 particiones; el shift `scale_up` es el único
/// no nominal declarado.
fn registry() -> Registry {
    let mut campaign = Campaign::new("camp", 1, 7.0, 50.0);
    campaign.add_dataset(Dataset::new("demo",
                                      1,
                                      "sig",
                                      DatasetInfo::new(vec![SOURCE_KEY.to_string()], 3, 9)))
            .unwrap();

    let mut config = AnalysisConfig::new("cfg", "ana", "camp");
    config.add_dataset("demo");
    config.add_process(Process::new("sig", 1, "Signal", "sig"));
    config.add_shift(Shift::new("scale_up", ShiftKind::Shape, "Scale").unwrap());

    let mut registry = Registry::new();
    registry.add_campaign(campaign);
    registry.add_config(config).unwrap();
    registry
}

fn source_table() -> EventTable {
    EventTable::from_columns(indexmap! {
        "value".to_string() => (0..9).map(f64::from).collect(),
    }).unwrap()
}

/// Selecciona las filas cuyo `value` es congruente con 1 módulo 3.
struct Mod3Selector {
    calls: Arc<AtomicUsize>,
}

impl Selector for Mod3Selector {
    fn select(&self, events: &EventTable) -> Result<SelectionResult, CoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let indexes: Vec<usize> = events.column("value")?
                                        .iter()
                                        .enumerate()
                                        .filter(|(_, v)| (**v as i64).rem_euclid(3) == 1)
                                        .map(|(i, _)| i)
                                        .collect();
        let objects = vec![Value::Null; indexes.len()];
        Ok(SelectionResult { indexes, objects })
    }
}

/// Deriva `double = value * 2` por fila seleccionada.
struct Doubler;

impl Reconstructor for Doubler {
    fn reconstruct(&self, events: &EventTable, _objects: &[Value]) -> Result<EventTable, CoreError> {
        let doubles: Vec<f64> = events.column("value")?.iter().map(|v| v * 2.0).collect();
        Ok(EventTable::from_columns(indexmap! {
            "double".to_string() => doubles,
        })?)
    }
}

/// Escala `value` por 2; sensible únicamente a `scale_up`.
struct ScaleVarier {
    calls: Arc<AtomicUsize>,
}

impl ShiftVarier for ScaleVarier {
    fn sensitivity(&self) -> ShiftSensitivity {
        ShiftSensitivity::of(&["scale_up"])
    }

    fn apply(&self,
             events: &mut EventTable,
             _shift: &Shift,
             _identity: &TaskIdentity)
             -> Result<(), CoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        for v in events.column_mut("value")? {
            *v *= 2.0;
        }
        Ok(())
    }
}

/// Reporta el número de filas por proceso.
struct CountAggregator;

impl Aggregator for CountAggregator {
    fn aggregate(&self,
                 per_process: &IndexMap<String, EventTable>,
                 _config: &AnalysisConfig)
                 -> Result<Value, CoreError> {
        let mut out = serde_json::Map::new();
        for (process, table) in per_process {
            out.insert(process.clone(), json!(table.n_rows()));
        }
        Ok(Value::Object(out))
    }
}

struct Counters {
    selections: Arc<AtomicUsize>,
    variations: Arc<AtomicUsize>,
}

fn collaborators() -> (Collaborators, Counters) {
    let counters = Counters { selections: Arc::new(AtomicUsize::new(0)),
                              variations: Arc::new(AtomicUsize::new(0)) };
    let mut source = StaticSource::new();
    source.insert(SOURCE_KEY, serde_json::to_vec(&source_table()).unwrap());
    let collab = Collaborators { source: Box::new(source),
                                 converter: Box::new(JsonConverter),
                                 varier: Box::new(ScaleVarier { calls: counters.variations.clone() }),
                                 selector: Box::new(Mod3Selector { calls: counters.selections.clone() }),
                                 reconstructor: Box::new(Doubler),
                                 aggregator: Box::new(CountAggregator) };
    (collab, counters)
}

fn nominal_graph(registry: &Registry) -> StageGraph {
    GraphBuilder::new(registry, "ana", "cfg").sensitivity(ShiftSensitivity::of(&["scale_up"]))
                                             .build("nominal")
                                             .unwrap()
}

#[test]
fn full_pipeline_produces_ordered_reduce_and_bundle() {
    let registry = registry();
    let graph = nominal_graph(&registry);
    let (collab, _) = collaborators();
    let runner = FlowRunner::new(&registry, InMemoryArtifactStore::new(), InMemoryEventSink::new(), collab);

    let report = runner.run(&graph).unwrap();
    assert!(report.is_success());
    // fetch + convert + 3 map + 3 select + reduce + aggregate, sin vary
    assert_eq!(graph.n_units(), 10);
    assert_eq!(report.completed.len(), 10);

    // cada branch conserva una fila; el reduce las concatena por índice de
    // branch, que aquí coincide con el orden global de filas
    let reduce = runner.store().read(&graph.pipelines[0].reduce.store_path()).unwrap();
    let table = reduce.as_table().unwrap();
    assert_eq!(table.column("value").unwrap(), &[1.0, 4.0, 7.0]);
    assert_eq!(table.column("double").unwrap(), &[2.0, 8.0, 14.0]);

    let bundle = runner.store().read(&graph.aggregate.store_path()).unwrap();
    assert_eq!(bundle.payload, json!({ "sig": 3 }));
}

#[test]
fn second_run_is_fully_skipped_and_byte_identical() {
    let registry = registry();
    let graph = nominal_graph(&registry);
    let (collab, counters) = collaborators();
    let runner = FlowRunner::new(&registry, InMemoryArtifactStore::new(), InMemoryEventSink::new(), collab);

    runner.run(&graph).unwrap();
    let first_hash = runner.store().read(&graph.pipelines[0].reduce.store_path()).unwrap().hash;
    assert_eq!(counters.selections.load(Ordering::SeqCst), 3);

    let second = runner.run(&graph).unwrap();
    assert!(second.completed.is_empty());
    assert_eq!(second.skipped.len(), graph.n_units());
    // los colaboradores no se reinvocan para unidades memoizadas
    assert_eq!(counters.selections.load(Ordering::SeqCst), 3);
    let second_hash = runner.store().read(&graph.pipelines[0].reduce.store_path()).unwrap().hash;
    assert_eq!(first_hash, second_hash);
}

#[test]
fn externally_deleted_artifact_is_recreated_identically() {
    let registry = registry();
    let graph = nominal_graph(&registry);
    let (collab, _) = collaborators();
    let runner = FlowRunner::new(&registry, InMemoryArtifactStore::new(), InMemoryEventSink::new(), collab);

    runner.run(&graph).unwrap();
    let reduce_path = graph.pipelines[0].reduce.store_path();
    let original = runner.store().read(&reduce_path).unwrap();
    runner.store().remove(&reduce_path);

    let report = runner.run(&graph).unwrap();
    assert!(report.is_success());
    assert!(report.completed.contains(&graph.pipelines[0].reduce));
    assert_eq!(runner.store().read(&reduce_path).unwrap().hash, original.hash);
}

#[test]
fn reduce_respects_branch_order_not_completion_order() {
    let registry = registry();
    let graph = nominal_graph(&registry);
    let (collab, _) = collaborators();
    let store = InMemoryArtifactStore::new();

    // artifacts de select pre-sembrados fuera de orden: el reduce debe
    // concatenar por índice de branch, no por orden de aparición
    for branch in [2usize, 0, 1] {
        let table = EventTable::from_columns(indexmap! {
            "value".to_string() => vec![(branch as f64 + 1.0) * 10.0],
        }).unwrap();
        let artifact = Artifact::from_table(&table).unwrap();
        store.write(&graph.pipelines[0].branches[branch].select.store_path(), &artifact)
             .unwrap();
    }

    let runner = FlowRunner::new(&registry, store, InMemoryEventSink::new(), collab);
    let report = runner.run(&graph).unwrap();
    assert!(report.is_success());

    let table = runner.store()
                      .read(&graph.pipelines[0].reduce.store_path())
                      .unwrap()
                      .as_table()
                      .unwrap();
    assert_eq!(table.column("value").unwrap(), &[10.0, 20.0, 30.0]);
}

#[test]
fn shifted_run_reuses_variation_independent_artifacts() {
    let registry = registry();
    let (collab, counters) = collaborators();
    let runner = FlowRunner::new(&registry, InMemoryArtifactStore::new(), InMemoryEventSink::new(), collab);

    let nominal = nominal_graph(&registry);
    runner.run(&nominal).unwrap();

    let shifted = GraphBuilder::new(&registry, "ana", "cfg")
        .sensitivity(ShiftSensitivity::of(&["scale_up"]))
        .build("scale_up")
        .unwrap();
    let report = runner.run(&shifted).unwrap();
    assert!(report.is_success());

    // fetch, convert y los 3 map resuelven a nominal y ya existen
    assert_eq!(report.skipped.len(), 5);
    // 3 vary + 3 select + reduce + aggregate son nuevos
    assert_eq!(report.completed.len(), 8);
    assert_eq!(counters.variations.load(Ordering::SeqCst), 3);

    // con value escalado por 2, sobreviven los congruentes con 1 módulo 3
    // tras el escalado: 2v % 3 == 1 para v in {2, 5, 8}
    let table = runner.store()
                      .read(&shifted.pipelines[0].reduce.store_path())
                      .unwrap()
                      .as_table()
                      .unwrap();
    assert_eq!(table.column("value").unwrap(), &[4.0, 10.0, 16.0]);

    // el bundle agregado del shift vive en su propia ruta
    assert_ne!(shifted.aggregate.store_path(), nominal.aggregate.store_path());
    assert!(runner.store().exists(&shifted.aggregate.store_path()));
}

#[test]
fn key_bearing_override_stores_the_whole_chain_under_its_own_shift() {
    // el override de alt_up trae sus propias claves de origen: fetch,
    // convert y map deben direccionarse bajo alt_up, sin pisar la ruta
    // nominal del dataset
    let mut campaign = Campaign::new("camp", 1, 7.0, 50.0);
    campaign.add_dataset(Dataset::new("demo",
                                      1,
                                      "sig",
                                      DatasetInfo::new(vec!["mem://nominal".to_string()], 1, 3))
                             .with_info("alt_up",
                                        DatasetInfo::new(vec!["mem://alt".to_string()], 1, 3)))
            .unwrap();
    let mut config = AnalysisConfig::new("cfg", "ana", "camp");
    config.add_dataset("demo");
    config.add_process(Process::new("sig", 1, "Signal", "sig"));
    config.add_shift(Shift::new("alt_up", ShiftKind::Shape, "Alt sample").unwrap());
    let mut registry = Registry::new();
    registry.add_campaign(campaign);
    registry.add_config(config).unwrap();

    let nominal_table = EventTable::from_columns(indexmap! {
        "value".to_string() => vec![1.0, 1.0, 1.0],
    }).unwrap();
    let alt_table = EventTable::from_columns(indexmap! {
        "value".to_string() => vec![4.0, 4.0, 4.0],
    }).unwrap();
    let (mut collab, _) = collaborators();
    let mut source = StaticSource::new();
    source.insert("mem://nominal", serde_json::to_vec(&nominal_table).unwrap());
    source.insert("mem://alt", serde_json::to_vec(&alt_table).unwrap());
    collab.source = Box::new(source);

    let builder = GraphBuilder::new(&registry, "ana", "cfg");
    let nominal = builder.build("nominal").unwrap();
    let shifted = builder.build("alt_up").unwrap();

    assert_eq!(shifted.pipelines[0].source_key, "mem://alt");
    assert_eq!(shifted.pipelines[0].fetch.effective_shift(), "alt_up");
    assert_ne!(shifted.pipelines[0].fetch.store_path(),
               nominal.pipelines[0].fetch.store_path());
    assert_ne!(shifted.pipelines[0].convert.store_path(),
               nominal.pipelines[0].convert.store_path());

    // la corrida shifted no debe contaminar la corrida nominal posterior
    let runner = FlowRunner::new(&registry, InMemoryArtifactStore::new(), InMemoryEventSink::new(), collab);
    runner.run(&shifted).unwrap();
    runner.run(&nominal).unwrap();

    let shifted_reduce = runner.store()
                               .read(&shifted.pipelines[0].reduce.store_path())
                               .unwrap()
                               .as_table()
                               .unwrap();
    assert_eq!(shifted_reduce.column("value").unwrap(), &[4.0, 4.0, 4.0]);
    let nominal_reduce = runner.store()
                               .read(&nominal.pipelines[0].reduce.store_path())
                               .unwrap()
                               .as_table()
                               .unwrap();
    assert_eq!(nominal_reduce.column("value").unwrap(), &[1.0, 1.0, 1.0]);
}

#[test]
fn mismatched_branch_schemas_fail_the_reduce_barrier() {
    let registry = registry();
    let graph = nominal_graph(&registry);
    let (collab, _) = collaborators();
    let store = InMemoryArtifactStore::new();

    // un branch con una columna extra rompe el esquema del reduce
    let odd = EventTable::from_columns(indexmap! {
        "value".to_string() => vec![1.0],
        "extra".to_string() => vec![0.0],
    }).unwrap();
    store.write(&graph.pipelines[0].branches[1].select.store_path(),
                &Artifact::from_table(&odd).unwrap())
         .unwrap();

    let runner = FlowRunner::new(&registry, store, InMemoryEventSink::new(), collab);
    let report = runner.run(&graph).unwrap();
    assert!(!report.is_success());

    let reduce_failure = report.failed
                               .iter()
                               .find(|e| e.identity == graph.pipelines[0].reduce)
                               .expect("reduce must fail");
    assert!(matches!(reduce_failure.kind, CoreError::SchemaMismatch(_)));
    // el aggregate queda insatisfecho, los branches hermanos no se ven
    // afectados
    assert!(report.failed.iter().any(|e| e.identity == graph.aggregate));
    assert!(runner.store().exists(&graph.pipelines[0].branches[0].select.store_path()));
}

#[test]
fn failing_branch_leaves_siblings_and_barrier_isolated() {
    let registry = registry();
    let graph = nominal_graph(&registry);

    // fuente sin la clave del dataset: fetch falla y el resto del subgrafo
    // del dataset ni se intenta
    let (mut collab, _) = collaborators();
    collab.source = Box::new(StaticSource::new());
    let runner = FlowRunner::new(&registry, InMemoryArtifactStore::new(), InMemoryEventSink::new(), collab);

    let report = runner.run(&graph).unwrap();
    assert!(!report.is_success());
    // fetch falla; la única otra unidad considerada es el aggregate, que
    // falla por dependencia ausente
    assert_eq!(report.failed.len(), 2);
    assert!(report.failed.iter().any(|e| matches!(e.kind, CoreError::TransientIo(_))));
    assert!(report.failed.iter().any(|e| matches!(e.kind, CoreError::UpstreamMissing(_))));
    assert!(!runner.store().exists(&graph.aggregate.store_path()));
}
