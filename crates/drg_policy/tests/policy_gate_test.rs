//! Integration tests for the policy gate driven by real validation results.

use chrono::Utc;
use drg_core::{ContractBuilder, SchemaFieldBuilder};
use drg_policy::{IncidentStatus, MemoryStore, PolicyGate, PolicyStore, RunStatus};
use drg_validator::{Batch, Column, run_validations};
use pretty_assertions::assert_eq;
use std::thread;

fn rides_batch() -> Batch {
    Batch::new(vec![
        Column::from_values("vendor_id", [1i64, 2, 2]),
        Column::from_values("pickup_datetime", [Utc::now(); 3]),
        Column::from_values("fare_amount", [9.5, 14.0, 22.75]),
    ])
    .unwrap()
}

fn rides_contract() -> drg_core::Contract {
    ContractBuilder::new("nyc_taxi_rides")
        .field(SchemaFieldBuilder::new("vendor_id", "integer").required(true).build())
        .field(SchemaFieldBuilder::new("pickup_datetime", "timestamp").required(true).build())
        .volume(1, None)
        .freshness(24.0)
        .build()
}

#[test]
fn test_schema_drift_blocks_gate_end_to_end() {
    let store = MemoryStore::new();
    let gate = PolicyGate::new(&store);
    store.register_run("run-42", "nyc_taxi_rides", Utc::now()).unwrap();

    let mut batch = rides_batch();
    batch.rename_column("vendor_id", "provider_id").unwrap();
    let results = run_validations(&batch, &rides_contract());

    assert!(!results[0].passed());
    let passed = gate.enforce("run-42", &results).unwrap();

    assert!(!passed);
    assert!(!gate.is_gate_open().unwrap());
    let incidents = store.open_incidents().unwrap();
    assert_eq!(incidents.len(), 1);
    assert_eq!(incidents[0].run_id, "run-42");
    assert_eq!(
        incidents[0].summary,
        "Run run-42 failed 1 checks: schema_presence"
    );
    assert_eq!(store.get_run("run-42").unwrap().unwrap().status, RunStatus::Failed);
}

#[test]
fn test_repaired_batch_clears_incident() {
    let store = MemoryStore::new();
    let gate = PolicyGate::new(&store);
    store.register_run("run-7", "nyc_taxi_rides", Utc::now()).unwrap();

    let mut broken = rides_batch();
    broken.rename_column("vendor_id", "provider_id").unwrap();
    gate.enforce("run-7", &run_validations(&broken, &rides_contract()))
        .unwrap();
    gate.enforce("run-7", &run_validations(&broken, &rides_contract()))
        .unwrap();

    let passed = gate
        .enforce("run-7", &run_validations(&rides_batch(), &rides_contract()))
        .unwrap();

    assert!(passed);
    assert!(gate.is_gate_open().unwrap());
    let incident = store.find_incident("run-7").unwrap().unwrap();
    assert_eq!(incident.status, IncidentStatus::Resolved);
    assert!(store.open_incidents().unwrap().is_empty());
    assert_eq!(store.get_run("run-7").unwrap().unwrap().status, RunStatus::Passed);
}

#[test]
fn test_concurrent_runs_last_writer_wins() {
    let store = MemoryStore::new();
    let run_ids: Vec<String> = (0..8).map(|i| format!("run-{i}")).collect();
    for run_id in &run_ids {
        store.register_run(run_id, "nyc_taxi_rides", Utc::now()).unwrap();
    }

    let mut broken = rides_batch();
    broken.rename_column("vendor_id", "provider_id").unwrap();
    let contract = rides_contract();
    let failing = run_validations(&broken, &contract);
    let passing = run_validations(&rides_batch(), &contract);

    thread::scope(|scope| {
        for (i, run_id) in run_ids.iter().enumerate() {
            let gate = PolicyGate::new(&store);
            let results = if i % 2 == 0 { &failing } else { &passing };
            scope.spawn(move || gate.enforce(run_id, results).unwrap());
        }
    });

    // Every failing run has exactly one incident, whatever the interleaving.
    assert_eq!(store.open_incidents().unwrap().len(), 4);

    // The gate reflects whichever run wrote it last.
    let gate_state = store.get_gate().unwrap().unwrap();
    let last_writer_failed = gate_state.reason.contains("failed");
    assert_eq!(gate_state.blocked, last_writer_failed);
    assert_eq!(PolicyGate::new(&store).is_gate_open().unwrap(), !gate_state.blocked);
}
