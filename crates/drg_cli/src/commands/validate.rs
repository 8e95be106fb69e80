use anyhow::{Context, Result, bail};
use chrono::Utc;
use drg_core::ValidationContext;
use drg_parser::load_contract;
use drg_policy::{PolicyGate, PolicyStore};
use drg_store_sqlite::SqliteStore;
use drg_validator::{ValidationEngine, read_parquet};
use std::path::PathBuf;
use tracing::{error, info};

use crate::{RunArgs, output};

pub fn execute(args: &RunArgs) -> Result<()> {
    let store = super::open_store(&args.store)?;
    run(args, store)
}

/// Validates the run's batch, persists every check outcome and enforces the
/// gate. Exits with status 1 when the gate ends up blocked.
pub(crate) fn run(args: &RunArgs, store: SqliteStore) -> Result<()> {
    info!("Validating run: {}", args.run_id);

    let contract = load_contract(&args.contract).with_context(|| {
        format!(
            "Failed to load contract file: {}",
            args.contract.display()
        )
    })?;
    if args.format == "text" {
        output::print_info(&format!(
            "Contract loaded: {} (owner: {})",
            contract.dataset_id, contract.owner
        ));
    }

    let data_path = args
        .data
        .clone()
        .unwrap_or_else(|| default_data_path(&args.run_id));
    if !data_path.exists() {
        bail!("Data file not found: {}", data_path.display());
    }
    info!("Reading {}...", data_path.display());
    let batch = read_parquet(&data_path)
        .with_context(|| format!("Failed to read batch: {}", data_path.display()))?;

    let started_at = Utc::now();
    store
        .register_run(&args.run_id, &contract.dataset_id, started_at)
        .context("Failed to register run")?;

    info!("Running validations...");
    let report = ValidationEngine::new().validate(&contract, &batch, &ValidationContext::new());

    for result in &report.results {
        store
            .record_check_result(&args.run_id, result, Utc::now())
            .context("Failed to record check result")?;
        let status = if result.passed() { "PASS" } else { "FAIL" };
        info!("Check {}: {} (Val: {})", result.check_name(), status, result.metric());
    }

    let gate = PolicyGate::new(store);
    let passed = gate
        .enforce(&args.run_id, &report.results)
        .context("Failed to enforce policy")?;

    output::print_validation_report(&args.run_id, &report, &args.format);

    if passed {
        info!("Validation PASSED. Gate OPEN.");
        Ok(())
    } else {
        error!("Validation FAILED. Gate BLOCKED.");
        std::process::exit(1);
    }
}

/// Location the ingestion step writes a run's batch to.
pub(crate) fn default_data_path(run_id: &str) -> PathBuf {
    PathBuf::from(format!("data/raw/rides_{run_id}.parquet"))
}
