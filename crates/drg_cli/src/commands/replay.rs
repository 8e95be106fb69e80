use anyhow::{Context, Result, bail};
use drg_policy::PolicyStore;
use tracing::info;

use crate::RunArgs;

/// Re-validates a run that was validated before. A passing replay resolves
/// the run's incident and reopens the gate.
pub fn execute(args: &RunArgs) -> Result<()> {
    let store = super::open_store(&args.store)?;

    let run = store
        .get_run(&args.run_id)
        .context("Failed to look up run")?;
    let Some(run) = run else {
        bail!("Run {} was never registered", args.run_id);
    };
    info!("Replaying run {} (last status: {})", run.run_id, run.status);

    super::validate::run(args, store)
}
