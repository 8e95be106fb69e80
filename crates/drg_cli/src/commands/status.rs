use anyhow::{Context, Result};
use drg_policy::{PolicyGate, PolicyStore};

use crate::{StoreArgs, output};

pub fn execute(args: &StoreArgs) -> Result<()> {
    let store = super::open_store(args)?;
    let gate = PolicyGate::new(&store);

    let open = gate.is_gate_open().context("Failed to read gate")?;
    let state = store.get_gate().context("Failed to read gate")?;
    let incidents = store
        .open_incidents()
        .context("Failed to list open incidents")?;

    output::print_gate(open, state.as_ref(), &incidents);
    Ok(())
}
