use anyhow::{Context, Result};
use drg_core::Contract;
use drg_parser::load_contract;
use std::path::Path;
use tracing::info;

use crate::output;

pub fn execute(contract_path: &Path, format: &str) -> Result<()> {
    info!("Checking contract: {}", contract_path.display());

    let contract = load_contract(contract_path).with_context(|| {
        format!("Failed to parse contract file: {}", contract_path.display())
    })?;

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&contract)?);
        return Ok(());
    }

    output::print_success("Contract is valid");
    print_summary(&contract);
    Ok(())
}

fn print_summary(contract: &Contract) {
    println!("\nContract Summary:");
    println!("  Dataset:     {}", contract.dataset_id);
    println!("  Owner:       {}", contract.owner);
    println!("  Fields:      {}", contract.schema.len());

    for field in &contract.schema {
        let mut line = format!("    - {} ({})", field.name, field.field_type);
        if field.required {
            line.push_str(" required");
        }
        match (field.min, field.max) {
            (Some(min), Some(max)) => line.push_str(&format!(" [{min}, {max}]")),
            (Some(min), None) => line.push_str(&format!(" [{min}, ..)")),
            (None, Some(max)) => line.push_str(&format!(" (.., {max}]")),
            (None, None) => {}
        }
        println!("{line}");
    }

    let kinds = contract.checks.kinds();
    if kinds.is_empty() {
        println!("  Checks:      none (volume and freshness use defaults)");
    } else {
        println!("  Checks:      {}", kinds.join(", "));
    }

    if let Some(distribution) = &contract.checks.distribution {
        println!("\nDistribution:");
        println!(
            "  Method:     {}",
            distribution.method.as_deref().unwrap_or("N/A")
        );
        println!(
            "  Column:     {}",
            distribution.column.as_deref().unwrap_or("N/A")
        );
        println!("  Threshold:  {}", distribution.threshold);
        println!(
            "  Reference:  {}",
            distribution
                .reference_path
                .as_deref()
                .map_or_else(|| "N/A".to_string(), |path| path.display().to_string())
        );
    }
}
