use colored::*;
use drg_core::ValidationReport;
use drg_policy::{GateState, Incident};
use serde_json::json;

pub fn print_validation_report(run_id: &str, report: &ValidationReport, format: &str) {
    match format {
        "json" => print_json_report(run_id, report),
        _ => print_text_report(run_id, report),
    }
}

fn print_text_report(run_id: &str, report: &ValidationReport) {
    println!("\n{}", "═".repeat(60));
    println!("{}", format!("  VALIDATION REPORT: {run_id}").bold());
    println!("{}", "═".repeat(60));

    if report.passed {
        println!(
            "\n{} {}",
            "✓".green().bold(),
            "Validation PASSED".green().bold()
        );
    } else {
        println!(
            "\n{} {}",
            "✗".red().bold(),
            "Validation FAILED".red().bold()
        );
    }

    println!("\n{}", "Checks:".bold());
    for result in &report.results {
        let status = if result.passed() {
            "PASS".green().bold()
        } else {
            "FAIL".red().bold()
        };
        println!(
            "  {status} {:<16} metric: {}",
            result.check_name().as_str(),
            result.metric()
        );
        if !result.passed() && !result.details().is_empty() {
            let details = serde_json::Value::Object(result.details().clone());
            println!("       {}", details.to_string().red());
        }
    }

    println!("\n{}", "Summary:".bold());
    println!("  Rows validated: {}", report.stats.rows_validated);
    println!("  Checks run:     {}", report.stats.checks_run);
    println!("  Failed checks:  {}", report.failed_checks().count());
    println!("{}", "═".repeat(60));
}

fn print_json_report(run_id: &str, report: &ValidationReport) {
    let output = json!({
        "run_id": run_id,
        "passed": report.passed,
        "results": report.results,
        "stats": report.stats,
    });

    match serde_json::to_string_pretty(&output) {
        Ok(text) => println!("{text}"),
        Err(err) => print_error(&format!("Failed to render report: {err}")),
    }
}

pub fn print_gate(open: bool, gate: Option<&GateState>, open_incidents: &[Incident]) {
    if open {
        println!("{}", "GATE IS OPEN".green().bold());
    } else {
        println!("{}", "GATE IS BLOCKED".red().bold());
    }

    if let Some(gate) = gate {
        println!("  Reason:  {}", gate.reason);
        println!("  Updated: {}", gate.updated_at.to_rfc3339());
    }

    if !open_incidents.is_empty() {
        println!("\n{}", "Open incidents:".yellow().bold());
        for incident in open_incidents {
            println!(
                "  #{} [{}] {}",
                incident.id,
                incident.run_id,
                incident.summary.yellow()
            );
        }
    }
}

pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message.green());
}

pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message.red());
}

pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}
