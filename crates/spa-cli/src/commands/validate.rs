//! Validate command implementation.

use std::fs;
use std::process::ExitCode;

use anyhow::{Context, Result};
use colored::Colorize;

use spa_doc::{validate, ValidationReport};

/// Runs the validate command.
///
/// Exit code 0 when the document is valid (warnings allowed), 1 otherwise.
pub fn run(input: &str, json: bool) -> Result<ExitCode> {
    let xml = fs::read_to_string(input)
        .with_context(|| format!("failed to read input file: {}", input))?;

    let report = validate(&xml);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(input, &report);
    }

    if report.is_valid() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(1))
    }
}

fn print_report(input: &str, report: &ValidationReport) {
    println!("{} {}", "Validating:".cyan().bold(), input);

    if !report.errors.is_empty() {
        println!("\n{}", "Errors:".red().bold());
        for error in &report.errors {
            let path_info = error
                .path
                .as_ref()
                .map(|p| format!(" at {}", p))
                .unwrap_or_default();
            println!(
                "  {} [{}]{}: {}",
                "x".red(),
                error.code.to_string().red(),
                path_info.dimmed(),
                error.message
            );
        }
    }

    if !report.warnings.is_empty() {
        println!("\n{}", "Warnings:".yellow().bold());
        for warning in &report.warnings {
            let path_info = warning
                .path
                .as_ref()
                .map(|p| format!(" at {}", p))
                .unwrap_or_default();
            println!(
                "  {} [{}]{}: {}",
                "!".yellow(),
                warning.code.to_string().yellow(),
                path_info.dimmed(),
                warning.message
            );
        }
    }

    if report.is_valid() {
        println!("\n{} Document is valid", "SUCCESS".green().bold());
    } else {
        println!(
            "\n{} Document has {} error(s)",
            "FAILED".red().bold(),
            report.errors.len()
        );
    }
}
