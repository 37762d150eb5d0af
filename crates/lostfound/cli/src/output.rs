//! Output formatting utilities

use crate::error::{CliError, CliResult};
use colored::*;
use serde::Serialize;
use tabled::{Table, Tabled};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed table format
    #[default]
    Table,
    /// JSON format
    Json,
    /// YAML format
    Yaml,
}

/// Print table rows, or `value` itself for structured formats.
pub fn print_rows<T: Tabled, V: Serialize + ?Sized>(
    rows: Vec<T>,
    value: &V,
    format: OutputFormat,
) -> CliResult<()> {
    match format {
        OutputFormat::Table => {
            if rows.is_empty() {
                println!("{}", "No results".dimmed());
            } else {
                println!("{}", Table::new(rows));
            }
            Ok(())
        }
        _ => print_structured(value, format),
    }
}

/// Print a value as JSON or YAML. Table format falls back to JSON.
pub fn print_structured<T: Serialize + ?Sized>(value: &T, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Table | OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(value)?);
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yaml::to_string(value)?);
        }
    }
    Ok(())
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green(), message);
}

/// Print an error as `error[<code>]: <message>`
pub fn print_error(error: &CliError) {
    eprintln!("{}: {}", format!("error[{}]", error.code()).red().bold(), error);
}
