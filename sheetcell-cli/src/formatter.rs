//! Output formatters for cell reads

use crate::OutputFormat;
use anyhow::Result;
use colored::*;
use serde_json::json;
use sheetcell::{CellCheck, CellRange, CellRecord, CellValue};

fn print_json(value: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Colored rendering of a value; blanks are dimmed
fn styled(value: &CellValue) -> ColoredString {
    match value {
        CellValue::Empty => "(empty)".bright_black(),
        v if v.is_blank() => v.to_string().bright_black(),
        CellValue::Number(_) => value.to_string().cyan(),
        CellValue::Boolean(_) => value.to_string().yellow(),
        CellValue::Text(s) => s.normal(),
    }
}

pub fn print_sheets(format: OutputFormat, names: &[String], selected: &str) -> Result<()> {
    match format {
        OutputFormat::Human => {
            for name in names {
                if name == selected {
                    println!("{} {}", "*".green().bold(), name.cyan().bold());
                } else {
                    println!("  {}", name);
                }
            }
            Ok(())
        }
        OutputFormat::Json => print_json(&json!({ "sheets": names, "selected": selected })),
    }
}

pub fn print_cell(format: OutputFormat, address: &str, value: &CellValue) -> Result<()> {
    match format {
        OutputFormat::Human => {
            println!("{} {}", address.to_ascii_uppercase().bold(), styled(value));
            Ok(())
        }
        OutputFormat::Json => print_json(&json!({
            "address": address.to_ascii_uppercase(),
            "value": value,
        })),
    }
}

/// Print range values as a grid, one line per row
pub fn print_range(format: OutputFormat, range: &CellRange, values: &[CellValue]) -> Result<()> {
    let width = range.col_count() as usize;
    match format {
        OutputFormat::Human => {
            println!("{}", format!("Range {}", range).bold().underline());
            let first_row = range.start().row_number();
            for (i, row) in values.chunks(width.max(1)).enumerate() {
                let cells: Vec<String> = row.iter().map(|v| styled(v).to_string()).collect();
                println!("{:>6}  {}", (first_row + i as u64).to_string().yellow(), cells.join("\t"));
            }
            Ok(())
        }
        OutputFormat::Json => {
            let rows: Vec<&[CellValue]> = values.chunks(width.max(1)).collect();
            print_json(&json!({ "range": range.to_string(), "rows": rows }))
        }
    }
}

pub fn print_blank(format: OutputFormat, address: &str, blank: bool) -> Result<()> {
    match format {
        OutputFormat::Human => {
            let flag = if blank { "true".yellow() } else { "false".green() };
            println!("{}", flag);
            Ok(())
        }
        OutputFormat::Json => print_json(&json!({
            "address": address.to_ascii_uppercase(),
            "is_blank": blank,
        })),
    }
}

pub fn print_check(format: OutputFormat, check: &CellCheck) -> Result<()> {
    match format {
        OutputFormat::Human => {
            println!("{} {}", "Cell:".bold(), check.address.to_string().yellow());
            println!("  {} {}", "Value:".bold(), styled(&check.value));
            println!("  {} {}", "Type:".bold(), check.data_type);
            println!("  {} {}", "Blank:".bold(), check.is_blank);
            Ok(())
        }
        OutputFormat::Json => print_json(&serde_json::to_value(check)?),
    }
}

/// Print scan results with a blank-count summary
pub fn print_records(format: OutputFormat, title: &str, records: &[CellRecord]) -> Result<()> {
    match format {
        OutputFormat::Human => {
            println!("{}", title.bold().underline());
            if records.is_empty() {
                println!("{}", "No cells visited".bright_black());
                return Ok(());
            }
            for record in records {
                let marker = if record.is_blank {
                    " blank".bright_black()
                } else {
                    "".normal()
                };
                println!(
                    "  {:<8} {}{}",
                    record.address.to_string().yellow(),
                    styled(&record.value),
                    marker
                );
            }
            let blanks = records.iter().filter(|r| r.is_blank).count();
            println!();
            println!(
                "{} {} cells, {} blank",
                "Summary:".bold(),
                records.len(),
                blanks
            );
            Ok(())
        }
        OutputFormat::Json => print_json(&json!({
            "cells": records,
            "count": records.len(),
            "blank": records.iter().filter(|r| r.is_blank).count(),
        })),
    }
}
