//! Custom assertions for diagnostics tests.
//!
//! Each returns `anyhow::Result` so failures carry a readable message instead
//! of a bare `assert!` panic.

use anyhow::{Context, Result};
use kmo_types::{Cell, ResultTable};
use serde_json::Value;

use crate::stub::StubEngine;

/// Assert that nothing was sent to the engine.
pub fn assert_no_executions(stub: &StubEngine) -> Result<()> {
    let calls = stub.calls();
    if !calls.is_empty() {
        anyhow::bail!(
            "Expected no executions, got {}: first was {:?}",
            calls.len(),
            calls[0].sql.lines().next().unwrap_or("")
        );
    }
    Ok(())
}

/// Assert column names and their order.
pub fn assert_columns(table: &ResultTable, expected: &[&str]) -> Result<()> {
    let actual = table.column_names();
    if actual != expected {
        anyhow::bail!("Expected columns {:?}, got {:?}", expected, actual);
    }
    Ok(())
}

/// Assert the values of one column, row by row, in order.
pub fn assert_column_values(table: &ResultTable, column: &str, expected: &[Cell]) -> Result<()> {
    let index = table
        .column_index(column)
        .with_context(|| format!("Column '{}' not found in {:?}", column, table.column_names()))?;

    let actual: Vec<&Cell> = table.rows().iter().map(|row| &row[index]).collect();
    let expected: Vec<&Cell> = expected.iter().collect();
    if actual != expected {
        anyhow::bail!(
            "Column '{}': expected {:?}, got {:?}",
            column,
            expected,
            actual
        );
    }
    Ok(())
}

/// Assert a CLI `--format json` compose payload names the expected operation.
pub fn assert_composed_operation(json: &Value, operation: &str) -> Result<()> {
    let actual = json["operation"]
        .as_str()
        .context("Expected 'operation' string in JSON")?;
    if actual != operation {
        anyhow::bail!("Expected operation {}, got {}", operation, actual);
    }
    json["text"]
        .as_str()
        .context("Expected 'text' string in JSON")?;
    Ok(())
}
