//! Raw driver rows → [`ResultTable`].
//!
//! Column names and order come from the driver; semantic types come from the
//! operation's declared schema, then the driver's type name, then text. Rows
//! are never reordered, de-duplicated or aggregated.

use chrono::NaiveDateTime;
use kmo_engine::DiagnosticOperation;
use kmo_types::{Cell, Column, Error, ResultTable, Result, Row, SemanticType};

use crate::handle::{RawColumn, RawResult, RawValue};

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

pub fn normalize(raw: RawResult, operation: &DiagnosticOperation) -> Result<ResultTable> {
    if raw.columns.is_empty() {
        if let Some(row) = raw.rows.iter().position(|r| !r.is_empty()) {
            return Err(Error::Normalization {
                column: String::new(),
                row,
                reason: "row values returned without column metadata".to_string(),
            });
        }
        return Ok(ResultTable::empty(operation.declared_columns()));
    }

    let columns: Vec<Column> = raw
        .columns
        .iter()
        .map(|c| Column::new(c.name.clone(), column_type(c, operation)))
        .collect();

    let mut rows: Vec<Row> = Vec::with_capacity(raw.rows.len());
    for (row_index, raw_row) in raw.rows.into_iter().enumerate() {
        if raw_row.len() != columns.len() {
            return Err(Error::Normalization {
                column: String::new(),
                row: row_index,
                reason: format!(
                    "expected {} values, got {}",
                    columns.len(),
                    raw_row.len()
                ),
            });
        }

        let row = raw_row
            .into_iter()
            .zip(&columns)
            .map(|(value, column)| {
                convert(value, column.semantic_type).map_err(|reason| Error::Normalization {
                    column: column.name.clone(),
                    row: row_index,
                    reason,
                })
            })
            .collect::<Result<Row>>()?;
        rows.push(row);
    }

    Ok(ResultTable::new(columns, rows))
}

fn column_type(column: &RawColumn, operation: &DiagnosticOperation) -> SemanticType {
    operation
        .column_type(&column.name)
        .or_else(|| column.sql_type.as_deref().map(SemanticType::from_sql_type))
        .unwrap_or(SemanticType::Text)
}

/// Convert one raw value to `target`, or explain why it cannot be.
pub fn convert(value: RawValue, target: SemanticType) -> std::result::Result<Cell, String> {
    if value == RawValue::Null {
        return Ok(Cell::Null);
    }

    match target {
        SemanticType::Integer => match value {
            RawValue::Int(v) => Ok(Cell::Integer(v)),
            RawValue::Bool(b) => Ok(Cell::Integer(i64::from(b))),
            RawValue::Float(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
                Ok(Cell::Integer(f as i64))
            }
            RawValue::Text(s) => s
                .trim()
                .parse()
                .map(Cell::Integer)
                .map_err(|_| format!("'{}' is not an integer", s)),
            other => Err(mismatch(&other, target)),
        },
        // Decimals become f64, exact to about 15 significant digits. Catalog
        // decimals are sizes in MB and percentages, well inside that; the
        // column type still carries the declared precision and scale.
        SemanticType::Float | SemanticType::Decimal { .. } => match value {
            RawValue::Float(f) => Ok(Cell::Float(f)),
            RawValue::Int(v) => Ok(Cell::Float(v as f64)),
            RawValue::Text(s) => s
                .trim()
                .parse()
                .map(Cell::Float)
                .map_err(|_| format!("'{}' is not numeric", s)),
            other => Err(mismatch(&other, target)),
        },
        SemanticType::Text => match value {
            RawValue::Text(s) => Ok(Cell::Text(s)),
            RawValue::Int(v) => Ok(Cell::Text(v.to_string())),
            RawValue::Float(f) => Ok(Cell::Text(f.to_string())),
            RawValue::Bool(b) => Ok(Cell::Text(b.to_string())),
            RawValue::DateTime(dt) => Ok(Cell::Text(dt.format("%Y-%m-%d %H:%M:%S%.3f").to_string())),
            RawValue::Bytes(bytes) => String::from_utf8(bytes)
                .map(Cell::Text)
                .map_err(|_| "binary value is not valid UTF-8 text".to_string()),
            RawValue::Null => Ok(Cell::Null),
        },
        SemanticType::DateTime => match value {
            RawValue::DateTime(dt) => Ok(Cell::DateTime(dt)),
            RawValue::Text(s) => parse_datetime(&s)
                .map(Cell::DateTime)
                .ok_or_else(|| format!("'{}' is not a datetime", s)),
            other => Err(mismatch(&other, target)),
        },
        SemanticType::Binary => match value {
            RawValue::Bytes(bytes) => Ok(Cell::Binary(bytes)),
            other => Err(mismatch(&other, target)),
        },
        // Execution plans and other XML pass through untouched.
        SemanticType::Xml => match value {
            RawValue::Text(s) => Ok(Cell::Xml(s)),
            RawValue::Bytes(bytes) => String::from_utf8(bytes)
                .map(Cell::Xml)
                .map_err(|_| "xml value is not valid UTF-8".to_string()),
            other => Err(mismatch(&other, target)),
        },
    }
}

fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
}

fn mismatch(value: &RawValue, target: SemanticType) -> String {
    let found = match value {
        RawValue::Null => "null",
        RawValue::Bool(_) => "bool",
        RawValue::Int(_) => "integer",
        RawValue::Float(_) => "float",
        RawValue::Text(_) => "text",
        RawValue::Bytes(_) => "binary",
        RawValue::DateTime(_) => "datetime",
    };
    format!("cannot convert {} value to {}", found, target)
}
