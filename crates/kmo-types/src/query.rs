use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::OperationId;

/// A value bound to a named parameter, never spliced into the text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum SqlValue {
    Int(i64),
    Text(String),
    DateTime(NaiveDateTime),
}

impl SqlValue {
    /// Declared T-SQL type used when binding
    pub fn sql_type(&self) -> &'static str {
        match self {
            SqlValue::Int(_) => "int",
            SqlValue::Text(_) => "nvarchar(60)",
            SqlValue::DateTime(_) => "datetime",
        }
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Int(v) => write!(f, "{}", v),
            SqlValue::Text(v) => write!(f, "N'{}'", v.replace('\'', "''")),
            SqlValue::DateTime(v) => write!(f, "'{}'", v.format("%Y-%m-%dT%H:%M:%S%.3f")),
        }
    }
}

/// Named parameter declared by a composed query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    /// Name including the leading '@'
    pub name: String,
    pub value: SqlValue,
}

impl Parameter {
    pub fn new(name: impl Into<String>, value: SqlValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    pub fn sql_type(&self) -> &'static str {
        self.value.sql_type()
    }
}

/// Fully resolved SQL text plus its bound parameters, in declaration order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComposedQuery {
    pub operation: OperationId,
    pub text: String,
    pub parameters: Vec<Parameter>,
}

impl ComposedQuery {
    pub fn new(operation: OperationId, text: String, parameters: Vec<Parameter>) -> Self {
        Self {
            operation,
            text,
            parameters,
        }
    }

    pub fn parameter(&self, name: &str) -> Option<&SqlValue> {
        self.parameters
            .iter()
            .find(|p| p.name == name)
            .map(|p| &p.value)
    }

    /// `@name type, ...` as expected by sp_executesql
    pub fn parameter_declarations(&self) -> String {
        self.parameters
            .iter()
            .map(|p| format!("{} {}", p.name, p.sql_type()))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_parameter_declarations() {
        let query = ComposedQuery::new(
            OperationId::ErrorLog,
            "SELECT 1".to_string(),
            vec![
                Parameter::new("@log_file_number", SqlValue::Int(0)),
                Parameter::new(
                    "@start_time",
                    SqlValue::DateTime(
                        NaiveDate::from_ymd_opt(2024, 1, 2)
                            .unwrap()
                            .and_hms_opt(3, 4, 5)
                            .unwrap(),
                    ),
                ),
            ],
        );

        assert_eq!(
            query.parameter_declarations(),
            "@log_file_number int, @start_time datetime"
        );
        assert_eq!(query.parameter("@log_file_number"), Some(&SqlValue::Int(0)));
        assert!(query.parameter("@end_time").is_none());
    }

    #[test]
    fn test_text_width_fits_longest_wait_type() {
        let value = SqlValue::Text(String::new());
        assert_eq!(
            value.sql_type(),
            format!("nvarchar({})", crate::MAX_WAIT_TYPE_LEN)
        );
    }

    #[test]
    fn test_text_value_display_is_quoted() {
        let value = SqlValue::Text("O'BRIEN".to_string());
        assert_eq!(value.to_string(), "N'O''BRIEN'");
    }
}
