use chrono::NaiveDateTime;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

static DECIMAL_TYPE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:decimal|numeric)\s*(?:\(\s*(\d+)\s*(?:,\s*(\d+)\s*)?\))?$").unwrap()
});

/// Semantic type of a result column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SemanticType {
    Integer,
    Float,
    /// Exact numeric; renderers should keep `scale` digits
    Decimal { precision: u8, scale: u8 },
    Text,
    DateTime,
    Binary,
    Xml,
}

impl SemanticType {
    /// Map an engine type name (`int`, `decimal(5,2)`, `nvarchar(128)`, ...).
    pub fn from_sql_type(name: &str) -> Self {
        let lowered = name.trim().to_ascii_lowercase();

        if let Some(caps) = DECIMAL_TYPE_REGEX.captures(&lowered) {
            let precision = caps
                .get(1)
                .and_then(|m| m.as_str().parse().ok())
                .unwrap_or(18);
            let scale = caps
                .get(2)
                .and_then(|m| m.as_str().parse().ok())
                .unwrap_or(0);
            return SemanticType::Decimal { precision, scale };
        }

        let base = lowered.split('(').next().unwrap_or("").trim();
        match base {
            "bigint" | "int" | "smallint" | "tinyint" | "bit" => SemanticType::Integer,
            "float" | "real" | "money" | "smallmoney" => SemanticType::Float,
            "date" | "datetime" | "datetime2" | "smalldatetime" | "datetimeoffset" => {
                SemanticType::DateTime
            }
            "xml" => SemanticType::Xml,
            "binary" | "varbinary" | "image" | "timestamp" | "rowversion" => SemanticType::Binary,
            _ => SemanticType::Text,
        }
    }
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SemanticType::Integer => write!(f, "integer"),
            SemanticType::Float => write!(f, "float"),
            SemanticType::Decimal { precision, scale } => {
                write!(f, "decimal({},{})", precision, scale)
            }
            SemanticType::Text => write!(f, "text"),
            SemanticType::DateTime => write!(f, "datetime"),
            SemanticType::Binary => write!(f, "binary"),
            SemanticType::Xml => write!(f, "xml"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub semantic_type: SemanticType,
}

impl Column {
    pub fn new(name: impl Into<String>, semantic_type: SemanticType) -> Self {
        Self {
            name: name.into(),
            semantic_type,
        }
    }
}

/// A typed cell value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Cell {
    Null,
    Integer(i64),
    Float(f64),
    Text(String),
    DateTime(NaiveDateTime),
    Binary(Vec<u8>),
    Xml(String),
}

impl Cell {
    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Cell::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Float(v) => Some(*v),
            Cell::Integer(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Cell::Text(v) | Cell::Xml(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            Cell::DateTime(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Null => write!(f, "NULL"),
            Cell::Integer(v) => write!(f, "{}", v),
            Cell::Float(v) => write!(f, "{}", v),
            Cell::Text(v) | Cell::Xml(v) => write!(f, "{}", v),
            Cell::DateTime(v) => write!(f, "{}", v.format("%Y-%m-%d %H:%M:%S%.3f")),
            Cell::Binary(v) => write!(f, "<{} bytes>", v.len()),
        }
    }
}

pub type Row = Vec<Cell>;

/// Ordered columns and rows, in exactly the order the engine produced them
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ResultTable {
    columns: Vec<Column>,
    rows: Vec<Row>,
}

impl ResultTable {
    pub fn new(columns: Vec<Column>, rows: Vec<Row>) -> Self {
        Self { columns, rows }
    }

    pub fn empty(columns: Vec<Column>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Position of a column; names are matched case-insensitively like the engine does.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(name))
    }

    pub fn value(&self, row: usize, column: &str) -> Option<&Cell> {
        let index = self.column_index(column)?;
        self.rows.get(row).and_then(|r| r.get(index))
    }
}
