use chrono::NaiveDateTime;
use kmo_types::{Parameter, RawVersion};
use std::fmt;
use std::sync::Arc;

/// Broad class of a handle-level failure.
///
/// Adapters classify their driver's native errors into one of these; the
/// executor turns them into the core taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleErrorKind {
    Connectivity,
    PermissionDenied,
    Syntax,
    Timeout,
    Cancelled,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandleError {
    pub kind: HandleErrorKind,
    /// Engine's raw message, passed through verbatim
    pub message: String,
}

impl HandleError {
    pub fn new(kind: HandleErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for HandleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl std::error::Error for HandleError {}

/// Column metadata as reported by the driver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawColumn {
    pub name: String,
    /// Engine type name (`int`, `nvarchar`, `decimal(5,2)`, ...) when the driver exposes it
    pub sql_type: Option<String>,
}

impl RawColumn {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql_type: None,
        }
    }

    pub fn typed(name: impl Into<String>, sql_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql_type: Some(sql_type.into()),
        }
    }
}

/// Driver-native cell value, before normalization
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    DateTime(NaiveDateTime),
}

/// One result set exactly as the handle produced it
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawResult {
    pub columns: Vec<RawColumn>,
    pub rows: Vec<Vec<RawValue>>,
}

impl RawResult {
    pub fn new(columns: Vec<RawColumn>, rows: Vec<Vec<RawValue>>) -> Self {
        Self { columns, rows }
    }

    /// Successful execution that produced neither rows nor column metadata
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn first_value(&self) -> Option<&RawValue> {
        self.rows.first().and_then(|row| row.first())
    }
}

/// Open, authenticated connection to one engine instance.
///
/// The diagnostics core never connects, disconnects, or pools; it only sends
/// text through an existing handle. Timeouts and cancellation belong to the
/// implementation and surface as [`HandleErrorKind::Timeout`] / [`HandleErrorKind::Cancelled`].
pub trait EngineHandle: Send + Sync {
    /// Execute `sql` with `parameters` bound by name, returning the final result set.
    fn execute_text(
        &self,
        sql: &str,
        parameters: &[Parameter],
    ) -> Result<RawResult, HandleError>;

    /// Major/minor numbers plus product level, edition and full version string.
    fn raw_version_identifiers(&self) -> Result<RawVersion, HandleError>;
}

impl<T: EngineHandle + ?Sized> EngineHandle for &T {
    fn execute_text(
        &self,
        sql: &str,
        parameters: &[Parameter],
    ) -> Result<RawResult, HandleError> {
        (**self).execute_text(sql, parameters)
    }

    fn raw_version_identifiers(&self) -> Result<RawVersion, HandleError> {
        (**self).raw_version_identifiers()
    }
}

impl<T: EngineHandle + ?Sized> EngineHandle for Arc<T> {
    fn execute_text(
        &self,
        sql: &str,
        parameters: &[Parameter],
    ) -> Result<RawResult, HandleError> {
        (**self).execute_text(sql, parameters)
    }

    fn raw_version_identifiers(&self) -> Result<RawVersion, HandleError> {
        (**self).raw_version_identifiers()
    }
}

impl<T: EngineHandle + ?Sized> EngineHandle for Box<T> {
    fn execute_text(
        &self,
        sql: &str,
        parameters: &[Parameter],
    ) -> Result<RawResult, HandleError> {
        (**self).execute_text(sql, parameters)
    }

    fn raw_version_identifiers(&self) -> Result<RawVersion, HandleError> {
        (**self).raw_version_identifiers()
    }
}
