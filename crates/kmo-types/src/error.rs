use std::fmt;

use crate::{OperationId, VersionRequirement};

/// Result type for kmo operations
pub type Result<T> = std::result::Result<T, Error>;

/// Broad class of an execution failure reported by the engine handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionFailureKind {
    /// Connection lost or never established
    Connectivity,
    /// Login lacks the permission needed by the probe
    PermissionDenied,
    /// Engine rejected the text (syntax, missing object, ...)
    Syntax,
    Other,
}

impl fmt::Display for ExecutionFailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionFailureKind::Connectivity => write!(f, "connectivity"),
            ExecutionFailureKind::PermissionDenied => write!(f, "permission denied"),
            ExecutionFailureKind::Syntax => write!(f, "syntax"),
            ExecutionFailureKind::Other => write!(f, "other"),
        }
    }
}

/// Error taxonomy of the diagnostic core
#[derive(Debug)]
pub enum Error {
    /// The operation needs a newer engine than the one detected
    UnsupportedVersion {
        operation: OperationId,
        required: VersionRequirement,
        detected: String,
    },

    /// An option failed validation before any SQL was composed
    InvalidOption {
        operation: OperationId,
        field: &'static str,
        reason: String,
    },

    /// The engine rejected or failed the composed text.
    ///
    /// `sql` is kept for diagnostic logging only and is never part of `Display`.
    ExecutionFailure {
        kind: ExecutionFailureKind,
        message: String,
        sql: String,
    },

    /// Execution exceeded the handle's timeout
    Timeout(String),

    /// Execution was cancelled by the caller or the handle
    Cancelled(String),

    /// A metadata probe returned no rows
    EmptyProbe(OperationId),

    /// A raw cell could not be converted to its declared semantic type
    Normalization {
        column: String,
        row: usize,
        reason: String,
    },

    /// A template slot was left unfilled (composition defect)
    Template(String),
}

impl Error {
    pub fn invalid_option(
        operation: OperationId,
        field: &'static str,
        reason: impl Into<String>,
    ) -> Self {
        Error::InvalidOption {
            operation,
            field,
            reason: reason.into(),
        }
    }

    /// Full SQL text of a failed execution, for logs only.
    pub fn diagnostic_sql(&self) -> Option<&str> {
        match self {
            Error::ExecutionFailure { sql, .. } => Some(sql),
            _ => None,
        }
    }

    /// Composition errors happen before any I/O and are fixed by adjusting options.
    pub fn is_composition_error(&self) -> bool {
        matches!(
            self,
            Error::UnsupportedVersion { .. } | Error::InvalidOption { .. } | Error::Template(_)
        )
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::UnsupportedVersion {
                operation,
                required,
                detected,
            } => write!(
                f,
                "Unsupported version: '{}' requires {} or later (detected {})",
                operation, required, detected
            ),
            Error::InvalidOption {
                operation,
                field,
                reason,
            } => write!(f, "Invalid option '{}' for '{}': {}", field, operation, reason),
            Error::ExecutionFailure { kind, message, .. } => {
                write!(f, "Execution failed ({}): {}", kind, message)
            }
            Error::Timeout(msg) => write!(f, "Execution timed out: {}", msg),
            Error::Cancelled(msg) => write!(f, "Execution cancelled: {}", msg),
            Error::EmptyProbe(operation) => write!(f, "Probe '{}' returned no rows", operation),
            Error::Normalization {
                column,
                row,
                reason,
            } => write!(
                f,
                "Cannot normalize column '{}' at row {}: {}",
                column, row, reason
            ),
            Error::Template(msg) => write!(f, "Template error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_execution_failure_hides_sql() {
        let err = Error::ExecutionFailure {
            kind: ExecutionFailureKind::Syntax,
            message: "Incorrect syntax near 'FROM'".to_string(),
            sql: "SELECT secret_column FROM sys.dm_os_sys_info".to_string(),
        };

        let msg = err.to_string();
        assert!(msg.contains("Incorrect syntax near 'FROM'"));
        assert!(!msg.contains("secret_column"));
        assert_eq!(
            err.diagnostic_sql(),
            Some("SELECT secret_column FROM sys.dm_os_sys_info")
        );
    }

    #[test]
    fn test_unsupported_version_message() {
        let err = Error::UnsupportedVersion {
            operation: OperationId::TopProcedures,
            required: VersionRequirement::new(10, 0),
            detected: "9.0".to_string(),
        };

        assert_eq!(
            err.to_string(),
            "Unsupported version: 'top_procedures' requires 10.0 or later (detected 9.0)"
        );
        assert!(err.is_composition_error());
    }

    #[test]
    fn test_timeout_is_not_composition_error() {
        let err = Error::Timeout("query exceeded 30s".to_string());
        assert!(!err.is_composition_error());
        assert!(err.diagnostic_sql().is_none());
    }
}
