use kmo_engine::catalog;
use kmo_types::{ComposedQuery, Error, ExecutionFailureKind, ResultTable, Result};
use tracing::{debug, warn};

use crate::handle::{EngineHandle, HandleError, HandleErrorKind, RawResult};
use crate::normalize::normalize;

/// Send a composed query through the handle, verbatim, in one round trip.
pub fn execute<H: EngineHandle + ?Sized>(handle: &H, query: &ComposedQuery) -> Result<RawResult> {
    debug!(
        operation = %query.operation,
        parameters = query.parameters.len(),
        sql = %query.text,
        "executing diagnostic query"
    );

    match handle.execute_text(&query.text, &query.parameters) {
        Ok(raw) => {
            debug!(
                operation = %query.operation,
                columns = raw.columns.len(),
                rows = raw.rows.len(),
                "diagnostic query returned"
            );
            Ok(raw)
        }
        Err(err) => {
            warn!(
                operation = %query.operation,
                kind = ?err.kind,
                sql = %query.text,
                "diagnostic query failed: {}",
                err.message
            );
            Err(map_handle_error(err, &query.text))
        }
    }
}

/// Execute and normalize against the operation's declared column schema.
pub fn execute_table<H: EngineHandle + ?Sized>(
    handle: &H,
    query: &ComposedQuery,
) -> Result<ResultTable> {
    let raw = execute(handle, query)?;
    normalize(raw, catalog::get(query.operation))
}

/// Translate a handle failure into the core taxonomy.
///
/// Timeout and cancellation keep their own variants; `sql` is retained for
/// diagnostics only.
pub fn map_handle_error(err: HandleError, sql: &str) -> Error {
    let kind = match err.kind {
        HandleErrorKind::Timeout => return Error::Timeout(err.message),
        HandleErrorKind::Cancelled => return Error::Cancelled(err.message),
        HandleErrorKind::Connectivity => ExecutionFailureKind::Connectivity,
        HandleErrorKind::PermissionDenied => ExecutionFailureKind::PermissionDenied,
        HandleErrorKind::Syntax => ExecutionFailureKind::Syntax,
        HandleErrorKind::Other => ExecutionFailureKind::Other,
    };

    Error::ExecutionFailure {
        kind,
        message: err.message,
        sql: sql.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_and_cancel_stay_distinct() {
        let err = map_handle_error(
            HandleError::new(HandleErrorKind::Timeout, "query timeout expired"),
            "SELECT 1",
        );
        assert!(matches!(err, Error::Timeout(msg) if msg == "query timeout expired"));

        let err = map_handle_error(
            HandleError::new(HandleErrorKind::Cancelled, "operation cancelled"),
            "SELECT 1",
        );
        assert!(matches!(err, Error::Cancelled(_)));
    }

    #[test]
    fn test_execution_failure_hides_sql_from_display() {
        let err = map_handle_error(
            HandleError::new(
                HandleErrorKind::PermissionDenied,
                "VIEW SERVER STATE permission was denied",
            ),
            "SELECT * FROM sys.dm_os_wait_stats",
        );

        let rendered = err.to_string();
        assert!(rendered.contains("VIEW SERVER STATE permission was denied"));
        assert!(!rendered.contains("dm_os_wait_stats"));
        assert_eq!(
            err.diagnostic_sql(),
            Some("SELECT * FROM sys.dm_os_wait_stats")
        );
        assert!(matches!(
            err,
            Error::ExecutionFailure {
                kind: ExecutionFailureKind::PermissionDenied,
                ..
            }
        ));
    }
}
