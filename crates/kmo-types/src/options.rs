//! Per-operation option schemas.
//!
//! Every option struct validates itself before composition. Identifier-like
//! options (sort columns, wait types) are restricted to allow-lists here, so the
//! composer never sees free-form SQL text.

use chrono::NaiveDateTime;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use crate::{Error, OperationId, Result};

static WAIT_TYPE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z0-9_]+$").unwrap());

/// Width of the `nvarchar` a wait type is bound as; longer names would be truncated
pub const MAX_WAIT_TYPE_LEN: usize = 60;

/// Largest file size accepted by the file map filter (MB)
pub const MAX_FILE_SIZE_MB: i64 = 2_147_483_647;
/// Highest archive number kept by the error log
pub const MAX_LOG_FILE_NUMBER: i32 = 99;
pub const MAX_ROW_LIMIT: u32 = 10_000;
pub const DEFAULT_ROW_LIMIT: u32 = 50;

/// Options of the live sessions probe
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiveSessionOptions {
    /// Keep background/system sessions (is_user_process = 0)
    pub include_system_sessions: bool,
    /// Join the cached plan of each request (XML, expensive)
    pub include_execution_plan: bool,
}

/// Options of the database file map
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileMapOptions {
    pub min_size_mb: i64,
    pub max_size_mb: i64,
    pub include_data: bool,
    pub include_log: bool,
}

impl Default for FileMapOptions {
    fn default() -> Self {
        Self {
            min_size_mb: 0,
            max_size_mb: MAX_FILE_SIZE_MB,
            include_data: true,
            include_log: true,
        }
    }
}

impl FileMapOptions {
    pub fn validate(&self, operation: OperationId) -> Result<()> {
        if self.min_size_mb < 0 {
            return Err(Error::invalid_option(
                operation,
                "min_size_mb",
                format!("must be >= 0, got {}", self.min_size_mb),
            ));
        }
        if self.max_size_mb > MAX_FILE_SIZE_MB {
            return Err(Error::invalid_option(
                operation,
                "max_size_mb",
                format!("must be <= {}, got {}", MAX_FILE_SIZE_MB, self.max_size_mb),
            ));
        }
        if self.min_size_mb > self.max_size_mb {
            return Err(Error::invalid_option(
                operation,
                "max_size_mb",
                format!(
                    "must be >= min_size_mb ({} > {})",
                    self.min_size_mb, self.max_size_mb
                ),
            ));
        }
        if !self.include_data && !self.include_log {
            return Err(Error::invalid_option(
                operation,
                "include_data",
                "at least one of include_data or include_log must be set",
            ));
        }
        Ok(())
    }
}

/// Options of the error log reader
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ErrorLogOptions {
    pub start_time: Option<NaiveDateTime>,
    pub end_time: Option<NaiveDateTime>,
    /// 0 is the current log, 1..=99 are archives
    pub log_file_number: i32,
    pub include_informational_messages: bool,
}

impl ErrorLogOptions {
    pub fn validate(&self, operation: OperationId) -> Result<()> {
        validate_log_window(
            operation,
            self.start_time,
            self.end_time,
            self.log_file_number,
        )
    }
}

/// Options of the failed logins reader
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FailedLoginOptions {
    pub start_time: Option<NaiveDateTime>,
    pub end_time: Option<NaiveDateTime>,
    pub log_file_number: i32,
}

impl FailedLoginOptions {
    pub fn validate(&self, operation: OperationId) -> Result<()> {
        validate_log_window(
            operation,
            self.start_time,
            self.end_time,
            self.log_file_number,
        )
    }
}

fn validate_log_window(
    operation: OperationId,
    start: Option<NaiveDateTime>,
    end: Option<NaiveDateTime>,
    log_file_number: i32,
) -> Result<()> {
    if !(0..=MAX_LOG_FILE_NUMBER).contains(&log_file_number) {
        return Err(Error::invalid_option(
            operation,
            "log_file_number",
            format!(
                "must be between 0 and {}, got {}",
                MAX_LOG_FILE_NUMBER, log_file_number
            ),
        ));
    }
    if let (Some(start), Some(end)) = (start, end)
        && start > end
    {
        return Err(Error::invalid_option(
            operation,
            "start_time",
            format!("start_time {} is after end_time {}", start, end),
        ));
    }
    Ok(())
}

/// Options of the wait statistics probe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitStatisticsOptions {
    /// Wait types removed before ranking; empty means no exclusion clause
    pub excluded_wait_types: Vec<String>,
}

impl WaitStatisticsOptions {
    pub fn new<I, S>(excluded: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            excluded_wait_types: excluded.into_iter().map(Into::into).collect(),
        }
    }

    /// Upper-cased, validated, de-duplicated exclusion list (first occurrence wins).
    pub fn normalized_wait_types(&self, operation: OperationId) -> Result<Vec<String>> {
        let mut normalized: Vec<String> = Vec::with_capacity(self.excluded_wait_types.len());
        for raw in &self.excluded_wait_types {
            let wait_type = normalize_wait_type(raw).map_err(|reason| {
                Error::invalid_option(operation, "excluded_wait_types", reason)
            })?;
            if !normalized.contains(&wait_type) {
                normalized.push(wait_type);
            }
        }
        Ok(normalized)
    }
}

/// Validate a single wait type name against `^[A-Z0-9_]+$` after upper-casing,
/// at most [`MAX_WAIT_TYPE_LEN`] characters.
pub fn normalize_wait_type(raw: &str) -> std::result::Result<String, String> {
    let candidate = raw.trim().to_ascii_uppercase();
    if !WAIT_TYPE_REGEX.is_match(&candidate) {
        return Err(format!("'{}' is not a valid wait type name", raw));
    }
    if candidate.len() > MAX_WAIT_TYPE_LEN {
        return Err(format!(
            "'{}' is longer than {} characters",
            raw, MAX_WAIT_TYPE_LEN
        ));
    }
    Ok(candidate)
}

/// A result column that a top-N ranking may be ordered by
pub trait SortColumn: Copy + Sized + 'static {
    const ALL: &'static [Self];

    /// Column alias as it appears in the result set
    fn column_name(self) -> &'static str;
}

fn sort_key(s: &str) -> String {
    s.trim()
        .to_ascii_lowercase()
        .replace(['_', '-'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parse from a display name ("Execution Count") or snake case (`execution_count`).
pub fn parse_sort_column<S: SortColumn>(s: &str) -> std::result::Result<S, String> {
    let key = sort_key(s);
    S::ALL
        .iter()
        .copied()
        .find(|col| sort_key(col.column_name()) == key)
        .ok_or_else(|| {
            let allowed: Vec<&str> = S::ALL.iter().map(|col| col.column_name()).collect();
            format!(
                "'{}' is not a sortable column (allowed: {})",
                s,
                allowed.join(", ")
            )
        })
}

/// Sortable columns of the top procedures ranking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcedureSortColumn {
    #[default]
    ExecutionCount,
    AverageCpu,
    AverageElapsedTime,
    AverageLogicalReads,
    AverageLogicalWrites,
    AveragePhysicalReads,
    CachedTime,
    LastExecutionTime,
}

impl SortColumn for ProcedureSortColumn {
    const ALL: &'static [Self] = &[
        ProcedureSortColumn::ExecutionCount,
        ProcedureSortColumn::AverageCpu,
        ProcedureSortColumn::AverageElapsedTime,
        ProcedureSortColumn::AverageLogicalReads,
        ProcedureSortColumn::AverageLogicalWrites,
        ProcedureSortColumn::AveragePhysicalReads,
        ProcedureSortColumn::CachedTime,
        ProcedureSortColumn::LastExecutionTime,
    ];

    fn column_name(self) -> &'static str {
        match self {
            ProcedureSortColumn::ExecutionCount => "Execution Count",
            ProcedureSortColumn::AverageCpu => "Average CPU",
            ProcedureSortColumn::AverageElapsedTime => "Average Elapsed Time",
            ProcedureSortColumn::AverageLogicalReads => "Average Logical Reads",
            ProcedureSortColumn::AverageLogicalWrites => "Average Logical Writes",
            ProcedureSortColumn::AveragePhysicalReads => "Average Physical Reads",
            ProcedureSortColumn::CachedTime => "Cached Time",
            ProcedureSortColumn::LastExecutionTime => "Last Execution Time",
        }
    }
}

impl FromStr for ProcedureSortColumn {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        parse_sort_column(s)
    }
}

impl fmt::Display for ProcedureSortColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

/// Sortable columns of the top queries ranking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuerySortColumn {
    #[default]
    ExecutionCount,
    AverageWorkerTime,
    AveragePhysicalReads,
    AverageLogicalReads,
    AverageLogicalWrites,
    AverageElapsedTime,
}

impl SortColumn for QuerySortColumn {
    const ALL: &'static [Self] = &[
        QuerySortColumn::ExecutionCount,
        QuerySortColumn::AverageWorkerTime,
        QuerySortColumn::AveragePhysicalReads,
        QuerySortColumn::AverageLogicalReads,
        QuerySortColumn::AverageLogicalWrites,
        QuerySortColumn::AverageElapsedTime,
    ];

    fn column_name(self) -> &'static str {
        match self {
            QuerySortColumn::ExecutionCount => "Execution Count",
            QuerySortColumn::AverageWorkerTime => "Average Worker Time",
            QuerySortColumn::AveragePhysicalReads => "Average Physical Reads",
            QuerySortColumn::AverageLogicalReads => "Average Logical Reads",
            QuerySortColumn::AverageLogicalWrites => "Average Logical Writes",
            QuerySortColumn::AverageElapsedTime => "Average Elapsed Time",
        }
    }
}

impl FromStr for QuerySortColumn {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        parse_sort_column(s)
    }
}

impl fmt::Display for QuerySortColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

/// Options of a top-N ranking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopNOptions<S> {
    pub order_by: S,
    pub row_limit: u32,
}

impl<S: SortColumn + Default> Default for TopNOptions<S> {
    fn default() -> Self {
        Self {
            order_by: S::default(),
            row_limit: DEFAULT_ROW_LIMIT,
        }
    }
}

impl<S: SortColumn> TopNOptions<S> {
    pub fn validate(&self, operation: OperationId) -> Result<()> {
        if self.row_limit == 0 || self.row_limit > MAX_ROW_LIMIT {
            return Err(Error::invalid_option(
                operation,
                "row_limit",
                format!("must be between 1 and {}, got {}", MAX_ROW_LIMIT, self.row_limit),
            ));
        }
        Ok(())
    }
}

pub type TopProceduresOptions = TopNOptions<ProcedureSortColumn>;
pub type TopQueriesOptions = TopNOptions<QuerySortColumn>;

/// Which option record an operation accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionSchema {
    None,
    LiveSessions,
    FileMap,
    ErrorLog,
    FailedLogins,
    WaitStatistics,
    TopProcedures,
    TopQueries,
}

impl OptionSchema {
    /// Allowed option fields
    pub const fn fields(self) -> &'static [&'static str] {
        match self {
            OptionSchema::None => &[],
            OptionSchema::LiveSessions => &["include_system_sessions", "include_execution_plan"],
            OptionSchema::FileMap => &["min_size_mb", "max_size_mb", "include_data", "include_log"],
            OptionSchema::ErrorLog => &[
                "start_time",
                "end_time",
                "log_file_number",
                "include_informational_messages",
            ],
            OptionSchema::FailedLogins => &["start_time", "end_time", "log_file_number"],
            OptionSchema::WaitStatistics => &["excluded_wait_types"],
            OptionSchema::TopProcedures | OptionSchema::TopQueries => &["order_by", "row_limit"],
        }
    }
}

/// Options for one call, tagged by schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "schema", rename_all = "snake_case")]
pub enum OperationOptions {
    None,
    LiveSessions(LiveSessionOptions),
    FileMap(FileMapOptions),
    ErrorLog(ErrorLogOptions),
    FailedLogins(FailedLoginOptions),
    WaitStatistics(WaitStatisticsOptions),
    TopProcedures(TopProceduresOptions),
    TopQueries(TopQueriesOptions),
}

impl OperationOptions {
    pub fn schema(&self) -> OptionSchema {
        match self {
            OperationOptions::None => OptionSchema::None,
            OperationOptions::LiveSessions(_) => OptionSchema::LiveSessions,
            OperationOptions::FileMap(_) => OptionSchema::FileMap,
            OperationOptions::ErrorLog(_) => OptionSchema::ErrorLog,
            OperationOptions::FailedLogins(_) => OptionSchema::FailedLogins,
            OperationOptions::WaitStatistics(_) => OptionSchema::WaitStatistics,
            OperationOptions::TopProcedures(_) => OptionSchema::TopProcedures,
            OperationOptions::TopQueries(_) => OptionSchema::TopQueries,
        }
    }

    /// Field-level validation; the schema/operation match is checked by the composer.
    pub fn validate(&self, operation: OperationId) -> Result<()> {
        match self {
            OperationOptions::None | OperationOptions::LiveSessions(_) => Ok(()),
            OperationOptions::FileMap(opts) => opts.validate(operation),
            OperationOptions::ErrorLog(opts) => opts.validate(operation),
            OperationOptions::FailedLogins(opts) => opts.validate(operation),
            OperationOptions::WaitStatistics(opts) => {
                opts.normalized_wait_types(operation).map(|_| ())
            }
            OperationOptions::TopProcedures(opts) => opts.validate(operation),
            OperationOptions::TopQueries(opts) => opts.validate(operation),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_file_map_defaults_are_valid() {
        let opts = FileMapOptions::default();
        assert_eq!(opts.max_size_mb, 2_147_483_647);
        assert!(opts.validate(OperationId::FileMap).is_ok());
    }

    #[test]
    fn test_file_map_rejects_no_file_types() {
        let opts = FileMapOptions {
            include_data: false,
            include_log: false,
            ..Default::default()
        };
        let err = opts.validate(OperationId::FileMap).unwrap_err();
        assert!(matches!(err, Error::InvalidOption { field: "include_data", .. }));
    }

    #[test]
    fn test_file_map_rejects_inverted_range() {
        let opts = FileMapOptions {
            min_size_mb: 500,
            max_size_mb: 100,
            ..Default::default()
        };
        assert!(opts.validate(OperationId::FileMap).is_err());
    }

    #[test]
    fn test_log_window_validation() {
        let opts = ErrorLogOptions {
            start_time: Some(at(10)),
            end_time: Some(at(9)),
            ..Default::default()
        };
        assert!(opts.validate(OperationId::ErrorLog).is_err());

        let opts = FailedLoginOptions {
            log_file_number: 100,
            ..Default::default()
        };
        let err = opts.validate(OperationId::FailedLogins).unwrap_err();
        assert!(matches!(err, Error::InvalidOption { field: "log_file_number", .. }));

        let opts = ErrorLogOptions {
            start_time: Some(at(9)),
            end_time: Some(at(9)),
            log_file_number: 6,
            ..Default::default()
        };
        assert!(opts.validate(OperationId::ErrorLog).is_ok());
    }

    #[test]
    fn test_sort_column_parsing() {
        assert_eq!(
            "Execution Count".parse::<ProcedureSortColumn>(),
            Ok(ProcedureSortColumn::ExecutionCount)
        );
        assert_eq!(
            "average_cpu".parse::<ProcedureSortColumn>(),
            Ok(ProcedureSortColumn::AverageCpu)
        );
        assert_eq!(
            "  average-worker-time ".parse::<QuerySortColumn>(),
            Ok(QuerySortColumn::AverageWorkerTime)
        );
    }

    #[test]
    fn test_sort_column_rejects_sql_fragments() {
        let err = "execution_count; DROP TABLE x"
            .parse::<QuerySortColumn>()
            .unwrap_err();
        assert!(err.contains("not a sortable column"));
        assert!("[Execution Count]".parse::<QuerySortColumn>().is_err());
        // Procedure-only column is not allowed for queries
        assert!("Average CPU".parse::<QuerySortColumn>().is_err());
    }

    #[test]
    fn test_row_limit_bounds() {
        let mut opts = TopQueriesOptions::default();
        assert_eq!(opts.row_limit, 50);
        assert!(opts.validate(OperationId::TopQueries).is_ok());

        opts.row_limit = 0;
        assert!(opts.validate(OperationId::TopQueries).is_err());

        opts.row_limit = MAX_ROW_LIMIT + 1;
        assert!(opts.validate(OperationId::TopQueries).is_err());
    }

    #[test]
    fn test_wait_types_are_normalized_and_deduplicated() {
        let opts = WaitStatisticsOptions::new(["sleep_task", "WAITFOR", "SLEEP_TASK"]);
        let normalized = opts
            .normalized_wait_types(OperationId::WaitStatistics)
            .unwrap();
        assert_eq!(normalized, vec!["SLEEP_TASK", "WAITFOR"]);
    }

    #[test]
    fn test_wait_types_reject_quotes() {
        let opts = WaitStatisticsOptions::new(["WAITFOR', 'X"]);
        let err = opts
            .normalized_wait_types(OperationId::WaitStatistics)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidOption {
                field: "excluded_wait_types",
                ..
            }
        ));
    }

    #[test]
    fn test_options_serialize_with_schema_tag() {
        let opts = OperationOptions::LiveSessions(LiveSessionOptions {
            include_system_sessions: true,
            include_execution_plan: false,
        });
        let json = serde_json::to_value(&opts).unwrap();
        assert_eq!(json["schema"], "live_sessions");
        assert_eq!(json["include_system_sessions"], true);
        assert_eq!(opts.schema(), OptionSchema::LiveSessions);
    }
}
