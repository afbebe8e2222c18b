//! Query composer: operation + options + capabilities → executable text.
//!
//! Pure and deterministic. Capability gating and option validation happen
//! before any text is assembled.

use kmo_types::{
    Capability, CapabilitySet, ComposedQuery, Error, ErrorLogOptions, FailedLoginOptions,
    FileMapOptions, LiveSessionOptions, OperationId, OperationOptions, Parameter, Result,
    SortColumn, SqlValue, TopNOptions, WaitStatisticsOptions,
};

use crate::catalog::{self, DiagnosticOperation};
use crate::fragments::{self, Fragment};
use crate::template::Template;
use crate::templates;

/// Compose the SQL text and bound parameters for `operation`.
pub fn compose(
    operation: OperationId,
    options: &OperationOptions,
    capabilities: &CapabilitySet,
) -> Result<ComposedQuery> {
    let entry = catalog::get(operation);
    check_capability(entry, capabilities)?;

    if options.schema() != entry.option_schema {
        return Err(Error::invalid_option(
            operation,
            "options",
            format!(
                "expected {:?} options, got {:?}",
                entry.option_schema,
                options.schema()
            ),
        ));
    }
    options.validate(operation)?;

    match options {
        OperationOptions::None => match operation {
            OperationId::FreeDiskSpace => free_disk_space(capabilities),
            _ => static_query(entry),
        },
        OperationOptions::LiveSessions(opts) => live_sessions(opts),
        OperationOptions::FileMap(opts) => file_map(opts),
        OperationOptions::ErrorLog(opts) => error_log(opts),
        OperationOptions::FailedLogins(opts) => failed_logins(opts),
        OperationOptions::WaitStatistics(opts) => wait_statistics(opts),
        OperationOptions::TopProcedures(opts) => {
            top_n(OperationId::TopProcedures, &templates::TOP_PROCEDURES, opts)
        }
        OperationOptions::TopQueries(opts) => {
            top_n(OperationId::TopQueries, &templates::TOP_QUERIES, opts)
        }
    }
}

/// Compose with the catalog's built-in default options.
pub fn compose_default(
    operation: OperationId,
    capabilities: &CapabilitySet,
) -> Result<ComposedQuery> {
    compose(operation, &catalog::default_options(operation), capabilities)
}

/// Probe for the 'Ole Automation Procedures' run value (free disk space variant).
pub fn compose_ole_automation_probe() -> Result<ComposedQuery> {
    let text = templates::OLE_AUTOMATION_PROBE.render(&[])?;
    Ok(ComposedQuery::new(
        OperationId::FreeDiskSpace,
        text,
        Vec::new(),
    ))
}

fn check_capability(entry: &DiagnosticOperation, capabilities: &CapabilitySet) -> Result<()> {
    let Some(capability) = entry.required_capability else {
        return Ok(());
    };
    if capabilities.supports(capability) {
        return Ok(());
    }

    Err(Error::UnsupportedVersion {
        operation: entry.id,
        required: capability
            .min_version()
            .unwrap_or_else(|| capabilities.detected()),
        detected: capabilities.detected().to_string(),
    })
}

/// `[name]` with closing brackets escaped
pub fn quote_identifier(name: &str) -> String {
    format!("[{}]", name.replace(']', "]]"))
}

fn pick(condition: bool, when_true: Fragment, when_false: Fragment) -> &'static str {
    if condition {
        when_true.text
    } else {
        when_false.text
    }
}

fn static_query(entry: &DiagnosticOperation) -> Result<ComposedQuery> {
    let template = templates::get(entry.template_id).ok_or_else(|| {
        Error::Template(format!(
            "operation '{}' refers to unknown template '{}'",
            entry.id, entry.template_id
        ))
    })?;
    Ok(ComposedQuery::new(entry.id, template.render(&[])?, Vec::new()))
}

fn free_disk_space(capabilities: &CapabilitySet) -> Result<ComposedQuery> {
    let template = if capabilities.supports(Capability::OleAutomation) {
        &templates::FREE_DISK_SPACE_OLE
    } else {
        &templates::FREE_DISK_SPACE
    };
    Ok(ComposedQuery::new(
        OperationId::FreeDiskSpace,
        template.render(&[])?,
        Vec::new(),
    ))
}

fn live_sessions(opts: &LiveSessionOptions) -> Result<ComposedQuery> {
    let text = templates::LIVE_SESSIONS.render(&[
        (
            "plan_projection",
            pick(
                opts.include_execution_plan,
                fragments::PLAN_PROJECTION,
                fragments::NO_PLAN_PROJECTION,
            ),
        ),
        (
            "plan_join",
            pick(
                opts.include_execution_plan,
                fragments::PLAN_JOIN,
                fragments::EMPTY,
            ),
        ),
        (
            "session_filter",
            pick(
                opts.include_system_sessions,
                fragments::EMPTY,
                fragments::USER_SESSIONS_ONLY,
            ),
        ),
    ])?;
    Ok(ComposedQuery::new(OperationId::LiveSessions, text, Vec::new()))
}

fn file_map(opts: &FileMapOptions) -> Result<ComposedQuery> {
    let mut filters = Vec::new();
    if !opts.include_data {
        filters.push(fragments::EXCLUDE_DATA_FILES.text);
    }
    if !opts.include_log {
        filters.push(fragments::EXCLUDE_LOG_FILES.text);
    }
    let filter = filters.join(" ");

    let text = templates::FILE_MAP.render(&[("file_type_filter", filter.as_str())])?;
    Ok(ComposedQuery::new(
        OperationId::FileMap,
        text,
        vec![
            Parameter::new("@min_size_mb", SqlValue::Int(opts.min_size_mb)),
            Parameter::new("@max_size_mb", SqlValue::Int(opts.max_size_mb)),
        ],
    ))
}

fn wait_statistics(opts: &WaitStatisticsOptions) -> Result<ComposedQuery> {
    let wait_types = opts.normalized_wait_types(OperationId::WaitStatistics)?;

    let parameters: Vec<Parameter> = wait_types
        .into_iter()
        .enumerate()
        .map(|(i, wait_type)| Parameter::new(format!("@wait_type_{}", i), SqlValue::Text(wait_type)))
        .collect();

    let filter = if parameters.is_empty() {
        String::new()
    } else {
        let placeholders: Vec<&str> = parameters.iter().map(|p| p.name.as_str()).collect();
        format!(
            "{}{})",
            fragments::WAIT_TYPE_EXCLUSION.text,
            placeholders.join(", ")
        )
    };

    let text = templates::WAIT_STATISTICS.render(&[("wait_type_filter", filter.as_str())])?;
    Ok(ComposedQuery::new(
        OperationId::WaitStatistics,
        text,
        parameters,
    ))
}

/// Parameters shared by both error log readers, in declaration order.
fn log_parameters(
    log_file_number: i32,
    start: Option<chrono::NaiveDateTime>,
    end: Option<chrono::NaiveDateTime>,
) -> Vec<Parameter> {
    let mut parameters = vec![Parameter::new(
        "@log_file_number",
        SqlValue::Int(i64::from(log_file_number)),
    )];
    if let Some(start) = start {
        parameters.push(Parameter::new("@start_time", SqlValue::DateTime(start)));
    }
    if let Some(end) = end {
        parameters.push(Parameter::new("@end_time", SqlValue::DateTime(end)));
    }
    parameters
}

fn error_log(opts: &ErrorLogOptions) -> Result<ComposedQuery> {
    let text = templates::ERROR_LOG.render(&[
        (
            "start_bound",
            pick(
                opts.start_time.is_some(),
                fragments::ERROR_LOG_START_BOUND,
                fragments::EMPTY,
            ),
        ),
        (
            "end_bound",
            pick(
                opts.end_time.is_some(),
                fragments::ERROR_LOG_END_BOUND,
                fragments::EMPTY,
            ),
        ),
        (
            "informational_filter",
            pick(
                opts.include_informational_messages,
                fragments::EMPTY,
                fragments::INFORMATIONAL_SUPPRESSION,
            ),
        ),
    ])?;

    Ok(ComposedQuery::new(
        OperationId::ErrorLog,
        text,
        log_parameters(opts.log_file_number, opts.start_time, opts.end_time),
    ))
}

fn failed_logins(opts: &FailedLoginOptions) -> Result<ComposedQuery> {
    let text = templates::FAILED_LOGINS.render(&[
        (
            "start_bound",
            pick(
                opts.start_time.is_some(),
                fragments::FAILED_LOGIN_START_BOUND,
                fragments::EMPTY,
            ),
        ),
        (
            "end_bound",
            pick(
                opts.end_time.is_some(),
                fragments::FAILED_LOGIN_END_BOUND,
                fragments::EMPTY,
            ),
        ),
    ])?;

    Ok(ComposedQuery::new(
        OperationId::FailedLogins,
        text,
        log_parameters(opts.log_file_number, opts.start_time, opts.end_time),
    ))
}

fn top_n<S: SortColumn>(
    operation: OperationId,
    template: &Template,
    opts: &TopNOptions<S>,
) -> Result<ComposedQuery> {
    // The sort column comes from a closed enum, never from caller text.
    let order_by = quote_identifier(opts.order_by.column_name());
    let text = template.render(&[("order_by", order_by.as_str())])?;
    Ok(ComposedQuery::new(
        operation,
        text,
        vec![Parameter::new(
            "@row_limit",
            SqlValue::Int(i64::from(opts.row_limit)),
        )],
    ))
}
