use crate::args::OptionArgs;
use anyhow::{Context, Result, bail};
use chrono::{NaiveDate, NaiveDateTime};
use kmo_engine::Defaults;
use kmo_types::{OperationId, OperationOptions, WaitStatisticsOptions};

/// Start from the configured defaults for `operation` and apply CLI flags.
pub fn build(operation: OperationId, defaults: &Defaults, args: &OptionArgs) -> Result<OperationOptions> {
    let mut options = defaults.options_for(operation);
    let mut used: Vec<&'static str> = Vec::new();

    match &mut options {
        OperationOptions::None => {}
        OperationOptions::LiveSessions(opts) => {
            opts.include_system_sessions = args.include_system_sessions;
            opts.include_execution_plan = args.include_execution_plan;
            used.extend(["--include-system-sessions", "--include-execution-plan"]);
        }
        OperationOptions::FileMap(opts) => {
            if let Some(min) = args.min_size_mb {
                opts.min_size_mb = min;
            }
            if let Some(max) = args.max_size_mb {
                opts.max_size_mb = max;
            }
            opts.include_data = !args.no_data;
            opts.include_log = !args.no_log;
            used.extend(["--min-size-mb", "--max-size-mb", "--no-data", "--no-log"]);
        }
        OperationOptions::ErrorLog(opts) => {
            opts.start_time = parse_time(args.start_time.as_deref())?;
            opts.end_time = parse_time(args.end_time.as_deref())?;
            if let Some(number) = args.log_file_number {
                opts.log_file_number = number;
            }
            if args.include_informational {
                opts.include_informational_messages = true;
            } else if args.suppress_informational {
                opts.include_informational_messages = false;
            }
            used.extend([
                "--start-time",
                "--end-time",
                "--log-file-number",
                "--include-informational",
                "--suppress-informational",
            ]);
        }
        OperationOptions::FailedLogins(opts) => {
            opts.start_time = parse_time(args.start_time.as_deref())?;
            opts.end_time = parse_time(args.end_time.as_deref())?;
            if let Some(number) = args.log_file_number {
                opts.log_file_number = number;
            }
            used.extend(["--start-time", "--end-time", "--log-file-number"]);
        }
        OperationOptions::WaitStatistics(opts) => {
            if args.no_wait_exclusion {
                *opts = WaitStatisticsOptions::new(Vec::<String>::new());
            } else if !args.exclude_wait_types.is_empty() {
                *opts = WaitStatisticsOptions::new(args.exclude_wait_types.iter().cloned());
            }
            used.extend(["--exclude-wait-type", "--no-wait-exclusion"]);
        }
        OperationOptions::TopProcedures(opts) => {
            if let Some(order_by) = &args.order_by {
                opts.order_by = order_by.parse().map_err(anyhow::Error::msg)?;
            }
            if let Some(limit) = args.row_limit {
                opts.row_limit = limit;
            }
            used.extend(["--order-by", "--row-limit"]);
        }
        OperationOptions::TopQueries(opts) => {
            if let Some(order_by) = &args.order_by {
                opts.order_by = order_by.parse().map_err(anyhow::Error::msg)?;
            }
            if let Some(limit) = args.row_limit {
                opts.row_limit = limit;
            }
            used.extend(["--order-by", "--row-limit"]);
        }
    }

    if let Some(flag) = given_flags(args).into_iter().find(|flag| !used.contains(flag)) {
        bail!("{} does not apply to '{}'", flag, operation);
    }

    Ok(options)
}

fn given_flags(args: &OptionArgs) -> Vec<&'static str> {
    let checks = [
        (args.include_system_sessions, "--include-system-sessions"),
        (args.include_execution_plan, "--include-execution-plan"),
        (args.min_size_mb.is_some(), "--min-size-mb"),
        (args.max_size_mb.is_some(), "--max-size-mb"),
        (args.no_data, "--no-data"),
        (args.no_log, "--no-log"),
        (args.start_time.is_some(), "--start-time"),
        (args.end_time.is_some(), "--end-time"),
        (args.log_file_number.is_some(), "--log-file-number"),
        (args.include_informational, "--include-informational"),
        (args.suppress_informational, "--suppress-informational"),
        (args.order_by.is_some(), "--order-by"),
        (args.row_limit.is_some(), "--row-limit"),
        (!args.exclude_wait_types.is_empty(), "--exclude-wait-type"),
        (args.no_wait_exclusion, "--no-wait-exclusion"),
    ];
    checks
        .into_iter()
        .filter_map(|(given, flag)| given.then_some(flag))
        .collect()
}

fn parse_time(value: Option<&str>) -> Result<Option<NaiveDateTime>> {
    let Some(value) = value else {
        return Ok(None);
    };
    let value = value.trim();

    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(Some(dt));
        }
    }

    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .with_context(|| format!("Invalid time '{}': expected YYYY-MM-DD[ HH:MM:SS]", value))?;
    Ok(date.and_hms_opt(0, 0, 0))
}
