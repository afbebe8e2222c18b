use crate::handlers::print_json;
use crate::types::OutputFormat;
use anyhow::{Result, bail};
use kmo_runtime::Config;
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct EffectiveDefaults<'a> {
    config_path: String,
    config_found: bool,
    excluded_wait_types: &'a [String],
    top_procedures: TopN,
    top_queries: TopN,
    error_log_include_informational: bool,
    error_log_file_number: i32,
    failed_logins_file_number: i32,
}

#[derive(Serialize)]
struct TopN {
    order_by: String,
    row_limit: u32,
}

pub fn show(config_path: &Path, format: OutputFormat) -> Result<()> {
    let config = Config::load_from(config_path)?;
    let defaults = config.defaults()?;

    let view = EffectiveDefaults {
        config_path: config_path.display().to_string(),
        config_found: config_path.exists(),
        excluded_wait_types: &defaults.wait_statistics.excluded_wait_types,
        top_procedures: TopN {
            order_by: defaults.top_procedures.order_by.to_string(),
            row_limit: defaults.top_procedures.row_limit,
        },
        top_queries: TopN {
            order_by: defaults.top_queries.order_by.to_string(),
            row_limit: defaults.top_queries.row_limit,
        },
        error_log_include_informational: defaults.error_log.include_informational_messages,
        error_log_file_number: defaults.error_log.log_file_number,
        failed_logins_file_number: defaults.failed_logins.log_file_number,
    };

    match format {
        OutputFormat::Json => print_json(&view),
        OutputFormat::Plain => {
            let source = if view.config_found { "" } else { " (not found, built-in defaults)" };
            println!("config: {}{}", view.config_path, source);
            println!(
                "top_procedures: order by [{}], limit {}",
                view.top_procedures.order_by, view.top_procedures.row_limit
            );
            println!(
                "top_queries: order by [{}], limit {}",
                view.top_queries.order_by, view.top_queries.row_limit
            );
            println!(
                "error_log: log file {}, informational {}",
                view.error_log_file_number,
                if view.error_log_include_informational { "kept" } else { "suppressed" }
            );
            println!("failed_logins: log file {}", view.failed_logins_file_number);
            println!(
                "wait_statistics: {} excluded wait types",
                view.excluded_wait_types.len()
            );
            Ok(())
        }
    }
}

pub fn path(config_path: &Path) -> Result<()> {
    println!("{}", config_path.display());
    Ok(())
}

pub fn init(config_path: &Path, force: bool) -> Result<()> {
    if config_path.exists() && !force {
        bail!(
            "Config file already exists at {} (use --force to overwrite)",
            config_path.display()
        );
    }

    Config::builtin().save_to(config_path)?;
    println!("Wrote {}", config_path.display());
    Ok(())
}
