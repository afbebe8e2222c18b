use super::args::{Cli, Commands, ConfigCommand};
use super::handlers;
use crate::logging;
use anyhow::{Context, Result};
use kmo_runtime::{Config, resolve_config_path};

pub fn run(cli: Cli) -> Result<()> {
    logging::init(cli.log_level);

    let config_path = resolve_config_path(cli.config.as_deref())?;

    match cli.command {
        Commands::Catalog { engine_version } => {
            handlers::catalog::handle(engine_version.as_deref(), cli.format)
        }

        Commands::Compose {
            operation,
            engine_version,
            ole_automation,
            options,
        } => {
            let defaults = Config::load_from(&config_path)
                .and_then(|config| config.defaults())
                .with_context(|| format!("Failed to load {}", config_path.display()))?;
            handlers::compose::handle(
                operation,
                &engine_version,
                ole_automation,
                &options,
                &defaults,
                cli.format,
            )
        }

        Commands::VersionName { version } => handlers::version::handle(&version, cli.format),

        Commands::Config { command } => match command {
            ConfigCommand::Show => handlers::config::show(&config_path, cli.format),
            ConfigCommand::Path => handlers::config::path(&config_path),
            ConfigCommand::Init { force } => handlers::config::init(&config_path, force),
        },
    }
}
