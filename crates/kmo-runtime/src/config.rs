use crate::{Error, Result};
use kmo_engine::{Defaults, default_ignored_wait_types};
use kmo_types::{
    DEFAULT_ROW_LIMIT, OperationId, ProcedureSortColumn, QuerySortColumn, TopNOptions,
    WaitStatisticsOptions,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Resolve the configuration file path based on priority:
/// 1. Explicit path (with tilde expansion)
/// 2. KMO_CONFIG environment variable (with tilde expansion)
/// 3. Platform config directory (`<config_dir>/kmo/config.toml`)
/// 4. ~/.kmo/config.toml (fallback for systems without one)
pub fn resolve_config_path(explicit_path: Option<&str>) -> Result<PathBuf> {
    if let Some(path) = explicit_path {
        return Ok(expand_tilde(path));
    }

    if let Ok(env_path) = std::env::var("KMO_CONFIG") {
        return Ok(expand_tilde(&env_path));
    }

    if let Some(config_dir) = dirs::config_dir() {
        return Ok(config_dir.join("kmo").join("config.toml"));
    }

    if let Some(home) = dirs::home_dir() {
        return Ok(home.join(".kmo").join("config.toml"));
    }

    Err(Error::Config(
        "Could not determine config path: no HOME or config directory found".to_string(),
    ))
}

fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(stripped);
    }
    PathBuf::from(path)
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitStatisticsConfig {
    /// Replaces the built-in ignore list when present; `[]` disables exclusion
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excluded_wait_types: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopNConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_limit: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorLogConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_informational_messages: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file_number: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedLoginsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file_number: Option<i32>,
}

/// Per-deployment overrides of the catalog defaults
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub wait_statistics: WaitStatisticsConfig,
    #[serde(default)]
    pub top_procedures: TopNConfig,
    #[serde(default)]
    pub top_queries: TopNConfig,
    #[serde(default)]
    pub error_log: ErrorLogConfig,
    #[serde(default)]
    pub failed_logins: FailedLoginsConfig,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn default_path() -> Result<PathBuf> {
        resolve_config_path(None)
    }

    /// Every key spelled out with its built-in value, as written by `kmo config init`.
    pub fn builtin() -> Self {
        let defaults = Defaults::default();
        Self {
            wait_statistics: WaitStatisticsConfig {
                excluded_wait_types: Some(default_ignored_wait_types()),
            },
            top_procedures: TopNConfig {
                order_by: Some(defaults.top_procedures.order_by.to_string()),
                row_limit: Some(DEFAULT_ROW_LIMIT),
            },
            top_queries: TopNConfig {
                order_by: Some(defaults.top_queries.order_by.to_string()),
                row_limit: Some(DEFAULT_ROW_LIMIT),
            },
            error_log: ErrorLogConfig {
                include_informational_messages: Some(
                    defaults.error_log.include_informational_messages,
                ),
                log_file_number: Some(defaults.error_log.log_file_number),
            },
            failed_logins: FailedLoginsConfig {
                log_file_number: Some(defaults.failed_logins.log_file_number),
            },
        }
    }

    /// Apply overrides on top of the built-in defaults, validating each one.
    pub fn defaults(&self) -> Result<Defaults> {
        let mut defaults = Defaults::default();

        if let Some(wait_types) = &self.wait_statistics.excluded_wait_types {
            let normalized = WaitStatisticsOptions::new(wait_types.iter().map(String::as_str))
                .normalized_wait_types(OperationId::WaitStatistics)
                .map_err(|e| invalid("wait_statistics", e))?;
            defaults.wait_statistics = WaitStatisticsOptions::new(normalized);
        }

        defaults.top_procedures = apply_top_n::<ProcedureSortColumn>(
            "top_procedures",
            OperationId::TopProcedures,
            &self.top_procedures,
            defaults.top_procedures,
        )?;
        defaults.top_queries = apply_top_n::<QuerySortColumn>(
            "top_queries",
            OperationId::TopQueries,
            &self.top_queries,
            defaults.top_queries,
        )?;

        if let Some(include) = self.error_log.include_informational_messages {
            defaults.error_log.include_informational_messages = include;
        }
        if let Some(number) = self.error_log.log_file_number {
            defaults.error_log.log_file_number = number;
        }
        defaults
            .error_log
            .validate(OperationId::ErrorLog)
            .map_err(|e| invalid("error_log", e))?;

        if let Some(number) = self.failed_logins.log_file_number {
            defaults.failed_logins.log_file_number = number;
        }
        defaults
            .failed_logins
            .validate(OperationId::FailedLogins)
            .map_err(|e| invalid("failed_logins", e))?;

        Ok(defaults)
    }
}

fn apply_top_n<S>(
    section: &str,
    operation: OperationId,
    config: &TopNConfig,
    mut options: TopNOptions<S>,
) -> Result<TopNOptions<S>>
where
    S: kmo_types::SortColumn + FromStr<Err = String>,
{
    if let Some(order_by) = &config.order_by {
        options.order_by = S::from_str(order_by)
            .map_err(|e| Error::Config(format!("[{}] order_by: {}", section, e)))?;
    }
    if let Some(row_limit) = config.row_limit {
        options.row_limit = row_limit;
    }
    options
        .validate(operation)
        .map_err(|e| invalid(section, e))?;
    Ok(options)
}

fn invalid(section: &str, err: kmo_types::Error) -> Error {
    Error::Config(format!("[{}] {}", section, err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_default_matches_catalog() -> Result<()> {
        let config = Config::default();
        assert_eq!(config.defaults()?, Defaults::default());
        Ok(())
    }

    #[test]
    fn test_config_save_and_load() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let config_path = temp_dir.path().join("nested").join("config.toml");

        let config = Config::builtin();
        config.save_to(&config_path)?;

        let loaded = Config::load_from(&config_path)?;
        assert_eq!(loaded, config);
        assert_eq!(loaded.defaults()?, Defaults::default());
        Ok(())
    }

    #[test]
    fn test_missing_file_yields_default() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let config = Config::load_from(&temp_dir.path().join("absent.toml"))?;
        assert_eq!(config, Config::default());
        Ok(())
    }

    #[test]
    fn test_overrides_are_applied() -> Result<()> {
        let config: Config = toml::from_str(
            r#"
[wait_statistics]
excluded_wait_types = ["sleep_task", "SLEEP_TASK", "LAZYWRITER_SLEEP"]

[top_queries]
order_by = "average_logical_reads"
row_limit = 10

[error_log]
include_informational_messages = true
"#,
        )?;
        let defaults = config.defaults()?;

        assert_eq!(
            defaults.wait_statistics.excluded_wait_types,
            vec!["SLEEP_TASK", "LAZYWRITER_SLEEP"]
        );
        assert_eq!(
            defaults.top_queries.order_by,
            QuerySortColumn::AverageLogicalReads
        );
        assert_eq!(defaults.top_queries.row_limit, 10);
        assert_eq!(defaults.top_procedures.row_limit, DEFAULT_ROW_LIMIT);
        assert!(defaults.error_log.include_informational_messages);
        Ok(())
    }

    #[test]
    fn test_empty_wait_list_disables_exclusion() -> Result<()> {
        let config: Config = toml::from_str("[wait_statistics]\nexcluded_wait_types = []\n")?;
        assert!(
            config
                .defaults()?
                .wait_statistics
                .excluded_wait_types
                .is_empty()
        );
        Ok(())
    }

    #[test]
    fn test_invalid_overrides_are_rejected() {
        let cases = [
            "[top_procedures]\norder_by = \"total_cost; DROP TABLE x\"\n",
            "[top_queries]\nrow_limit = 0\n",
            "[wait_statistics]\nexcluded_wait_types = [\"BAD-NAME\"]\n",
            "[error_log]\nlog_file_number = 100\n",
        ];

        for case in cases {
            let config: Config = toml::from_str(case).unwrap();
            let err = config.defaults().unwrap_err();
            assert!(matches!(err, Error::Config(_)), "{}", case);
        }
    }

    #[test]
    fn test_explicit_path_wins() -> Result<()> {
        let path = resolve_config_path(Some("/tmp/kmo-explicit.toml"))?;
        assert_eq!(path, PathBuf::from("/tmp/kmo-explicit.toml"));
        Ok(())
    }
}
