use crate::error::{ObservabilityError, Result};
use crate::observability::{
    Category, LoggerConfig, Severity, DEFAULT_DB_PATH, DEFAULT_MAX_LOG_LENGTH,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Raw configuration, before validation
///
/// Sources, lowest priority first: built-in defaults, optional
/// `ai_observability.toml`, `AI_LOG_*` environment variables.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    pub db_path: String,
    pub min_severity: String,
    pub max_log_length: usize,
    /// `None` enables every category
    #[serde(default)]
    pub enabled_categories: Option<Vec<String>>,
}

impl ObservabilityConfig {
    /// Validate into a [`LoggerConfig`]
    pub fn logger_config(&self) -> Result<LoggerConfig> {
        let min_severity: Severity = self.min_severity.parse()?;

        let enabled_categories = match &self.enabled_categories {
            Some(names) => names
                .iter()
                .map(|name| name.parse::<Category>())
                .collect::<Result<_>>()?,
            None => Category::ALL.into_iter().collect(),
        };

        if self.max_log_length == 0 {
            return Err(ObservabilityError::Config(
                "max_log_length must be greater than 0".to_string(),
            ));
        }

        Ok(LoggerConfig {
            storage_path: PathBuf::from(&self.db_path),
            min_severity,
            enabled_categories,
            max_log_length: self.max_log_length,
        })
    }
}

pub fn load_config() -> Result<ObservabilityConfig> {
    load_config_from(None)
}

/// Load configuration, optionally replacing the process environment with
/// `env` (used by tests)
pub fn load_config_from(env: Option<HashMap<String, String>>) -> Result<ObservabilityConfig> {
    let environment = config::Environment::with_prefix("AI_LOG")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("enabled_categories")
        .source(env);

    let config = config::Config::builder()
        .set_default("db_path", DEFAULT_DB_PATH)
        .and_then(|b| b.set_default("min_severity", Severity::Info.as_str()))
        .and_then(|b| b.set_default("max_log_length", DEFAULT_MAX_LOG_LENGTH as u64))
        .map_err(config_error)?
        .add_source(config::File::with_name("ai_observability").required(false))
        .add_source(environment)
        .build()
        .map_err(config_error)?;

    config.try_deserialize().map_err(config_error)
}

fn config_error(err: config::ConfigError) -> ObservabilityError {
    ObservabilityError::Config(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> Option<HashMap<String, String>> {
        Some(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_defaults() {
        let cfg = load_config_from(env(&[])).unwrap();
        assert_eq!(cfg.db_path, "./ai_logs.db");
        assert_eq!(cfg.min_severity, "INFO");
        assert_eq!(cfg.max_log_length, 10_000);
        assert!(cfg.enabled_categories.is_none());

        let logger = cfg.logger_config().unwrap();
        assert_eq!(logger.min_severity, Severity::Info);
        assert_eq!(logger.enabled_categories.len(), Category::ALL.len());
    }

    #[test]
    fn test_environment_overrides() {
        let cfg = load_config_from(env(&[
            ("AI_LOG_DB_PATH", "/tmp/custom.db"),
            ("AI_LOG_MIN_SEVERITY", "warning"),
            ("AI_LOG_MAX_LOG_LENGTH", "500"),
            ("AI_LOG_ENABLED_CATEGORIES", "prompt,response"),
        ]))
        .unwrap();

        let logger = cfg.logger_config().unwrap();
        assert_eq!(logger.storage_path, PathBuf::from("/tmp/custom.db"));
        assert_eq!(logger.min_severity, Severity::Warning);
        assert_eq!(logger.max_log_length, 500);
        assert_eq!(logger.enabled_categories.len(), 2);
        assert!(logger.enabled_categories.contains(&Category::Response));
    }

    #[test]
    fn test_invalid_severity_is_config_error() {
        let cfg = load_config_from(env(&[("AI_LOG_MIN_SEVERITY", "LOUD")])).unwrap();

        let result = cfg.logger_config();
        assert!(matches!(result, Err(ObservabilityError::Config(msg)) if msg.contains("LOUD")));
    }

    #[test]
    fn test_single_underscore_prefix_is_required() {
        let cfg = load_config_from(env(&[
            ("AI_LOG_MIN_SEVERITY", "ERROR"),
            ("AI_LOG_DB_PATH", "/tmp/zz.db"),
            ("AI_LOG_ENABLED_CATEGORIES", "cost"),
        ]))
        .unwrap();
        assert_eq!(cfg.min_severity, "ERROR");
        assert_eq!(cfg.db_path, "/tmp/zz.db");
        assert_eq!(cfg.enabled_categories, Some(vec!["cost".to_string()]));

        // Unrelated variables sharing the first letters are ignored
        let cfg = load_config_from(env(&[("AI_LOGGING_DB_PATH", "/tmp/other.db")])).unwrap();
        assert_eq!(cfg.db_path, "./ai_logs.db");
    }

    #[test]
    fn test_invalid_category_is_config_error() {
        let cfg = ObservabilityConfig {
            db_path: "x.db".to_string(),
            min_severity: "INFO".to_string(),
            max_log_length: 100,
            enabled_categories: Some(vec!["prompt".to_string(), "telemetry".to_string()]),
        };

        assert!(matches!(cfg.logger_config(), Err(ObservabilityError::Config(_))));
    }
}
