//! Environment-driven settings.
//!
//! Read once at startup; there are no CLI flags.

use std::path::PathBuf;

/// Model file or directory holding `model.json`.
pub const MODEL_PATH_ENV: &str = "DIABETES_RISK_MODEL_PATH";
/// `auto`, `file` or `stdout`.
pub const LOG_MODE_ENV: &str = "DIABETES_RISK_LOG_MODE";
/// Log file used when logging to a file.
pub const LOG_FILE_ENV: &str = "DIABETES_RISK_LOG_FILE";

const DEFAULT_MODEL_PATH: &str = "models";
const DEFAULT_LOG_FILE: &str = "diabetes-risk.log";

/// Where log output goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogMode {
    /// File when attached to a terminal, stdout otherwise.
    #[default]
    Auto,
    File,
    Stdout,
}

impl LogMode {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "auto" => Some(Self::Auto),
            "file" => Some(Self::File),
            "stdout" => Some(Self::Stdout),
            _ => None,
        }
    }

    /// Whether logs go to a file.
    ///
    /// Logs written to the terminal would corrupt the alternate screen, so
    /// `Auto` picks the file whenever stdout is interactive.
    #[must_use]
    pub fn use_file(self, interactive: bool) -> bool {
        match self {
            Self::File => true,
            Self::Stdout => false,
            Self::Auto => interactive,
        }
    }
}

/// Startup configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub model_path: PathBuf,
    pub log_mode: LogMode,
    pub log_file: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            log_mode: LogMode::Auto,
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
        }
    }
}

impl AppConfig {
    /// Read the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup. Unset or blank variables
    /// keep their defaults; an unknown log mode falls back to `auto`.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        Self {
            model_path: get(MODEL_PATH_ENV)
                .map(PathBuf::from)
                .unwrap_or(defaults.model_path),
            log_mode: get(LOG_MODE_ENV)
                .and_then(|v| LogMode::parse(&v))
                .unwrap_or_default(),
            log_file: get(LOG_FILE_ENV)
                .map(PathBuf::from)
                .unwrap_or(defaults.log_file),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        assert_eq!(AppConfig::from_lookup(lookup(&[])), AppConfig::default());
    }

    #[test]
    fn test_reads_overrides() {
        let config = AppConfig::from_lookup(lookup(&[
            (MODEL_PATH_ENV, "/srv/models/diabetes.json"),
            (LOG_MODE_ENV, "STDOUT"),
            (LOG_FILE_ENV, "/tmp/risk.log"),
        ]));
        assert_eq!(config.model_path, PathBuf::from("/srv/models/diabetes.json"));
        assert_eq!(config.log_mode, LogMode::Stdout);
        assert_eq!(config.log_file, PathBuf::from("/tmp/risk.log"));
    }

    #[test]
    fn test_unknown_log_mode_falls_back_to_auto() {
        let config =
            AppConfig::from_lookup(lookup(&[(LOG_MODE_ENV, "syslog"), (MODEL_PATH_ENV, "  ")]));
        assert_eq!(config.log_mode, LogMode::Auto);
        assert_eq!(config.model_path, PathBuf::from(DEFAULT_MODEL_PATH));
    }

    #[test]
    fn test_auto_mode_follows_terminal() {
        assert!(LogMode::Auto.use_file(true));
        assert!(!LogMode::Auto.use_file(false));
        assert!(LogMode::File.use_file(false));
        assert!(!LogMode::Stdout.use_file(true));
    }
}
