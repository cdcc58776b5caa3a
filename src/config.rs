use std::env;
use std::path::PathBuf;

use crate::artifacts::{ArtifactPaths, DEFAULT_ARTIFACT_DIR};

const DEFAULT_LOG_FILE: &str = "acl_risk.log";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogMode {
    /// File when stdout is a terminal (the TUI owns it), stderr otherwise.
    Auto,
    File,
    Stderr,
}

impl LogMode {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "auto" => Some(LogMode::Auto),
            "file" => Some(LogMode::File),
            "stderr" => Some(LogMode::Stderr),
            _ => None,
        }
    }

    pub fn writes_to_file(self, interactive: bool) -> bool {
        match self {
            LogMode::File => true,
            LogMode::Stderr => false,
            LogMode::Auto => interactive,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub mode: LogMode,
    pub file: PathBuf,
    /// Raw `ACL_LOG_MODE` value that matched no mode. Reported once the
    /// subscriber is up.
    pub unrecognised_mode: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub artifacts: ArtifactPaths,
    pub log: LogConfig,
}

impl AppConfig {
    /// Reads `ACL_*` variables from the process environment. Call after
    /// `.env` files have been loaded.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let dir = non_empty("ACL_ARTIFACT_DIR")
            .map(|s| PathBuf::from(s.trim()))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_ARTIFACT_DIR));
        let mut artifacts = ArtifactPaths::in_dir(&dir);
        if let Some(path) = non_empty("ACL_SCALER_PATH") {
            artifacts.scaler = PathBuf::from(path.trim());
        }
        if let Some(path) = non_empty("ACL_MODEL_PATH") {
            artifacts.model = PathBuf::from(path.trim());
        }

        let raw_mode = non_empty("ACL_LOG_MODE");
        let parsed_mode = raw_mode.as_deref().and_then(LogMode::parse);
        let log = LogConfig {
            mode: parsed_mode.unwrap_or(LogMode::Auto),
            file: non_empty("ACL_LOG_FILE")
                .map(|s| PathBuf::from(s.trim()))
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE)),
            unrecognised_mode: raw_mode.filter(|_| parsed_mode.is_none()),
        };

        Self { artifacts, log }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> AppConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|k| vars.get(k).cloned())
    }

    #[test]
    fn defaults_point_at_assets() {
        let cfg = config_from(&[]);
        assert_eq!(cfg.artifacts, ArtifactPaths::in_dir("assets"));
        assert_eq!(cfg.log.mode, LogMode::Auto);
        assert_eq!(cfg.log.file, PathBuf::from("acl_risk.log"));
    }

    #[test]
    fn per_file_overrides_beat_the_directory() {
        let cfg = config_from(&[
            ("ACL_ARTIFACT_DIR", "/opt/models"),
            ("ACL_MODEL_PATH", "/tmp/other_model.json"),
        ]);
        assert_eq!(cfg.artifacts.scaler, PathBuf::from("/opt/models/scaler.json"));
        assert_eq!(cfg.artifacts.model, PathBuf::from("/tmp/other_model.json"));
    }

    #[test]
    fn blank_values_are_ignored() {
        let cfg = config_from(&[("ACL_ARTIFACT_DIR", "  "), ("ACL_LOG_MODE", "")]);
        assert_eq!(cfg.artifacts, ArtifactPaths::default());
        assert_eq!(cfg.log.mode, LogMode::Auto);
    }

    #[test]
    fn log_mode_resolution() {
        assert!(LogMode::Auto.writes_to_file(true));
        assert!(!LogMode::Auto.writes_to_file(false));
        assert!(LogMode::File.writes_to_file(false));
        assert!(!LogMode::Stderr.writes_to_file(true));
        assert_eq!(config_from(&[("ACL_LOG_MODE", "FILE")]).log.mode, LogMode::File);
        assert_eq!(config_from(&[("ACL_LOG_MODE", "auto")]).log.unrecognised_mode, None);
    }

    #[test]
    fn misspelt_log_mode_is_kept_for_reporting() {
        let cfg = config_from(&[("ACL_LOG_MODE", "flie")]);
        assert_eq!(cfg.log.mode, LogMode::Auto);
        assert_eq!(cfg.log.unrecognised_mode.as_deref(), Some("flie"));
    }
}
