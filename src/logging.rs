use std::fs::{self, OpenOptions};

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LogConfig;

/// Installs the global subscriber. Writing to the terminal would tear the TUI,
/// so interactive runs log to a file unless told otherwise.
///
/// Keep the returned guard alive until exit or buffered lines are lost.
pub fn init(cfg: &LogConfig, interactive: bool, default_filter: &str) -> Result<WorkerGuard> {
    let (writer, guard) = if cfg.mode.writes_to_file(interactive) {
        if let Some(parent) = cfg.file.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .with_context(|| format!("create log directory {}", parent.display()))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&cfg.file)
            .with_context(|| format!("open log file {}", cfg.file.display()))?;
        tracing_appender::non_blocking(file)
    } else {
        tracing_appender::non_blocking(std::io::stderr())
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false),
        )
        .try_init()
        .context("install tracing subscriber")?;

    if let Some(raw) = &cfg.unrecognised_mode {
        tracing::warn!(value = %raw, "unrecognised ACL_LOG_MODE, falling back to auto");
    }
    Ok(guard)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::config::LogMode;

    #[test]
    fn unusable_log_directory_is_reported() {
        let blocker: PathBuf =
            std::env::temp_dir().join(format!("acl_risk_log_blocker_{}", std::process::id()));
        fs::write(&blocker, b"not a directory").unwrap();

        let cfg = LogConfig {
            mode: LogMode::File,
            file: blocker.join("logs").join("acl_risk.log"),
            unrecognised_mode: None,
        };
        let Err(err) = init(&cfg, true, "info") else {
            panic!("log init should fail under a regular file");
        };
        let _ = fs::remove_file(&blocker);

        assert!(
            format!("{err:#}").contains("create log directory"),
            "unexpected error: {err:#}"
        );
    }
}
