use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_FILE_PREFIX: &str = "tutor-engine.log";
const DEFAULT_LOG_DIR: &str = "./logs";

/// Keeps the non-blocking file writer flushing until dropped.
pub struct FileLogGuard {
    _guard: WorkerGuard,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub filter: String,
    /// Directory for the rolling engine log. `None` keeps output on stdout only.
    pub file_dir: Option<PathBuf>,
    pub rotation: FileRotation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileRotation {
    Hourly,
    Daily,
    Never,
}

impl FileRotation {
    fn parse(raw: Option<&str>) -> Self {
        match raw.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            Some("hourly") => Self::Hourly,
            Some("never") => Self::Never,
            _ => Self::Daily,
        }
    }

    fn to_rotation(self) -> Rotation {
        match self {
            Self::Hourly => Rotation::HOURLY,
            Self::Daily => Rotation::DAILY,
            Self::Never => Rotation::NEVER,
        }
    }
}

impl LogConfig {
    /// Reads `ENABLE_FILE_LOGS`, `LOG_DIR` and `LOG_ROTATION` on top of the configured level.
    pub fn from_env(filter: &str) -> Self {
        Self::resolve(
            filter,
            std::env::var("ENABLE_FILE_LOGS").ok().as_deref(),
            std::env::var("LOG_DIR").ok(),
            std::env::var("LOG_ROTATION").ok().as_deref(),
        )
    }

    pub fn resolve(filter: &str, enable_files: Option<&str>, dir: Option<String>, rotation: Option<&str>) -> Self {
        let enabled = matches!(enable_files.map(str::trim), Some("true" | "1"));
        let file_dir = enabled.then(|| {
            let dir = dir.filter(|d| !d.trim().is_empty());
            PathBuf::from(dir.unwrap_or_else(|| DEFAULT_LOG_DIR.to_string()))
        });
        let filter = if filter.trim().is_empty() { "info" } else { filter.trim() };

        Self {
            filter: filter.to_string(),
            file_dir,
            rotation: FileRotation::parse(rotation),
        }
    }
}

pub fn init_tracing(log_level: &str) -> Option<FileLogGuard> {
    init_with(&LogConfig::from_env(log_level))
}

pub fn init_with(config: &LogConfig) -> Option<FileLogGuard> {
    let env_filter = EnvFilter::try_new(&config.filter).unwrap_or_else(|_| EnvFilter::new("info"));

    // A directory that cannot be created downgrades to stdout only.
    let file_writer = config.file_dir.as_ref().and_then(|dir| match std::fs::create_dir_all(dir) {
        Ok(()) => {
            let appender = RollingFileAppender::new(config.rotation.to_rotation(), dir, LOG_FILE_PREFIX);
            Some(tracing_appender::non_blocking(appender))
        }
        Err(err) => {
            eprintln!("failed to create log directory {}: {err}", dir.display());
            None
        }
    });

    let (file_layer, guard) = match file_writer {
        Some((writer, guard)) => (
            Some(fmt::layer().with_writer(writer).with_ansi(false).with_target(true)),
            Some(FileLogGuard { _guard: guard }),
        ),
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true))
        .with(file_layer)
        .init();

    if let Some(dir) = config.file_dir.as_ref().filter(|_| guard.is_some()) {
        tracing::info!(dir = %dir.display(), rotation = ?config.rotation, "file logging enabled");
    }
    guard
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn files_stay_off_unless_enabled() {
        let config = LogConfig::resolve("debug", None, Some("/tmp/x".into()), None);
        assert_eq!(config.file_dir, None);
        assert_eq!(config.filter, "debug");

        let config = LogConfig::resolve("debug", Some("yes"), None, None);
        assert_eq!(config.file_dir, None);
    }

    #[test]
    fn enabled_files_default_to_local_dir() {
        let config = LogConfig::resolve("info", Some("1"), Some("  ".into()), None);
        assert_eq!(config.file_dir, Some(PathBuf::from(DEFAULT_LOG_DIR)));
        assert_eq!(config.rotation, FileRotation::Daily);

        let config = LogConfig::resolve("info", Some("true"), Some("/var/log/tutor".into()), Some("Hourly"));
        assert_eq!(config.file_dir, Some(PathBuf::from("/var/log/tutor")));
        assert_eq!(config.rotation, FileRotation::Hourly);
    }

    #[test]
    fn blank_filter_falls_back_to_info() {
        assert_eq!(LogConfig::resolve("  ", None, None, None).filter, "info");
        assert_eq!(
            LogConfig::resolve("info", None, None, Some("never")).rotation,
            FileRotation::Never
        );
    }
}
