use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
    pub max_connections: u32,
    pub journal_mode: SqliteJournalMode,
    pub busy_timeout: Duration,
    pub foreign_keys: bool,
}

impl DbConfig {
    pub fn from_env() -> Self {
        let raw_path =
            std::env::var("DATABASE_PATH").unwrap_or_else(|_| "./data/tutor.db".to_string());
        let path = resolve_path_relative_to_manifest_dir(&raw_path);

        let journal_mode = std::env::var("SQLITE_JOURNAL_MODE")
            .ok()
            .as_deref()
            .and_then(SqliteJournalMode::parse)
            .unwrap_or(SqliteJournalMode::Wal);

        Self {
            path,
            max_connections: env_u32("DB_MAX_CONNECTIONS", 5).max(1),
            journal_mode,
            busy_timeout: Duration::from_millis(env_u64("SQLITE_BUSY_TIMEOUT_MS", 5000)),
            foreign_keys: env_bool("SQLITE_FOREIGN_KEYS", false),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqliteJournalMode {
    Wal,
    Delete,
    Memory,
}

impl SqliteJournalMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "wal" => Some(Self::Wal),
            "delete" => Some(Self::Delete),
            "memory" => Some(Self::Memory),
            _ => None,
        }
    }

    pub fn as_sqlx(self) -> sqlx::sqlite::SqliteJournalMode {
        match self {
            Self::Wal => sqlx::sqlite::SqliteJournalMode::Wal,
            Self::Delete => sqlx::sqlite::SqliteJournalMode::Delete,
            Self::Memory => sqlx::sqlite::SqliteJournalMode::Memory,
        }
    }
}

pub(crate) fn env_bool(key: &str, default: bool) -> bool {
    match std::env::var(key).ok().as_deref() {
        Some("true") | Some("1") => true,
        Some("false") | Some("0") => false,
        _ => default,
    }
}

pub(crate) fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or(default)
}

pub(crate) fn env_u32(key: &str, default: u32) -> u32 {
    std::env::var(key)
        .ok()
        .and_then(|value| value.parse::<u32>().ok())
        .unwrap_or(default)
}

fn resolve_path_relative_to_manifest_dir(value: &str) -> PathBuf {
    let raw = Path::new(value);
    if raw.is_absolute() {
        return raw.to_path_buf();
    }
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn journal_mode_parses_case_insensitively() {
        assert_eq!(SqliteJournalMode::parse("WAL"), Some(SqliteJournalMode::Wal));
        assert_eq!(SqliteJournalMode::parse(" delete "), Some(SqliteJournalMode::Delete));
        assert_eq!(SqliteJournalMode::parse("truncate"), None);
    }

    #[test]
    fn relative_paths_resolve_against_manifest_dir() {
        let resolved = resolve_path_relative_to_manifest_dir("data/x.db");
        assert!(resolved.is_absolute());
        assert!(resolved.ends_with("data/x.db"));
    }
}
