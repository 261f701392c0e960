//! services/board/src/config.rs
//!
//! Startup settings for the board: which storage backend to use, where the
//! file backend keeps its records, and how verbose logging is.
//!
//! Values come from `BOARD_*` variables and `RUST_LOG`. Outside tests a `.env`
//! file in the working directory is read first, if there is one.

use std::path::PathBuf;
use std::str::FromStr;
use tracing::Level;

/// Why the board could not be configured.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} is required for the file backend and must not be empty")]
    MissingVar(String),
    #[error("{0} has an unusable value: {1}")]
    InvalidValue(String, String),
}

/// Where the board keeps its persisted records.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StorageBackend {
    /// One file per key in the data directory.
    File,
    /// Process memory only; everything is lost on exit.
    Memory,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "file" => Ok(StorageBackend::File),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(format!("'{}' is not a storage backend (expected file or memory)", other)),
        }
    }
}

/// Settings resolved once in `main` and passed down from there.
#[derive(Clone, Debug)]
pub struct Config {
    pub storage: StorageBackend,
    pub data_dir: PathBuf,
    pub log_level: Level,
}

impl Config {
    /// Reads the process environment, after a `.env` file when one exists.
    /// Test builds never read `.env`.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let storage_str = lookup("BOARD_STORAGE").unwrap_or_else(|| "file".to_string());
        let storage = storage_str
            .parse::<StorageBackend>()
            .map_err(|e| ConfigError::InvalidValue("BOARD_STORAGE".to_string(), e))?;

        let data_dir = lookup("BOARD_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./data"));
        if storage == StorageBackend::File && data_dir.as_os_str().is_empty() {
            return Err(ConfigError::MissingVar("BOARD_DATA_DIR".to_string()));
        }

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        Ok(Self {
            storage,
            data_dir,
            log_level,
        })
    }
}
