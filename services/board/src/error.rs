//! services/board/src/error.rs
//!
//! Defines the primary error type for the board service.

use crate::config::ConfigError;
use lost_found_core::store::StoreError;

/// The primary error type for the `board` service.
#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error returned by the local data store.
    #[error("Store Error: {0}")]
    Store(#[from] StoreError),

    /// Represents a standard Input/Output error (e.g., reading the console).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
