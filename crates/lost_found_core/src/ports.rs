//! crates/lost_found_core/src/ports.rs
//!
//! Defines the persistence contract for the board's core logic.
//! The store only talks to storage through this trait, so the core stays
//! independent of the concrete key-value backend and record format.

use async_trait::async_trait;
use crate::domain::{Post, Session, User};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors of the storage backend.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Stored record '{key}' is invalid: {reason}")]
    Corrupt { key: String, reason: String },
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Persistence Port (Trait)
//=========================================================================================

/// Durable storage for the three board collections. Each collection is
/// loaded and saved independently and as a whole.
#[async_trait]
pub trait BoardRepository: Send + Sync {
    // --- Users ---
    async fn load_users(&self) -> PortResult<Vec<User>>;

    async fn save_users(&self, users: &[User]) -> PortResult<()>;

    // --- Posts ---
    async fn load_posts(&self) -> PortResult<Vec<Post>>;

    async fn save_posts(&self, posts: &[Post]) -> PortResult<()>;

    // --- Session ---
    /// Returns `None` when nobody is logged in.
    async fn load_session(&self) -> PortResult<Option<Session>>;

    async fn save_session(&self, session: &Session) -> PortResult<()>;

    /// Removes the persisted session. Removing an absent session is not an error.
    async fn clear_session(&self) -> PortResult<()>;
}
