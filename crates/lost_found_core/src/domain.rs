//! crates/lost_found_core/src/domain.rs
//!
//! Defines the pure, core data structures for the board.
//! These structs are independent of any storage backend or serialization format.

use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

//=========================================================================================
// Identifiers
//=========================================================================================

/// Opaque identifier of a registered user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId(String);

impl UserId {
    /// Generates a fresh, random identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for UserId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque identifier of a post.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PostId(String);

impl PostId {
    /// Generates a fresh, random identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for PostId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for PostId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

//=========================================================================================
// Roles
//=========================================================================================

/// Returned when a role string is not one of the known roles.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown role: '{0}'")]
pub struct UnknownRole(pub String);

/// The role a user registers with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Lost,
    Found,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Lost => "lost",
            Role::Found => "found",
            Role::Admin => "admin",
        }
    }

    pub fn is_admin(self) -> bool {
        matches!(self, Role::Admin)
    }

    /// The kind of post a user with this role reports. Admins do not post.
    pub fn post_kind(self) -> Option<PostKind> {
        match self {
            Role::Lost => Some(PostKind::Lost),
            Role::Found => Some(PostKind::Found),
            Role::Admin => None,
        }
    }

    /// The posts a user with this role browses by default: people who lost
    /// something look through found items and vice versa. Admins see everything.
    pub fn default_search_filter(self) -> Option<PostKind> {
        match self {
            Role::Lost => Some(PostKind::Found),
            Role::Found => Some(PostKind::Lost),
            Role::Admin => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lost" => Ok(Role::Lost),
            "found" => Ok(Role::Found),
            "admin" => Ok(Role::Admin),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// Whether a post reports a lost item or a found one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PostKind {
    Lost,
    Found,
}

impl PostKind {
    pub fn as_str(self) -> &'static str {
        self.as_role().as_str()
    }

    pub fn as_role(self) -> Role {
        match self {
            PostKind::Lost => Role::Lost,
            PostKind::Found => Role::Found,
        }
    }
}

impl fmt::Display for PostKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for PostKind {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.parse::<Role>()?.post_kind() {
            Some(kind) => Ok(kind),
            None => Err(UnknownRole(s.to_string())),
        }
    }
}

//=========================================================================================
// Records
//=========================================================================================

/// A registered user. Passwords are kept as entered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub password: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// A lost- or found-item listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    pub id: PostId,
    pub title: String,
    pub description: String,
    pub location: String,
    pub posted_by: UserId,
    pub kind: PostKind,
    /// A data URI, or empty when no picture was attached.
    pub image_url: String,
    pub created_at: DateTime<Utc>,
}

/// The persisted projection of the logged-in user, used to restore identity on load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: UserId,
    pub role: Role,
    pub email: String,
}

impl From<&User> for Session {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id.clone(),
            role: user.role,
            email: user.email.clone(),
        }
    }
}

/// Identity state of the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AuthState {
    #[default]
    Uninitialized,
    Loading,
    Unauthenticated,
    Authenticated(User),
}

/// Counters shown on the admin dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BoardStats {
    pub total_users: usize,
    pub total_posts: usize,
    pub lost_posts: usize,
    pub found_posts: usize,
}
