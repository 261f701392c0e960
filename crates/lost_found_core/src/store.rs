//! crates/lost_found_core/src/store.rs
//!
//! The local data store: the single source of truth for users, posts and the
//! identity of the logged-in user. Every collection lives in memory and is
//! mirrored through the `BoardRepository` port whenever it changes.
//!
//! The store is an explicit object constructed once at startup and handed to
//! presentation code. Mutating operations take `&mut self`, so each one runs to
//! completion before the next can start.

use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::domain::{AuthState, BoardStats, Post, PostId, PostKind, Role, Session, User, UserId};
use crate::ports::{BoardRepository, PortError};
use crate::search;

//=========================================================================================
// Store Error and Result Types
//=========================================================================================

/// Errors surfaced to the caller. The messages are meant to be shown to end users as-is.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("User already exists with this email")]
    DuplicateUser,
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("User not authenticated")]
    NotAuthenticated,
    #[error("Store is still loading")]
    NotReady,
    #[error("Storage error: {0}")]
    Storage(#[from] PortError),
}

pub type StoreResult<T> = Result<T, StoreError>;

//=========================================================================================
// The Store
//=========================================================================================

pub struct LocalDataStore {
    repo: Arc<dyn BoardRepository>,
    users: Vec<User>,
    posts: Vec<Post>,
    state: AuthState,
}

impl LocalDataStore {
    /// Creates a store in the `Loading` state. Call [`LocalDataStore::initialize`]
    /// before using it.
    pub fn new(repo: Arc<dyn BoardRepository>) -> Self {
        Self {
            repo,
            users: Vec::new(),
            posts: Vec::new(),
            state: AuthState::Loading,
        }
    }

    /// Loads all collections from storage and restores the persisted session.
    ///
    /// A session pointing at an unknown user is dropped. On a load error the
    /// store stays in `Loading`. Once ready, further calls do nothing.
    pub async fn initialize(&mut self) -> StoreResult<()> {
        if self.is_ready() {
            debug!("Store already initialized");
            return Ok(());
        }

        let users = self.repo.load_users().await?;
        let posts = self.repo.load_posts().await?;
        let session = self.repo.load_session().await?;

        let current = match session {
            Some(session) => match users.iter().find(|u| u.id == session.user_id) {
                Some(user) => Some(user.clone()),
                None => {
                    warn!(user_id = %session.user_id, "Discarding session for unknown user");
                    if let Err(e) = self.repo.clear_session().await {
                        warn!("Failed to remove orphaned session: {}", e);
                    }
                    None
                }
            },
            None => None,
        };

        self.users = users;
        self.posts = posts;
        self.state = match current {
            Some(user) => {
                info!(email = %user.email, role = %user.role, "Restored session");
                AuthState::Authenticated(user)
            }
            None => AuthState::Unauthenticated,
        };
        info!(
            users = self.users.len(),
            posts = self.posts.len(),
            "Store initialized"
        );
        Ok(())
    }

    // --- Identity ---

    /// Creates an account and logs it in.
    pub async fn register(&mut self, email: &str, password: &str, role: Role) -> StoreResult<User> {
        self.ensure_ready()?;
        if self.users.iter().any(|u| u.email == email) {
            warn!(email, "Registration rejected: email already taken");
            return Err(StoreError::DuplicateUser);
        }

        let user = User {
            id: UserId::generate(),
            email: email.to_string(),
            password: password.to_string(),
            role,
            created_at: Utc::now(),
        };

        self.users.push(user.clone());
        if let Err(e) = self.repo.save_users(&self.users).await {
            self.users.pop();
            return Err(e.into());
        }
        info!(email, %role, "Registered user");

        // The account is kept even if the session cannot be saved; the user can log in again.
        self.start_session(&user).await?;
        Ok(user)
    }

    /// Logs in with an exact email and password match.
    pub async fn login(&mut self, email: &str, password: &str) -> StoreResult<User> {
        self.ensure_ready()?;
        let user = self
            .users
            .iter()
            .find(|u| u.email == email && u.password == password)
            .cloned()
            .ok_or(StoreError::InvalidCredentials)?;

        self.start_session(&user).await?;
        info!(email, "Logged in");
        Ok(user)
    }

    /// Forgets the current identity. Users and posts are untouched.
    pub async fn logout(&mut self) -> StoreResult<()> {
        self.ensure_ready()?;
        self.repo.clear_session().await?;
        if let AuthState::Authenticated(user) = &self.state {
            info!(email = %user.email, "Logged out");
        }
        self.state = AuthState::Unauthenticated;
        Ok(())
    }

    async fn start_session(&mut self, user: &User) -> StoreResult<()> {
        self.repo.save_session(&Session::from(user)).await?;
        self.state = AuthState::Authenticated(user.clone());
        Ok(())
    }

    // --- Posts ---

    /// Publishes a post on behalf of the current user.
    pub async fn create_post(
        &mut self,
        title: &str,
        description: &str,
        location: &str,
        kind: PostKind,
        image_url: &str,
    ) -> StoreResult<Post> {
        self.ensure_ready()?;
        let author = self.current_user().ok_or(StoreError::NotAuthenticated)?;

        let post = Post {
            id: PostId::generate(),
            title: title.to_string(),
            description: description.to_string(),
            location: location.to_string(),
            posted_by: author.id.clone(),
            kind,
            image_url: image_url.to_string(),
            created_at: Utc::now(),
        };

        self.posts.push(post.clone());
        if let Err(e) = self.repo.save_posts(&self.posts).await {
            self.posts.pop();
            return Err(e.into());
        }
        info!(post_id = %post.id, %kind, "Created post");
        Ok(post)
    }

    /// Removes a post by id. Returns `false` when no such post exists.
    ///
    /// Ownership is not checked here; callers decide who may delete.
    pub async fn delete_post(&mut self, post_id: &PostId) -> StoreResult<bool> {
        self.ensure_ready()?;
        let Some(index) = self.posts.iter().position(|p| &p.id == post_id) else {
            debug!(%post_id, "Delete ignored: no such post");
            return Ok(false);
        };

        let removed = self.posts.remove(index);
        if let Err(e) = self.repo.save_posts(&self.posts).await {
            self.posts.insert(index, removed);
            return Err(e.into());
        }
        info!(%post_id, "Deleted post");
        Ok(true)
    }

    /// Read-only search over all posts, newest first.
    pub fn search_posts(&self, query: &str, kind: Option<PostKind>) -> Vec<Post> {
        let results = search::search_posts(&self.posts, query, kind);
        debug!(query, kind = ?kind, hits = results.len(), "Searched posts");
        results
    }

    // --- Snapshots ---

    pub fn state(&self) -> &AuthState {
        &self.state
    }

    pub fn is_loading(&self) -> bool {
        !self.is_ready()
    }

    pub fn current_user(&self) -> Option<&User> {
        match &self.state {
            AuthState::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    pub fn session(&self) -> Option<Session> {
        self.current_user().map(Session::from)
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    /// Posts created by `user_id`, in insertion order.
    pub fn posts_by(&self, user_id: &UserId) -> Vec<Post> {
        self.posts
            .iter()
            .filter(|p| &p.posted_by == user_id)
            .cloned()
            .collect()
    }

    pub fn stats(&self) -> BoardStats {
        let lost_posts = self.posts.iter().filter(|p| p.kind == PostKind::Lost).count();
        BoardStats {
            total_users: self.users.len(),
            total_posts: self.posts.len(),
            lost_posts,
            found_posts: self.posts.len() - lost_posts,
        }
    }

    fn is_ready(&self) -> bool {
        matches!(
            self.state,
            AuthState::Unauthenticated | AuthState::Authenticated(_)
        )
    }

    fn ensure_ready(&self) -> StoreResult<()> {
        if self.is_ready() {
            Ok(())
        } else {
            Err(StoreError::NotReady)
        }
    }
}
