//! services/board/src/adapters/local_storage.rs
//!
//! This module contains the storage adapter, which is the concrete implementation
//! of the `BoardRepository` port from the core crate. It stores each collection
//! under its own key in a `KeyValueStore`, using the versioned record format.

use async_trait::async_trait;
use lost_found_core::domain::{Post, Session, User};
use lost_found_core::ports::{BoardRepository, PortResult};
use tracing::debug;

use super::kv::KeyValueStore;
use super::records::{self, POSTS_KEY, SESSION_KEY, USERS_KEY};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A local-storage adapter that implements the `BoardRepository` port.
#[derive(Clone)]
pub struct LocalStorageAdapter<S> {
    storage: S,
}

impl<S: KeyValueStore> LocalStorageAdapter<S> {
    /// Creates a new `LocalStorageAdapter` over the given backend.
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// The underlying key-value backend.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    async fn write(&self, key: &str, value: String) -> PortResult<()> {
        debug!(key, bytes = value.len(), "Persisting record");
        self.storage.set(key, &value).await
    }
}

//=========================================================================================
// `BoardRepository` Trait Implementation
//=========================================================================================

#[async_trait]
impl<S: KeyValueStore> BoardRepository for LocalStorageAdapter<S> {
    async fn load_users(&self) -> PortResult<Vec<User>> {
        match self.storage.get(USERS_KEY).await? {
            Some(raw) => records::decode_users(&raw),
            None => Ok(Vec::new()),
        }
    }

    async fn save_users(&self, users: &[User]) -> PortResult<()> {
        self.write(USERS_KEY, records::encode_users(users)?).await
    }

    async fn load_posts(&self) -> PortResult<Vec<Post>> {
        match self.storage.get(POSTS_KEY).await? {
            Some(raw) => records::decode_posts(&raw),
            None => Ok(Vec::new()),
        }
    }

    async fn save_posts(&self, posts: &[Post]) -> PortResult<()> {
        self.write(POSTS_KEY, records::encode_posts(posts)?).await
    }

    async fn load_session(&self) -> PortResult<Option<Session>> {
        self.storage
            .get(SESSION_KEY)
            .await?
            .map(|raw| records::decode_session(&raw))
            .transpose()
    }

    async fn save_session(&self, session: &Session) -> PortResult<()> {
        self.write(SESSION_KEY, records::encode_session(session)?).await
    }

    async fn clear_session(&self) -> PortResult<()> {
        debug!(key = SESSION_KEY, "Removing record");
        self.storage.remove(SESSION_KEY).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::kv::{FileKeyValueStore, MemoryKeyValueStore};
    use lost_found_core::domain::{AuthState, PostKind, Role};
    use lost_found_core::ports::PortError;
    use lost_found_core::store::{LocalDataStore, StoreError};
    use std::collections::HashSet;
    use std::sync::Arc;

    #[tokio::test]
    async fn empty_storage_loads_empty_collections() {
        let adapter = LocalStorageAdapter::new(MemoryKeyValueStore::new());
        assert!(adapter.load_users().await.unwrap().is_empty());
        assert!(adapter.load_posts().await.unwrap().is_empty());
        assert!(adapter.load_session().await.unwrap().is_none());
        adapter.clear_session().await.unwrap();
    }

    #[tokio::test]
    async fn store_round_trips_through_memory_backend() {
        let kv = MemoryKeyValueStore::new();

        let mut store = LocalDataStore::new(Arc::new(LocalStorageAdapter::new(kv.clone())));
        store.initialize().await.unwrap();
        store.register("a@x.com", "secret", Role::Lost).await.unwrap();
        store
            .create_post("Wallet", "black leather", "Main St", PostKind::Lost, "")
            .await
            .unwrap();
        store.logout().await.unwrap();
        let user = store.register("b@x.com", "secret", Role::Found).await.unwrap();
        store
            .create_post("Keys", "a ring of three", "Gym", PostKind::Found, "")
            .await
            .unwrap();

        let mut restarted = LocalDataStore::new(Arc::new(LocalStorageAdapter::new(kv)));
        restarted.initialize().await.unwrap();

        let before: HashSet<_> = store.posts().iter().map(|p| format!("{:?}", p)).collect();
        let after: HashSet<_> = restarted.posts().iter().map(|p| format!("{:?}", p)).collect();
        assert_eq!(before, after);
        assert_eq!(restarted.users(), store.users());
        assert_eq!(restarted.state(), &AuthState::Authenticated(user));
    }

    #[tokio::test]
    async fn store_round_trips_through_file_backend() {
        let dir = std::env::temp_dir().join(format!("board_adapter_{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);

        let mut store = LocalDataStore::new(Arc::new(LocalStorageAdapter::new(
            FileKeyValueStore::new(&dir),
        )));
        store.initialize().await.unwrap();
        store.register("a@x.com", "secret", Role::Lost).await.unwrap();
        store
            .create_post("Wallet", "black leather", "Main St", PostKind::Lost, "")
            .await
            .unwrap();
        store.logout().await.unwrap();
        assert!(!dir.join("currentSession.json").exists());

        let mut restarted = LocalDataStore::new(Arc::new(LocalStorageAdapter::new(
            FileKeyValueStore::new(&dir),
        )));
        restarted.initialize().await.unwrap();
        assert_eq!(restarted.users(), store.users());
        assert_eq!(restarted.posts(), store.posts());
        assert_eq!(restarted.state(), &AuthState::Unauthenticated);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn corrupt_record_keeps_store_loading() {
        let kv = MemoryKeyValueStore::new();
        kv.set(USERS_KEY, r#"{"version":99,"users":[]}"#).await.unwrap();

        let mut store = LocalDataStore::new(Arc::new(LocalStorageAdapter::new(kv)));
        let err = store.initialize().await.unwrap_err();
        assert!(matches!(err, StoreError::Storage(PortError::Corrupt { .. })));
        assert!(store.is_loading());
    }

    #[tokio::test]
    async fn legacy_session_for_missing_user_is_removed() {
        let kv = MemoryKeyValueStore::new();
        kv.set(USERS_KEY, "[]").await.unwrap();
        kv.set(SESSION_KEY, r#"{"userId":"42","role":"lost","email":"gone@x.com"}"#)
            .await
            .unwrap();

        let mut store = LocalDataStore::new(Arc::new(LocalStorageAdapter::new(kv.clone())));
        store.initialize().await.unwrap();
        assert_eq!(store.state(), &AuthState::Unauthenticated);
        assert!(kv.get(SESSION_KEY).await.unwrap().is_none());
    }
}
