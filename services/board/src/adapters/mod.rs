pub mod kv;
pub mod local_storage;
pub mod records;

pub use kv::{FileKeyValueStore, KeyValueStore, MemoryKeyValueStore};
pub use local_storage::LocalStorageAdapter;
