//! services/board/src/bin/board.rs

use board_lib::{
    adapters::{FileKeyValueStore, LocalStorageAdapter, MemoryKeyValueStore},
    config::{Config, StorageBackend},
    console::Console,
    error::BoardError,
};
use lost_found_core::{BoardRepository, LocalDataStore};
use std::sync::Arc;
use tokio::io::BufReader;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), BoardError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Config::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
    info!("Configuration loaded. Starting board...");

    // --- 2. Choose the Storage Backend ---
    let repo: Arc<dyn BoardRepository> = match config.storage {
        StorageBackend::File => {
            info!("Using file storage in {}", config.data_dir.display());
            Arc::new(LocalStorageAdapter::new(FileKeyValueStore::new(
                config.data_dir.clone(),
            )))
        }
        StorageBackend::Memory => {
            info!("Using in-memory storage; nothing will be kept after exit");
            Arc::new(LocalStorageAdapter::new(MemoryKeyValueStore::new()))
        }
    };

    // --- 3. Load the Store ---
    let mut store = LocalDataStore::new(repo);
    if let Err(e) = store.initialize().await {
        error!("Failed to load stored data: {}", e);
        return Err(e.into());
    }

    // --- 4. Run the Console ---
    let mut console = Console::new(store);
    console
        .run(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
        .await?;

    info!("Board closed.");
    Ok(())
}
