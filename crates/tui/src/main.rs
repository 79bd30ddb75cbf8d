mod app;

use anyhow::{Context, Result};
use std::fs::{self, OpenOptions};

use gridbag_core::{
    config::{self, AppConfig},
    FileStorage, GameDataLoader, InventoryStore,
};
use tracing::info;
use tracing_subscriber::{prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging()?;

    config::ensure_default_config()?;
    let config = AppConfig::load()?;

    let storage = FileStorage::new(&config.storage_root);
    let mut store = InventoryStore::new(storage);
    store
        .load_from_storage()
        .with_context(|| format!("failed to load inventory from {}", config.storage_root.display()))?;
    info!(
        root = %config.storage_root.display(),
        items = store.items().len(),
        "inventory ready"
    );

    let loader = GameDataLoader::new(config.game_data_delay());
    let mut app = app::GridbagApp::new(store, loader, config.grid_columns, config.grid_rows);
    app.run().await
}

fn init_logging() -> Result<()> {
    let log_dir = std::env::current_dir()?.join("logs");
    fs::create_dir_all(&log_dir)?;
    let log_path = log_dir.join("gridbag.log");

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // Stdout belongs to the alternate screen, so events only go to the file.
    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .compact()
        .with_ansi(false)
        .with_writer(move || {
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(&log_path)
                .expect("failed to open log file")
        });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .init();

    Ok(())
}
