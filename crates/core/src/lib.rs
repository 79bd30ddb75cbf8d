#![warn(clippy::all, missing_docs)]

//! Core inventory logic for gridbag.
//!
//! This crate hosts the item model, the inventory store with its
//! storage backends, the simulated game-data fetch, and configuration
//! used by the terminal UI and any future frontends.

pub mod config;
pub mod error;
pub mod game_data;
pub mod models;
pub mod storage;
pub mod store;

pub use config::AppConfig;
pub use error::{StoreError, StoreResult};
pub use game_data::GameDataLoader;
pub use models::{GameData, Item};
pub use storage::{FileStorage, KeyValueStorage, MemoryStorage};
pub use store::{InventoryStore, STORAGE_KEY};
