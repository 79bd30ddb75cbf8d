//! Simulated fetch of game metadata.

use std::time::Duration;

use tokio::time::sleep;
use tracing::info;

use crate::models::GameData;

/// Delay applied before the mock game data becomes available.
pub const DEFAULT_FETCH_DELAY: Duration = Duration::from_millis(1_000_500);

/// Produces [`GameData`] after a fixed delay, standing in for a network request.
#[derive(Debug, Clone)]
pub struct GameDataLoader {
    delay: Duration,
}

impl Default for GameDataLoader {
    fn default() -> Self {
        Self::new(DEFAULT_FETCH_DELAY)
    }
}

impl GameDataLoader {
    /// Create a loader that waits `delay` before resolving.
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    /// Configured delay.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Wait for the configured delay and return the mock record. Never fails.
    pub async fn fetch(&self) -> GameData {
        sleep(self.delay).await;
        info!(delay_ms = self.delay.as_millis() as u64, "game data loaded");
        GameData {
            image: "game-image.jpg".to_string(),
            name: "Some name".to_string(),
            description: "Some decription".to_string(),
        }
    }
}
