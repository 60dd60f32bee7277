// Periodic maintenance: expired reset records and idle rate limiter keys

use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::app::AppState;

pub struct BackgroundTaskManager {
    state: AppState,
    interval: Duration,
}

impl BackgroundTaskManager {
    pub fn new(state: AppState, interval: Duration) -> Self {
        Self { state, interval }
    }

    /// One maintenance pass
    pub async fn run_once(&self) {
        match self.state.auth.purge_expired_password_resets().await {
            Ok(0) => {},
            Ok(purged) => info!(purged, "Purged expired password reset tokens"),
            Err(e) => error!("Failed to purge password reset tokens: {}", e),
        }

        self.state.verification_limiter.retain_recent();
        self.state.verification_limiter.shrink_to_fit();
        debug!(
            tracked_keys = self.state.verification_limiter.len(),
            "Rate limiter state compacted"
        );
    }

    /// Spawn the maintenance loop on the runtime
    pub fn start(self) -> JoinHandle<()> {
        info!(interval_secs = self.interval.as_secs(), "Starting background tasks");
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            // The first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                self.run_once().await;
            }
        })
    }
}

/// Initialize background tasks (call this in main.rs)
pub fn initialize_background_tasks(state: AppState, interval: Duration) -> JoinHandle<()> {
    BackgroundTaskManager::new(state, interval).start()
}
