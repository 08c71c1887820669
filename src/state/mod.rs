pub mod game;
pub mod leaderboard;
pub mod ledger;
pub mod projection;
pub mod rules;
pub mod violation;

use std::sync::Arc;

use crate::{config::AppConfig, dao::score_store::ScoreStore};

pub type SharedState = Arc<AppState>;

/// Central application state: the store handle and the runtime configuration.
pub struct AppState {
    store: Arc<dyn ScoreStore>,
    config: AppConfig,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    pub fn new(store: Arc<dyn ScoreStore>, config: AppConfig) -> SharedState {
        Arc::new(Self { store, config })
    }

    /// Handle to the configured score store.
    pub fn store(&self) -> Arc<dyn ScoreStore> {
        self.store.clone()
    }

    /// Runtime configuration loaded at startup.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}
