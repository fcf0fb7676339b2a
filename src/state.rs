//! Application state: configuration, persistence and the shared leaderboard.
//!
//! This module owns:
//!   - the hunt config (rules + profile defaults), from TOML or defaults
//!   - the key-value store (file-backed, or in-memory when the data dir is unusable)
//!   - the leaderboard store shared by every session
//!
//! Run engines are not shared: each WebSocket session builds its own.

use std::sync::Arc;
use tracing::{error, info, instrument};

use crate::config::{load_hunt_config_from_env, HuntConfig};
use crate::engine::RunEngine;
use crate::leaderboard::LeaderboardStore;
use crate::persistence::{load_profile, FileKvStore, KvStore, MemoryKvStore};

#[derive(Clone)]
pub struct AppState {
    pub config: HuntConfig,
    pub kv: Arc<dyn KvStore>,
    pub leaderboard: Arc<LeaderboardStore>,
    /// False when running on the in-memory fallback store.
    pub persistent: bool,
}

impl AppState {
    /// Build state from env: load config, open the data directory, build the leaderboard.
    #[instrument(level = "info", skip_all)]
    pub fn new() -> Self {
        let config = load_hunt_config_from_env().unwrap_or_default();
        let dir = config.data_dir();

        let (kv, persistent): (Arc<dyn KvStore>, bool) = match FileKvStore::open(&dir) {
            Ok(store) => {
                info!(target: "treasure_hunt", dir = %store.dir().display(), "Using file-backed storage");
                (Arc::new(store), true)
            }
            Err(e) => {
                error!(target: "treasure_hunt", %dir, error = %e, "Data directory unusable; leaderboard will not survive restarts");
                (Arc::new(MemoryKvStore::new()), false)
            }
        };

        let state = Self::with_store(config, kv, persistent);
        info!(
            target: "treasure_hunt",
            entries = state.leaderboard.load().len(),
            cap = state.leaderboard.cap(),
            top = ?state.leaderboard.top_score(),
            max_questions = state.config.rules.max_questions,
            round_secs = state.config.rules.round_secs,
            "Startup leaderboard inventory"
        );
        state
    }

    pub fn with_store(config: HuntConfig, kv: Arc<dyn KvStore>, persistent: bool) -> Self {
        let leaderboard = Arc::new(LeaderboardStore::new(kv.clone(), config.rules.leaderboard_cap));
        Self { config, kv, leaderboard, persistent }
    }

    /// A fresh engine for one player session, stamped with the stored profile.
    #[instrument(level = "debug", skip(self))]
    pub fn new_engine(&self) -> RunEngine {
        let profile = load_profile(self.kv.as_ref(), &self.config.profile);
        RunEngine::new(self.config.rules.clone(), profile, self.leaderboard.clone())
    }

    #[cfg(test)]
    pub fn in_memory() -> Self {
        Self::with_store(HuntConfig::default(), Arc::new(MemoryKvStore::new()), false)
    }
}
