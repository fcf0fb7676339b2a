//! Loading hunt configuration (run rules, storage, profile defaults) from TOML.
//!
//! See `HuntConfig` and `RunRules` for expected schema. Every field is optional;
//! an empty file yields the stock rules.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::error::{HuntError, HuntResult};

#[derive(Clone, Debug, Deserialize, Default)]
pub struct HuntConfig {
  #[serde(default)]
  pub rules: RunRules,
  #[serde(default)]
  pub storage: StorageConfig,
  #[serde(default)]
  pub profile: ProfileDefaults,
}

/// Numeric policy for a run. Defaults are the canonical treasure hunt rules.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct RunRules {
  pub max_questions: u32,
  pub round_secs: u32,
  /// Correct answers at or under this many seconds earn the speed bonus.
  pub fast_secs: u32,
  pub max_hints: u8,
  pub skip_penalty: i64,
  pub streak_bonus: i64,
  pub streak_every: u32,
  pub leaderboard_cap: usize,
}

impl Default for RunRules {
  fn default() -> Self {
    Self {
      max_questions: 10,
      round_secs: 60,
      fast_secs: 30,
      max_hints: 3,
      skip_penalty: 2,
      streak_bonus: 2,
      streak_every: 3,
      leaderboard_cap: 20,
    }
  }
}

impl RunRules {
  pub fn validate(&self) -> HuntResult<()> {
    if self.max_questions == 0 {
      return Err(HuntError::Config("rules.max_questions must be at least 1".into()));
    }
    if self.round_secs == 0 {
      return Err(HuntError::Config("rules.round_secs must be at least 1".into()));
    }
    if self.streak_every == 0 {
      return Err(HuntError::Config("rules.streak_every must be at least 1".into()));
    }
    if self.leaderboard_cap == 0 {
      return Err(HuntError::Config("rules.leaderboard_cap must be at least 1".into()));
    }
    Ok(())
  }

  pub fn fast_threshold(&self) -> Duration {
    Duration::from_secs(u64::from(self.fast_secs))
  }
}

#[derive(Clone, Debug, Deserialize, Default)]
pub struct StorageConfig {
  /// Directory for persisted keys. `HUNT_DATA_DIR` wins over this.
  #[serde(default)] pub data_dir: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ProfileDefaults {
  pub name: String,
  pub avatar: String,
}

impl Default for ProfileDefaults {
  fn default() -> Self {
    Self { name: "Player".into(), avatar: "🦜".into() }
  }
}

impl HuntConfig {
  /// Parse TOML. Invalid rules fall back to the stock rules; storage and
  /// profile sections are kept either way.
  pub fn from_toml_str(s: &str) -> HuntResult<Self> {
    let mut cfg: HuntConfig = toml::from_str(s)?;
    if let Err(e) = cfg.rules.validate() {
      error!(target: "treasure_hunt", error = %e, "Invalid [rules]; using default rules");
      cfg.rules = RunRules::default();
    }
    Ok(cfg)
  }

  /// Resolve the persistence directory: env, then TOML, then `./data`.
  pub fn data_dir(&self) -> String {
    std::env::var("HUNT_DATA_DIR")
      .ok()
      .filter(|s| !s.trim().is_empty())
      .or_else(|| self.storage.data_dir.clone())
      .unwrap_or_else(|| "./data".into())
  }
}

/// Attempt to load `HuntConfig` from HUNT_CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_hunt_config_from_env() -> Option<HuntConfig> {
  let path = std::env::var("HUNT_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match HuntConfig::from_toml_str(&s) {
      Ok(cfg) => {
        info!(target: "treasure_hunt", %path, "Loaded hunt config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "treasure_hunt", %path, error = %e, "Failed to load TOML config; using defaults");
        None
      }
    },
    Err(e) => {
      error!(target: "treasure_hunt", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}
