//! Key-value persistence used for profile fields and the leaderboard blob.
//!
//! `FileKvStore` keeps one file per key under a data directory and replaces
//! values with a temp-file + rename, so a reader never sees a half-written value.
//! `MemoryKvStore` backs tests and the degraded mode when the directory is unusable.

use std::{
    collections::HashMap,
    fs::{self, File},
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
    sync::RwLock,
};

use tracing::{debug, instrument};

use crate::config::ProfileDefaults;
use crate::domain::Profile;
use crate::error::{HuntError, HuntResult};

pub const LEADERBOARD_KEY: &str = "qr_lb_v1";
pub const PLAYER_NAME_KEY: &str = "qr_player_name";
pub const PLAYER_AVATAR_KEY: &str = "qr_player_avatar";

pub trait KvStore: Send + Sync {
    fn get(&self, key: &str) -> HuntResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> HuntResult<()>;
}

#[derive(Debug)]
pub struct FileKvStore {
    dir: PathBuf,
}

impl FileKvStore {
    /// Open (and create if needed) the data directory.
    pub fn open(dir: impl AsRef<Path>) -> HuntResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> HuntResult<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(HuntError::Config(format!("invalid storage key: {:?}", key)));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

impl KvStore for FileKvStore {
    #[instrument(level = "debug", skip(self))]
    fn get(&self, key: &str) -> HuntResult<Option<String>> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(level = "debug", skip(self, value), fields(value_len = value.len()))]
    fn set(&self, key: &str, value: &str) -> HuntResult<()> {
        let path = self.path_for(key)?;
        let tmp = self.dir.join(format!(".{}.tmp", key));
        write_synced(&tmp, value.as_bytes())?;
        fs::rename(&tmp, &path)?;
        debug!(target: "leaderboard", path = %path.display(), "Persisted key");
        Ok(())
    }
}

/// Write `bytes` to `path` and flush them to disk before returning.
/// The rename that follows must never publish a file whose data is still in the page cache.
fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

#[derive(Debug, Default)]
pub struct MemoryKvStore {
    inner: RwLock<HashMap<String, String>>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryKvStore {
    fn get(&self, key: &str) -> HuntResult<Option<String>> {
        let map = self
            .inner
            .read()
            .map_err(|_| HuntError::Config("memory store poisoned".into()))?;
        Ok(map.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> HuntResult<()> {
        let mut map = self
            .inner
            .write()
            .map_err(|_| HuntError::Config("memory store poisoned".into()))?;
        map.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Read the player profile. Missing or blank fields fall back to the defaults.
pub fn load_profile(kv: &dyn KvStore, defaults: &ProfileDefaults) -> Profile {
    let read = |key: &str, fallback: &str| {
        kv.get(key)
            .unwrap_or_else(|e| {
                tracing::warn!(target: "treasure_hunt", %key, error = %e, "Profile field unreadable; using default");
                None
            })
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| fallback.to_string())
    };
    Profile {
        name: read(PLAYER_NAME_KEY, &defaults.name),
        avatar: read(PLAYER_AVATAR_KEY, &defaults.avatar),
    }
}
