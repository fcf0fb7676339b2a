//! Persisted leaderboard: sorted descending by score, capped, append-only.
//!
//! The whole read → build entry → insert → sort → truncate → write cycle runs
//! under one lock so concurrent sessions never interleave on the blob.

use std::sync::{Arc, Mutex};

use tracing::{error, info, instrument, warn};

use crate::domain::LeaderboardEntry;
use crate::error::{HuntError, HuntResult};
use crate::persistence::{KvStore, LEADERBOARD_KEY};

/// Insert, stable-sort descending by score, truncate to `cap`.
pub fn insert_ranked(board: &mut Vec<LeaderboardEntry>, entry: LeaderboardEntry, cap: usize) {
    board.push(entry);
    board.sort_by(|a, b| b.score.cmp(&a.score));
    board.truncate(cap);
}

pub struct LeaderboardStore {
    kv: Arc<dyn KvStore>,
    cap: usize,
    lock: Mutex<()>,
}

impl LeaderboardStore {
    pub fn new(kv: Arc<dyn KvStore>, cap: usize) -> Self {
        Self { kv, cap, lock: Mutex::new(()) }
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    /// Persisted entries, or an empty board when nothing (readable) is stored.
    pub fn load(&self) -> Vec<LeaderboardEntry> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        self.load_unlocked()
    }

    pub fn top_score(&self) -> Option<i64> {
        self.load().iter().map(|e| e.score).max()
    }

    #[cfg(test)]
    pub fn append(&self, entry: LeaderboardEntry) -> HuntResult<Vec<LeaderboardEntry>> {
        self.record(|_| entry).1
    }

    /// Build an entry from the current board and append it, atomically.
    ///
    /// The built entry is returned even when persisting fails; in that case the
    /// stored board is left exactly as it was.
    #[instrument(level = "info", skip_all)]
    pub fn record<F>(&self, build: F) -> (LeaderboardEntry, HuntResult<Vec<LeaderboardEntry>>)
    where
        F: FnOnce(&[LeaderboardEntry]) -> LeaderboardEntry,
    {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut board = self.load_unlocked();
        let entry = build(&board);
        insert_ranked(&mut board, entry.clone(), self.cap);

        let saved = serde_json::to_string(&board)
            .map_err(HuntError::from)
            .and_then(|blob| self.kv.set(LEADERBOARD_KEY, &blob))
            .map(|_| board);

        match &saved {
            Ok(b) => info!(target: "leaderboard", name = %entry.name, score = entry.score, size = b.len(), "Leaderboard entry recorded"),
            Err(e) => error!(target: "leaderboard", name = %entry.name, score = entry.score, error = %e, "Failed to persist leaderboard"),
        }
        (entry, saved)
    }

    fn load_unlocked(&self) -> Vec<LeaderboardEntry> {
        let raw = match self.kv.get(LEADERBOARD_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!(target: "leaderboard", error = %e, "Leaderboard unreadable; treating as empty");
                return Vec::new();
            }
        };
        match serde_json::from_str::<Vec<LeaderboardEntry>>(&raw) {
            Ok(board) => board,
            Err(e) => {
                warn!(target: "leaderboard", error = %e, "Leaderboard blob is corrupt; treating as empty");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Achievements;
    use crate::persistence::{FileKvStore, MemoryKvStore};
    use proptest::prelude::*;

    fn entry(name: &str, score: i64) -> LeaderboardEntry {
        LeaderboardEntry {
            name: name.into(),
            avatar: "🦜".into(),
            score,
            best_streak: 0,
            achievements: Achievements::default(),
            when: "now".into(),
        }
    }

    fn memory_store(cap: usize) -> LeaderboardStore {
        LeaderboardStore::new(Arc::new(MemoryKvStore::new()), cap)
    }

    #[test]
    fn empty_when_nothing_stored() {
        let store = memory_store(20);
        assert!(store.load().is_empty());
        assert_eq!(store.top_score(), None);
    }

    #[test]
    fn append_sorts_descending() {
        let store = memory_store(20);
        store.append(entry("a", 5)).unwrap();
        store.append(entry("b", 9)).unwrap();
        store.append(entry("c", -2)).unwrap();
        let scores: Vec<i64> = store.load().iter().map(|e| e.score).collect();
        assert_eq!(scores, vec![9, 5, -2]);
        assert_eq!(store.top_score(), Some(9));
    }

    #[test]
    fn ties_keep_insertion_order() {
        let store = memory_store(20);
        store.append(entry("first", 5)).unwrap();
        store.append(entry("second", 5)).unwrap();
        store.append(entry("third", 5)).unwrap();
        let names: Vec<String> = store.load().into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["first", "second", "third"]);
    }

    #[test]
    fn twenty_first_entry_drops_the_lowest() {
        let store = memory_store(20);
        for i in 0..20i64 {
            store.append(entry(&format!("p{i}"), i + 10)).unwrap();
        }
        let board = store.append(entry("late", 15)).unwrap();
        assert_eq!(board.len(), 20);
        assert!(board.iter().all(|e| e.score >= 11));
        assert!(board.iter().any(|e| e.name == "late"));
        assert!(!board.iter().any(|e| e.name == "p0"));
    }

    #[test]
    fn record_sees_board_before_its_own_entry() {
        let store = memory_store(20);
        store.append(entry("a", 7)).unwrap();
        let (built, saved) = store.record(|existing| {
            assert_eq!(existing.len(), 1);
            entry("b", 3)
        });
        assert_eq!(built.name, "b");
        assert_eq!(saved.unwrap().len(), 2);
    }

    #[test]
    fn corrupt_blob_reads_as_empty() {
        let kv = Arc::new(MemoryKvStore::new());
        kv.set(LEADERBOARD_KEY, "{not json").unwrap();
        let store = LeaderboardStore::new(kv, 20);
        assert!(store.load().is_empty());
    }

    struct ReadOnly(MemoryKvStore);

    impl KvStore for ReadOnly {
        fn get(&self, key: &str) -> HuntResult<Option<String>> {
            self.0.get(key)
        }
        fn set(&self, _key: &str, _value: &str) -> HuntResult<()> {
            Err(HuntError::Io(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read only")))
        }
    }

    #[test]
    fn failed_write_leaves_stored_board_untouched() {
        let inner = MemoryKvStore::new();
        inner.set(LEADERBOARD_KEY, &serde_json::to_string(&vec![entry("kept", 4)]).unwrap()).unwrap();
        let store = LeaderboardStore::new(Arc::new(ReadOnly(inner)), 20);
        let (built, saved) = store.record(|_| entry("lost", 99));
        assert_eq!(built.score, 99);
        assert!(saved.is_err());
        let board = store.load();
        assert_eq!(board.len(), 1);
        assert_eq!(board[0].name, "kept");
    }

    #[test]
    fn persisted_through_files() {
        let dir = tempfile::tempdir().unwrap();
        let kv: Arc<dyn KvStore> = Arc::new(FileKvStore::open(dir.path()).unwrap());
        LeaderboardStore::new(kv.clone(), 20).append(entry("a", 1)).unwrap();
        let reopened = LeaderboardStore::new(kv, 20);
        assert_eq!(reopened.load()[0].name, "a");
        let raw = std::fs::read_to_string(dir.path().join("qr_lb_v1.json")).unwrap();
        assert!(raw.contains("\"bestStreak\""));
    }

    proptest! {
        #[test]
        fn board_stays_sorted_and_capped(scores in proptest::collection::vec(-50i64..200, 0..60)) {
            let mut board = Vec::new();
            for (i, s) in scores.iter().enumerate() {
                insert_ranked(&mut board, entry(&i.to_string(), *s), 20);
                prop_assert!(board.len() <= 20);
                prop_assert!(board.windows(2).all(|w| w[0].score >= w[1].score));
            }
            let mut expected = scores.clone();
            expected.sort_by(|a, b| b.cmp(a));
            expected.truncate(20);
            let kept: Vec<i64> = board.iter().map(|e| e.score).collect();
            prop_assert_eq!(kept, expected);
        }
    }
}
