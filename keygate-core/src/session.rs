//! The active session index: a time-indexed cache of currently-valid keys.
//!
//! An entry means "this key was valid as of the last check". Absence means
//! nothing: the registry stays authoritative and a miss simply falls
//! through to it. Expired entries are dropped lazily on lookup and in bulk
//! by the sweeper; removal is idempotent either way.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Cached view of one currently-valid key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionEntry {
    /// The key this session belongs to.
    pub key: String,
    /// Owner fixed at activation.
    pub player_id: String,
    /// Bound device fingerprint, if the key is device-bound.
    pub hwid: Option<String>,
    /// When this entry was written (epoch seconds).
    pub created_at: i64,
    /// Absolute expiry mirrored from the registry record.
    pub expires_at: i64,
}

impl SessionEntry {
    /// Seconds of validity left at `now`.
    #[must_use]
    pub fn remaining_secs(&self, now: i64) -> i64 {
        self.expires_at - now
    }
}

/// In-memory index of active sessions, keyed by access key.
#[derive(Debug, Default)]
pub struct SessionIndex {
    entries: HashMap<String, SessionEntry>,
}

impl SessionIndex {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up the entry for `key`, evicting it first if it has expired.
    pub fn lookup(&mut self, key: &str, now: i64) -> Option<&SessionEntry> {
        let expired = match self.entries.get(key) {
            Some(entry) => now >= entry.expires_at,
            None => return None,
        };
        if expired {
            self.entries.remove(key);
            return None;
        }
        self.entries.get(key)
    }

    /// Inserts or wholesale-replaces the entry for its key.
    pub fn put(&mut self, entry: SessionEntry) {
        self.entries.insert(entry.key.clone(), entry);
    }

    /// Removes the entry for `key`, returning true if one was present.
    pub fn remove(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Removes every entry whose expiry has passed, returning how many.
    pub fn evict_expired(&mut self, now: i64) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.expires_at > now);
        before - self.entries.len()
    }

    /// Number of resident entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no sessions are resident.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
