use leaderboard_core::{LeaderboardResponse, SessionId};
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

const ALL_SESSIONS: &str = "all";

/// Distinct request options are distinct entries
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub token_id: String,
    /// Session id, or `"all"` when none was requested
    pub session: String,
    pub limit: usize,
    pub use_fast_path: bool,
}

impl CacheKey {
    pub fn new(
        token_id: &str,
        session: Option<&SessionId>,
        limit: usize,
        use_fast_path: bool,
    ) -> Self {
        Self {
            token_id: token_id.to_string(),
            session: session
                .map(|id| id.to_string())
                .unwrap_or_else(|| ALL_SESSIONS.to_string()),
            limit,
            use_fast_path,
        }
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: LeaderboardResponse,
    stored_at: Instant,
}

/// Short-lived memo of leaderboard responses.
///
/// Entries expire `ttl` after they were written; expiry is checked on read.
/// Concurrent misses may both recompute, and the last write wins.
#[derive(Debug)]
pub struct ResultCache {
    ttl: Duration,
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
}

impl ResultCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn get(&self, key: &CacheKey) -> Option<LeaderboardResponse> {
        let now = Instant::now();
        let mut expired = false;

        if let Ok(entries) = self.entries.read() {
            match entries.get(key) {
                Some(entry) if now.duration_since(entry.stored_at) < self.ttl => {
                    debug!("🎯 Cache hit for {:?}", key);
                    return Some(entry.value.clone());
                }
                Some(_) => expired = true,
                None => {}
            }
        }

        if expired {
            if let Ok(mut entries) = self.entries.write() {
                // Another writer may have refreshed it in between
                let still_stale = entries
                    .get(key)
                    .map_or(false, |entry| now.duration_since(entry.stored_at) >= self.ttl);
                if still_stale {
                    entries.remove(key);
                    debug!("⌛ Cache entry expired for {:?}", key);
                }
            }
        }

        None
    }

    pub fn put(&self, key: CacheKey, value: LeaderboardResponse) {
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(
                key,
                CacheEntry {
                    value,
                    stored_at: Instant::now(),
                },
            );
        }
    }

    /// Drop every entry for the token; returns how many were removed
    pub fn invalidate(&self, token_id: &str) -> usize {
        match self.entries.write() {
            Ok(mut entries) => {
                let before = entries.len();
                entries.retain(|key, _| key.token_id != token_id);
                let removed = before - entries.len();
                debug!("🧹 Invalidated {} cache entries for {}", removed, token_id);
                removed
            }
            Err(_) => 0,
        }
    }

    pub fn invalidate_all(&self) -> usize {
        match self.entries.write() {
            Ok(mut entries) => {
                let removed = entries.len();
                entries.clear();
                debug!("🧹 Cleared {} cache entries", removed);
                removed
            }
            Err(_) => 0,
        }
    }

    /// Entries currently held, expired ones included
    pub fn len(&self) -> usize {
        self.entries.read().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
