//! In-memory page store with per-entry expiry and LRU eviction.

use std::sync::{LockResult, RwLock};
use std::time::{Duration, Instant};

use bytes::Bytes;
use lru::LruCache;
use metrics::counter;
use tracing::warn;

use super::config::CacheConfig;
use super::keys::PageKey;

#[derive(Debug, Clone)]
pub struct CachedResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

#[derive(Debug)]
struct Entry {
    response: CachedResponse,
    expires_at: Instant,
}

pub struct PageStore {
    entries: RwLock<LruCache<PageKey, Entry>>,
    ttl: Duration,
}

impl PageStore {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            entries: RwLock::new(LruCache::new(config.max_entries_non_zero())),
            ttl: config.index_ttl(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Fetch a live entry. An expired entry is removed and reported as a miss.
    pub fn get(&self, key: &PageKey, now: Instant) -> Option<CachedResponse> {
        let mut entries = recover(self.entries.write(), "get");
        let expired = entries.peek(key).map(|entry| entry.expires_at <= now)?;
        if expired {
            entries.pop(key);
            counter!("yatube_page_cache_expired_total").increment(1);
            return None;
        }
        entries.get(key).map(|entry| entry.response.clone())
    }

    /// Store a page, returning the key pushed out to make room, if any.
    pub fn insert(&self, key: PageKey, response: CachedResponse, now: Instant) -> Option<PageKey> {
        let entry = Entry {
            response,
            expires_at: now + self.ttl,
        };
        let mut entries = recover(self.entries.write(), "insert");
        match entries.push(key.clone(), entry) {
            Some((evicted, _)) if evicted != key => {
                counter!("yatube_page_cache_evict_total").increment(1);
                Some(evicted)
            }
            _ => None,
        }
    }

    /// Drop every entry whose lifetime has passed. Returns how many were removed.
    pub fn purge_expired(&self, now: Instant) -> usize {
        let mut entries = recover(self.entries.write(), "purge_expired");
        let expired: Vec<PageKey> = entries
            .iter()
            .filter(|(_, entry)| entry.expires_at <= now)
            .map(|(key, _)| key.clone())
            .collect();
        for key in &expired {
            entries.pop(key);
        }
        if !expired.is_empty() {
            counter!("yatube_page_cache_expired_total").increment(expired.len() as u64);
        }
        expired.len()
    }

    pub fn clear(&self) {
        recover(self.entries.write(), "clear").clear();
    }

    pub fn len(&self) -> usize {
        recover(self.entries.read(), "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn recover<G>(result: LockResult<G>, op: &'static str) -> G {
    result.unwrap_or_else(|poisoned| {
        warn!(
            target = "yatube::cache::store",
            op,
            result = "poisoned_recovered",
            "recovered from poisoned page cache lock"
        );
        poisoned.into_inner()
    })
}
