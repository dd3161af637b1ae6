//! Whole-page response cache.
//!
//! Rendered pages are kept for a fixed time and served as-is until they
//! expire or the cache is cleared. Nothing here listens for writes: a post
//! created or deleted after a page was stored only shows up once that entry
//! is gone.
//!
//! ```toml
//! [cache]
//! enabled = true
//! index_ttl_seconds = 20
//! max_entries = 256
//! sweep_interval_seconds = 60
//! ```

mod config;
mod keys;
mod middleware;
mod store;

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::debug;

pub use config::CacheConfig;
pub use keys::{PageKey, ViewerKey, hash_query};
pub use middleware::{CACHE_STATUS_HEADER, CacheState, page_cache_layer};
pub use store::{CachedResponse, PageStore};

/// Periodically drop expired pages so idle entries do not hold memory.
pub fn spawn_sweeper(store: Arc<PageStore>, config: &CacheConfig) -> JoinHandle<()> {
    let period = config.sweep_interval();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let purged = store.purge_expired(std::time::Instant::now());
            if purged > 0 {
                debug!(
                    target = "yatube::cache::sweeper",
                    purged,
                    remaining = store.len(),
                    "expired pages purged"
                );
            }
        }
    })
}
