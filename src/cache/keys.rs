//! Cache key definitions.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Whose page is cached. Pages carry the viewer's navigation, so every
/// signed-in user gets separate entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewerKey {
    Anonymous,
    User(i64),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PageKey {
    pub path: String,
    pub query_hash: u64,
    pub viewer: ViewerKey,
}

impl PageKey {
    pub fn new(path: &str, query: Option<&str>, viewer: ViewerKey) -> Self {
        Self {
            path: path.to_string(),
            query_hash: hash_query(query.unwrap_or("")),
            viewer,
        }
    }
}

/// Hash a query string for page keys.
pub fn hash_query(query: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    query.hash(&mut hasher);
    hasher.finish()
}
