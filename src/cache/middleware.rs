//! Page cache middleware.
//!
//! Serves stored pages for `GET` requests and stores fresh `200` responses.
//! The key is the URL plus the viewer resolved by the session layer, which
//! must run before this middleware.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderName, HeaderValue, Method, Request, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use metrics::{counter, gauge};
use tracing::{debug, instrument};

use crate::application::auth::Viewer;

use super::{
    CacheConfig, PageStore,
    keys::{PageKey, ViewerKey},
    store::CachedResponse,
};

const MAX_CACHED_BODY_BYTES: usize = 1024 * 1024;

pub const CACHE_STATUS_HEADER: &str = "x-cache";

#[derive(Clone)]
pub struct CacheState {
    pub config: CacheConfig,
    pub store: Arc<PageStore>,
}

impl CacheState {
    pub fn new(config: CacheConfig) -> Self {
        let store = Arc::new(PageStore::new(&config));
        Self { config, store }
    }

    /// Forget every stored page.
    pub fn clear(&self) {
        self.store.clear();
    }
}

#[instrument(skip_all, fields(path = %request.uri().path()))]
pub async fn page_cache_layer(
    State(cache): State<CacheState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if !cache.config.enabled || request.method() != Method::GET {
        return next.run(request).await;
    }

    let viewer = match request.extensions().get::<Viewer>() {
        Some(Viewer(Some(user))) => ViewerKey::User(user.id),
        _ => ViewerKey::Anonymous,
    };
    let key = PageKey::new(request.uri().path(), request.uri().query(), viewer);

    if let Some(cached) = cache.store.get(&key, Instant::now()) {
        counter!("yatube_page_cache_hit_total").increment(1);
        debug!(cache = "page", outcome = "hit", "serving cached page");
        return build_response(cached);
    }
    counter!("yatube_page_cache_miss_total").increment(1);

    let response = next.run(request).await;
    if response.status() != StatusCode::OK || response.headers().contains_key(header::SET_COOKIE)
    {
        return response;
    }

    let (parts, body) = response.into_parts();
    let bytes = match axum::body::to_bytes(body, MAX_CACHED_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(_) => return StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    };

    let cached = CachedResponse {
        status: parts.status.as_u16(),
        headers: parts
            .headers
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.to_string(), value.to_string()))
            })
            .collect(),
        body: bytes.clone(),
    };
    cache.store.insert(key, cached, Instant::now());
    counter!("yatube_page_cache_store_total").increment(1);
    gauge!("yatube_page_cache_entries").set(cache.store.len() as f64);
    debug!(cache = "page", outcome = "store", "page cached");

    Response::from_parts(parts, Body::from(bytes))
}

fn build_response(cached: CachedResponse) -> Response {
    let mut builder = Response::builder().status(cached.status);
    for (name, value) in cached.headers {
        if let (Ok(name), Ok(value)) = (
            HeaderName::try_from(name.as_str()),
            HeaderValue::from_str(&value),
        ) {
            builder = builder.header(name, value);
        }
    }
    builder = builder.header(CACHE_STATUS_HEADER, HeaderValue::from_static("hit"));

    builder
        .body(Body::from(cached.body))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}
