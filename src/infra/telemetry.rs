use std::sync::Once;

use metrics::{Unit, describe_counter, describe_gauge, describe_histogram};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install the process-wide subscriber. Fails if one is already set.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(true).boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })
}

fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            "yatube_page_cache_hit_total",
            Unit::Count,
            "Total number of pages served from the page cache."
        );
        describe_counter!(
            "yatube_page_cache_miss_total",
            Unit::Count,
            "Total number of cacheable requests that missed the page cache."
        );
        describe_counter!(
            "yatube_page_cache_store_total",
            Unit::Count,
            "Total number of rendered pages stored in the page cache."
        );
        describe_counter!(
            "yatube_page_cache_evict_total",
            Unit::Count,
            "Total number of cached pages evicted due to capacity."
        );
        describe_counter!(
            "yatube_page_cache_expired_total",
            Unit::Count,
            "Total number of cached pages dropped after their lifetime ended."
        );
        describe_gauge!(
            "yatube_page_cache_entries",
            Unit::Count,
            "Pages currently held by the page cache."
        );
        describe_counter!(
            "yatube_posts_created_total",
            Unit::Count,
            "Total number of posts published."
        );
        describe_counter!(
            "yatube_comments_created_total",
            Unit::Count,
            "Total number of comments added."
        );
        describe_histogram!(
            "yatube_image_upload_bytes",
            Unit::Bytes,
            "Size of stored post images."
        );
    });
}
