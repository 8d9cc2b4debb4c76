//! Prometheus metrics for blog-service.
//!
//! Exposes feed, post and follow collectors and an HTTP handler for the
//! `/metrics` endpoint.

use actix_web::HttpResponse;
use lazy_static::lazy_static;
use prometheus::{
    register_int_counter, register_int_counter_vec, Encoder, IntCounter, IntCounterVec,
    TextEncoder,
};

lazy_static! {
    /// Feed cache events segmented by feed and outcome (hit/miss/invalidate).
    pub static ref FEED_CACHE_EVENTS: IntCounterVec = register_int_counter_vec!(
        "blog_feed_cache_events_total",
        "Feed cache events segmented by feed and outcome",
        &["feed", "event"]
    )
    .expect("failed to register blog_feed_cache_events_total");

    /// Posts successfully created.
    pub static ref POSTS_CREATED_TOTAL: IntCounter = register_int_counter!(
        "blog_posts_created_total",
        "Total posts created"
    )
    .expect("failed to register blog_posts_created_total");

    /// Follow graph changes segmented by action (follow/unfollow).
    pub static ref FOLLOW_CHANGES_TOTAL: IntCounterVec = register_int_counter_vec!(
        "blog_follow_changes_total",
        "Follow edges created or removed",
        &["action"]
    )
    .expect("failed to register blog_follow_changes_total");
}

/// Actix handler that renders Prometheus metrics in text format.
pub async fn serve_metrics() -> HttpResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        return HttpResponse::InternalServerError().body(err.to_string());
    }

    HttpResponse::Ok()
        .content_type(encoder.format_type())
        .body(buffer)
}
