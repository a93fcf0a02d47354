//! Metrics collection.
//!
//! # Metrics
//! - `tracker_navigations_total` (counter): navigations by resolution kind
//! - `tracker_fallback_total` (counter): paths that fell through to not-found
//! - `tracker_shell_render_seconds` (histogram): synchronous steps 1–5 + 7
//! - `tracker_stale_writes_total` (counter): DOM writes dropped by a cancelled cycle

use std::time::Instant;

use crate::routing::router::MatchSource;

/// Record a completed synchronous navigation cycle.
pub fn record_navigation(source: &MatchSource, started: Instant) {
    metrics::counter!("tracker_navigations_total", "kind" => source.kind()).increment(1);
    if matches!(source, MatchSource::Fallback) {
        metrics::counter!("tracker_fallback_total").increment(1);
    }
    metrics::histogram!("tracker_shell_render_seconds").record(started.elapsed().as_secs_f64());
}

/// Record a DOM write skipped because its cycle was superseded.
pub fn record_stale_write() {
    metrics::counter!("tracker_stale_writes_total").increment(1);
}
