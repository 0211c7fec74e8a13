// Metrics module for Prometheus observability
// Author: kelexine (https://github.com/kelexine)

mod registry;

pub use registry::{gather_metrics, CACHE_OPERATIONS, COMPUTE_DURATION, QUERIES_TOTAL};

/// Helper to record cache operations
pub fn record_cache_hit() {
    CACHE_OPERATIONS.with_label_values(&["hit"]).inc();
}

pub fn record_cache_miss() {
    CACHE_OPERATIONS.with_label_values(&["miss"]).inc();
}

pub fn record_cache_set() {
    CACHE_OPERATIONS.with_label_values(&["set"]).inc();
}

pub fn record_cache_error() {
    CACHE_OPERATIONS.with_label_values(&["error"]).inc();
}

pub fn record_cache_clear() {
    CACHE_OPERATIONS.with_label_values(&["clear"]).inc();
}

/// Helper to record where a query answer came from
pub fn record_query(query: &str, from_cache: bool) {
    let source = if from_cache { "cache" } else { "computed" };
    QUERIES_TOTAL.with_label_values(&[query, source]).inc();
}

/// Helper to record aggregation time on a miss
pub fn record_compute(query: &str, duration_secs: f64) {
    COMPUTE_DURATION
        .with_label_values(&[query])
        .observe(duration_secs);
}
