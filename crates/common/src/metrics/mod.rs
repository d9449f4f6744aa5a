//! Metrics and observability utilities
//!
//! Provides Prometheus metrics with standardized naming conventions for
//! the ingestion and analytics paths.

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use std::time::Instant;

/// Metrics prefix for all SalesPulse metrics
pub const METRICS_PREFIX: &str = "salespulse";

/// Histogram buckets for query and ingest latency (in seconds)
pub const LATENCY_BUCKETS: &[f64] = &[
    0.001, // 1ms
    0.005, // 5ms
    0.010, // 10ms
    0.025, // 25ms
    0.050, // 50ms
    0.100, // 100ms
    0.250, // 250ms
    0.500, // 500ms
    1.000, // 1s
    2.500, // 2.5s
    5.000, // 5s
    10.00, // 10s
    30.00, // 30s
];

/// Register all metric descriptions
pub fn register_metrics() {
    // Ingestion metrics
    describe_counter!(
        format!("{}_records_ingested_total", METRICS_PREFIX),
        Unit::Count,
        "Total transaction records ingested"
    );

    describe_counter!(
        format!("{}_records_failed_total", METRICS_PREFIX),
        Unit::Count,
        "Total transaction records rejected during ingestion"
    );

    describe_counter!(
        format!("{}_dimensions_resolved_total", METRICS_PREFIX),
        Unit::Count,
        "Total dimension business keys resolved, labelled by kind"
    );

    describe_histogram!(
        format!("{}_ingest_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Batch ingestion latency in seconds"
    );

    // Analytics metrics
    describe_counter!(
        format!("{}_analytics_queries_total", METRICS_PREFIX),
        Unit::Count,
        "Total analytics queries executed, labelled by query"
    );

    describe_histogram!(
        format!("{}_analytics_query_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Analytics query latency in seconds"
    );

    tracing::info!("Metrics registered");
}

/// Helper to record an ingestion run
pub fn record_ingest_run(duration_secs: f64, records: usize, failures: usize) {
    counter!(format!("{}_records_ingested_total", METRICS_PREFIX)).increment(records as u64);

    if failures > 0 {
        counter!(format!("{}_records_failed_total", METRICS_PREFIX)).increment(failures as u64);
    }

    histogram!(format!("{}_ingest_duration_seconds", METRICS_PREFIX)).record(duration_secs);
}

/// Helper to record a dimension business-key resolution
pub fn record_dimension_resolved(kind: &'static str) {
    counter!(
        format!("{}_dimensions_resolved_total", METRICS_PREFIX),
        "kind" => kind
    )
    .increment(1);
}

/// Helper to time an analytics query
pub struct QueryTimer {
    start: Instant,
    query: &'static str,
}

impl QueryTimer {
    /// Start timing a query
    pub fn start(query: &'static str) -> Self {
        Self {
            start: Instant::now(),
            query,
        }
    }

    /// Record query completion
    pub fn finish(self) {
        let duration = self.start.elapsed().as_secs_f64();

        counter!(
            format!("{}_analytics_queries_total", METRICS_PREFIX),
            "query" => self.query
        )
        .increment(1);

        histogram!(
            format!("{}_analytics_query_duration_seconds", METRICS_PREFIX),
            "query" => self.query
        )
        .record(duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latency_buckets_sorted() {
        let mut prev = 0.0;
        for &bucket in LATENCY_BUCKETS {
            assert!(bucket > prev);
            prev = bucket;
        }
    }

    #[test]
    fn test_query_timer() {
        let timer = QueryTimer::start("revenue");
        std::thread::sleep(std::time::Duration::from_millis(5));
        timer.finish();
        // Just verify it runs without panic
    }
}
