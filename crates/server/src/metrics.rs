//! Prometheus recorder for search outcomes.

use matcher::{SearchKind, SearchMetrics, SearchOutcome};
use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

pub const REQUESTS_TOTAL: &str = "medsearch_requests_total";
pub const SEARCH_LATENCY_SECONDS: &str = "medsearch_search_latency_seconds";
pub const CANDIDATES_EXCLUDED_TOTAL: &str = "medsearch_candidates_excluded_total";

/// Forwards matcher search events to the global `metrics` recorder.
#[derive(Debug, Default, Clone, Copy)]
pub struct PrometheusSearchMetrics;

impl SearchMetrics for PrometheusSearchMetrics {
    fn record_search(&self, kind: SearchKind, latency: Duration, outcome: SearchOutcome) {
        counter!(
            REQUESTS_TOTAL,
            "endpoint" => kind.as_str(),
            "outcome" => outcome.as_str()
        )
        .increment(1);
        histogram!(SEARCH_LATENCY_SECONDS, "endpoint" => kind.as_str())
            .record(latency.as_secs_f64());

        if let SearchOutcome::Completed { excluded, .. } = outcome {
            if excluded > 0 {
                counter!(CANDIDATES_EXCLUDED_TOTAL).increment(excluded as u64);
            }
        }
    }
}

/// Installs the process-wide Prometheus recorder and returns its renderer.
pub fn install_recorder() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}
