use crate::config::ServerConfig;
use matcher::MedicineMatcher;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Instant;

/// Shared application state
#[derive(Clone)]
pub struct ServerState {
    /// Server configuration
    pub config: Arc<ServerConfig>,

    /// The fully built search service. It exists before the listener binds,
    /// so no request can observe a half-built index.
    pub matcher: Arc<MedicineMatcher>,

    /// Prometheus renderer, present when metrics are enabled
    pub metrics: Option<PrometheusHandle>,

    pub started_at: Instant,
}

impl ServerState {
    pub fn new(config: ServerConfig, matcher: Arc<MedicineMatcher>) -> Self {
        Self {
            config: Arc::new(config),
            matcher,
            metrics: None,
            started_at: Instant::now(),
        }
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
