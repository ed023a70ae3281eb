//! Search observability hook.
//!
//! The matcher does not depend on a metrics backend. Install a
//! [`SearchMetrics`] implementation once at startup with
//! [`set_search_metrics`] and every search reports to it.

use std::sync::{Arc, OnceLock, RwLock};
use std::time::Duration;

/// Which search operation produced a measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchKind {
    Medicines,
    Nlp,
}

impl SearchKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SearchKind::Medicines => "medicines",
            SearchKind::Nlp => "nlp",
        }
    }
}

/// How a search ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    /// `excluded` counts candidates dropped by the allergy filter.
    Completed { returned: usize, excluded: usize },
    Rejected,
    Failed,
}

impl SearchOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            SearchOutcome::Completed { .. } => "ok",
            SearchOutcome::Rejected => "invalid",
            SearchOutcome::Failed => "error",
        }
    }
}

pub trait SearchMetrics: Send + Sync {
    fn record_search(&self, kind: SearchKind, latency: Duration, outcome: SearchOutcome);
}

/// Install or clear the global search metrics recorder.
pub fn set_search_metrics(recorder: Option<Arc<dyn SearchMetrics>>) {
    let mut guard = metrics_lock()
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    *guard = recorder;
}

fn metrics_lock() -> &'static RwLock<Option<Arc<dyn SearchMetrics>>> {
    static METRICS: OnceLock<RwLock<Option<Arc<dyn SearchMetrics>>>> = OnceLock::new();
    METRICS.get_or_init(|| RwLock::new(None))
}

pub(crate) fn metrics_recorder() -> Option<Arc<dyn SearchMetrics>> {
    let guard = metrics_lock()
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    guard.clone()
}
