use chrono::{DateTime, Utc};
use jobboard::board::{InMemoryJobBoardStore, JobBoardService};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

pub(crate) type BoardService = JobBoardService<InMemoryJobBoardStore>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) started_at: DateTime<Utc>,
}

impl AppState {
    pub(crate) fn uptime_seconds(&self, now: DateTime<Utc>) -> i64 {
        (now - self.started_at).num_seconds().max(0)
    }
}

pub(crate) fn in_memory_service() -> Arc<BoardService> {
    Arc::new(JobBoardService::new(Arc::new(InMemoryJobBoardStore::new())))
}
