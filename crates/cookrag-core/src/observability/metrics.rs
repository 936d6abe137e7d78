use serde::Serialize;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::info;

use crate::types::Strategy;

/// Point-in-time copy of the aggregate counters.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MetricsSnapshot {
    pub query_count: u64,
    pub total_latency_ms: f64,
    pub error_count: u64,
    pub cache_hit_count: u64,
    pub cache_miss_count: u64,
    pub vector_retrieval_count: u64,
    pub bm25_retrieval_count: u64,
    pub graph_retrieval_count: u64,
    pub hybrid_retrieval_count: u64,
}

/// Process-wide counters behind a single mutex. Shared via `Arc` between
/// the router, the retrievers and the periodic reporter.
pub struct MetricsCollector {
    inner: Mutex<MetricsSnapshot>,
    start: Instant,
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self { inner: Mutex::new(MetricsSnapshot::default()), start: Instant::now() }
    }

    pub fn record_query(&self, strategy: Strategy, latency_ms: f64) {
        let mut m = self.inner.lock().unwrap();
        m.query_count += 1;
        m.total_latency_ms += latency_ms;
        match strategy {
            Strategy::Vector => m.vector_retrieval_count += 1,
            Strategy::Bm25 => m.bm25_retrieval_count += 1,
            Strategy::Graph => m.graph_retrieval_count += 1,
            Strategy::Hybrid => m.hybrid_retrieval_count += 1,
            Strategy::GraphNeighbor | Strategy::VectorBatch => {}
        }
    }

    pub fn record_error(&self) {
        self.inner.lock().unwrap().error_count += 1;
    }

    pub fn record_cache_hit(&self) {
        self.inner.lock().unwrap().cache_hit_count += 1;
    }

    pub fn record_cache_miss(&self) {
        self.inner.lock().unwrap().cache_miss_count += 1;
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        self.inner.lock().unwrap().clone()
    }

    pub fn average_latency_ms(&self) -> f64 {
        let m = self.inner.lock().unwrap();
        if m.query_count == 0 {
            0.0
        } else {
            m.total_latency_ms / m.query_count as f64
        }
    }

    pub fn cache_hit_rate(&self) -> f64 {
        let m = self.inner.lock().unwrap();
        let total = m.cache_hit_count + m.cache_miss_count;
        if total == 0 {
            0.0
        } else {
            m.cache_hit_count as f64 / total as f64
        }
    }

    pub fn error_rate(&self) -> f64 {
        let m = self.inner.lock().unwrap();
        if m.query_count == 0 {
            0.0
        } else {
            m.error_count as f64 / m.query_count as f64
        }
    }

    pub fn uptime(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn log_summary(&self) {
        let snapshot = self.snapshot();
        info!(
            uptime_secs = self.uptime().as_secs(),
            queries = snapshot.query_count,
            avg_latency_ms = self.average_latency_ms(),
            error_rate = self.error_rate(),
            cache_hit_rate = self.cache_hit_rate(),
            vector = snapshot.vector_retrieval_count,
            bm25 = snapshot.bm25_retrieval_count,
            graph = snapshot.graph_retrieval_count,
            hybrid = snapshot.hybrid_retrieval_count,
            "metrics summary"
        );
    }

    /// Spawn a task that logs the summary on a fixed interval until the
    /// handle is aborted.
    pub fn spawn_reporter(self: &Arc<Self>, interval: Duration) -> tokio::task::JoinHandle<()> {
        let collector = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await; // first tick fires immediately
            loop {
                ticker.tick().await;
                collector.log_summary();
            }
        })
    }
}
