//! Span tree around retrievals plus the process-wide metrics aggregator.

mod metrics;
mod span;

pub use metrics::{MetricsCollector, MetricsSnapshot};
pub use span::Span;
