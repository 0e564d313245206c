pub mod metrics;

pub use metrics::{DispatchMetrics, DispatchMetricsSnapshot, ReplayOutcomeStatus};
