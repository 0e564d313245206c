use crate::application::ports::PassReport;
use serde::Serialize;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReplayOutcomeStatus {
    Success,
    Failure,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DispatchMetricsSnapshot {
    pub total_success: u64,
    pub total_failure: u64,
    pub total_exhausted: u64,
    pub consecutive_failure: u64,
    pub completed_passes: u64,
    pub skipped_passes: u64,
    pub last_success_ms: Option<u64>,
    pub last_failure_ms: Option<u64>,
    pub last_outcome: Option<ReplayOutcomeStatus>,
    pub last_action_id: Option<i64>,
    pub last_trigger: Option<String>,
    pub last_pass_attempted: Option<u32>,
    pub last_pass_deferred: Option<u32>,
    pub last_pass_duration_ms: Option<u64>,
}

#[derive(Default, Clone)]
struct LastDispatchMetadata {
    last_outcome: Option<ReplayOutcomeStatus>,
    action_id: Option<i64>,
    trigger: Option<String>,
    pass_attempted: Option<u32>,
    pass_deferred: Option<u32>,
    pass_duration_ms: Option<u64>,
}

/// Counters for outbox replays. One instance is shared by the dispatcher and
/// whatever surface reports on it.
pub struct DispatchMetrics {
    success: AtomicU64,
    failure: AtomicU64,
    exhausted: AtomicU64,
    consecutive_failure: AtomicU64,
    completed_passes: AtomicU64,
    skipped_passes: AtomicU64,
    last_success_ms: AtomicU64,
    last_failure_ms: AtomicU64,
    metadata: Mutex<LastDispatchMetadata>,
}

impl DispatchMetrics {
    pub fn new() -> Self {
        Self {
            success: AtomicU64::new(0),
            failure: AtomicU64::new(0),
            exhausted: AtomicU64::new(0),
            consecutive_failure: AtomicU64::new(0),
            completed_passes: AtomicU64::new(0),
            skipped_passes: AtomicU64::new(0),
            last_success_ms: AtomicU64::new(0),
            last_failure_ms: AtomicU64::new(0),
            metadata: Mutex::new(LastDispatchMetadata::default()),
        }
    }

    pub fn record_replay(&self, status: ReplayOutcomeStatus, action_id: i64) {
        match status {
            ReplayOutcomeStatus::Success => {
                self.success.fetch_add(1, Ordering::Relaxed);
                self.last_success_ms
                    .store(current_unix_ms(), Ordering::Relaxed);
                self.consecutive_failure.store(0, Ordering::Relaxed);
            }
            ReplayOutcomeStatus::Failure => {
                self.failure.fetch_add(1, Ordering::Relaxed);
                self.last_failure_ms
                    .store(current_unix_ms(), Ordering::Relaxed);
                self.consecutive_failure.fetch_add(1, Ordering::Relaxed);
            }
        }

        if let Ok(mut guard) = self.metadata.lock() {
            guard.last_outcome = Some(status);
            guard.action_id = Some(action_id);
        }
    }

    pub fn record_exhausted(&self) {
        self.exhausted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_pass(&self, report: &PassReport, duration_ms: u64) {
        if report.skipped {
            self.skipped_passes.fetch_add(1, Ordering::Relaxed);
            return;
        }
        self.completed_passes.fetch_add(1, Ordering::Relaxed);

        if let Ok(mut guard) = self.metadata.lock() {
            guard.trigger = Some(report.trigger.as_str().to_string());
            guard.pass_attempted = Some(report.attempted);
            guard.pass_deferred = Some(report.deferred);
            guard.pass_duration_ms = Some(duration_ms);
        }
    }

    pub fn snapshot(&self) -> DispatchMetricsSnapshot {
        let metadata = self
            .metadata
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_else(|_| LastDispatchMetadata::default());

        DispatchMetricsSnapshot {
            total_success: self.success.load(Ordering::Relaxed),
            total_failure: self.failure.load(Ordering::Relaxed),
            total_exhausted: self.exhausted.load(Ordering::Relaxed),
            consecutive_failure: self.consecutive_failure.load(Ordering::Relaxed),
            completed_passes: self.completed_passes.load(Ordering::Relaxed),
            skipped_passes: self.skipped_passes.load(Ordering::Relaxed),
            last_success_ms: to_option(self.last_success_ms.load(Ordering::Relaxed)),
            last_failure_ms: to_option(self.last_failure_ms.load(Ordering::Relaxed)),
            last_outcome: metadata.last_outcome,
            last_action_id: metadata.action_id,
            last_trigger: metadata.trigger,
            last_pass_attempted: metadata.pass_attempted,
            last_pass_deferred: metadata.pass_deferred,
            last_pass_duration_ms: metadata.pass_duration_ms,
        }
    }
}

impl Default for DispatchMetrics {
    fn default() -> Self {
        Self::new()
    }
}

fn to_option(value: u64) -> Option<u64> {
    if value == 0 { None } else { Some(value) }
}

fn current_unix_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_millis() as u64)
        .unwrap_or(0)
}
