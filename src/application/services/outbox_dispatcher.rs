use crate::application::ports::{
    ActionReplayer, ConnectivityMonitor, DispatchEventEmitter, DispatchTrigger, LocalStore,
    PassReport,
};
use crate::domain::entities::PendingAction;
use crate::domain::value_objects::ActionType;
use crate::infrastructure::offline::metrics::{DispatchMetrics, ReplayOutcomeStatus};
use crate::shared::error::AppError;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// Drains the outbox. Passes are pulled by an external scheduler and never
/// overlap: a pass that finds another one running returns a skipped report.
pub struct OutboxDispatcher {
    store: Arc<dyn LocalStore>,
    connectivity: Arc<dyn ConnectivityMonitor>,
    replayers: HashMap<ActionType, Arc<dyn ActionReplayer>>,
    event_emitter: Option<Arc<dyn DispatchEventEmitter>>,
    metrics: Arc<DispatchMetrics>,
    gate: Mutex<()>,
}

enum DependencyState {
    Ready,
    Waiting,
    /// A provisional parent that will never be confirmed.
    Broken(String),
}

enum Attempt {
    Settled,
    Failed(AppError),
    NoReplayer,
}

impl OutboxDispatcher {
    pub fn new(store: Arc<dyn LocalStore>, connectivity: Arc<dyn ConnectivityMonitor>) -> Self {
        Self {
            store,
            connectivity,
            replayers: HashMap::new(),
            event_emitter: None,
            metrics: Arc::new(DispatchMetrics::new()),
            gate: Mutex::new(()),
        }
    }

    pub fn with_replayer(mut self, replayer: Arc<dyn ActionReplayer>) -> Self {
        for action_type in replayer.action_types() {
            self.replayers.insert(action_type, Arc::clone(&replayer));
        }
        self
    }

    pub fn with_emitter(mut self, emitter: Arc<dyn DispatchEventEmitter>) -> Self {
        self.event_emitter = Some(emitter);
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<DispatchMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn metrics(&self) -> Arc<DispatchMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Runs a pass in the background; errors are logged.
    pub fn trigger(self: &Arc<Self>, trigger: DispatchTrigger) -> JoinHandle<()> {
        let dispatcher = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(err) = dispatcher.run_pass(trigger).await {
                tracing::error!(
                    target: "feedsync::dispatcher",
                    trigger = %trigger,
                    error = %err,
                    "outbox pass aborted"
                );
            }
        })
    }

    pub async fn run_pass(&self, trigger: DispatchTrigger) -> Result<PassReport, AppError> {
        let Ok(_guard) = self.gate.try_lock() else {
            tracing::debug!(
                target: "feedsync::dispatcher",
                trigger = %trigger,
                "outbox pass already running, skipping"
            );
            let report = PassReport::skipped(trigger);
            self.metrics.record_pass(&report, 0);
            return Ok(report);
        };

        let started = Instant::now();
        let report = self.drain(trigger).await?;
        let duration_ms = started.elapsed().as_millis() as u64;
        self.metrics.record_pass(&report, duration_ms);
        self.emit_report(&report);

        tracing::info!(
            target: "feedsync::dispatcher",
            trigger = %trigger,
            attempted = report.attempted,
            succeeded = report.succeeded,
            failed = report.failed,
            exhausted = report.exhausted,
            deferred = report.deferred,
            duration_ms,
            "outbox pass finished"
        );
        Ok(report)
    }

    async fn drain(&self, trigger: DispatchTrigger) -> Result<PassReport, AppError> {
        let mut report = PassReport::new(trigger);
        if !self.connectivity.is_online().await {
            report.offline = true;
            return Ok(report);
        }

        let queue = self.store.list_retriable().await?;
        for queued in queue {
            if !self.connectivity.is_online().await {
                report.offline = true;
                break;
            }

            // Reload: an earlier settle in this pass may have rewritten the
            // payload or the action may be gone.
            let Some(action) = self.store.get_action(queued.id).await? else {
                continue;
            };
            if action.is_terminal() {
                continue;
            }
            match self.dependency_state(&action).await? {
                DependencyState::Ready => {}
                DependencyState::Waiting => {
                    report.deferred += 1;
                    tracing::debug!(
                        target: "feedsync::dispatcher",
                        action_id = %action.id,
                        entity_id = %action.entity_id,
                        "deferring action until its dependencies are confirmed"
                    );
                    continue;
                }
                DependencyState::Broken(message) => {
                    self.fail(&action, &message, true, &mut report).await?;
                    continue;
                }
            }

            report.attempted += 1;
            match self.attempt(&action).await {
                Attempt::Settled => {
                    report.succeeded += 1;
                    self.metrics
                        .record_replay(ReplayOutcomeStatus::Success, action.id.value());
                }
                Attempt::Failed(err) if err.is_fatal() => return Err(err),
                Attempt::Failed(AppError::Unauthenticated(message)) => {
                    self.store
                        .annotate_action(action.id, Utc::now(), &message)
                        .await?;
                    report.halted_unauthenticated = true;
                    tracing::warn!(
                        target: "feedsync::dispatcher",
                        action_id = %action.id,
                        error = %message,
                        "credentials rejected, stopping outbox pass"
                    );
                    break;
                }
                Attempt::Failed(err) => {
                    let terminal = !err.is_transient();
                    self.fail(&action, &err.to_string(), terminal, &mut report)
                        .await?;
                }
                Attempt::NoReplayer => {
                    let message = format!("no replayer registered for {}", action.action_type);
                    self.fail(&action, &message, false, &mut report).await?;
                }
            }
        }

        Ok(report)
    }

    async fn attempt(&self, action: &PendingAction) -> Attempt {
        let Some(replayer) = self.replayers.get(&action.action_type) else {
            return Attempt::NoReplayer;
        };
        match replayer.replay(action).await {
            Ok(()) => Attempt::Settled,
            Err(err) => Attempt::Failed(err),
        }
    }

    /// A provisional id in the payload is only valid while its own action can
    /// still confirm it.
    async fn dependency_state(&self, action: &PendingAction) -> Result<DependencyState, AppError> {
        let mut waiting = false;
        for dependency in action.dependencies() {
            match self.store.action_for(&dependency).await? {
                Some(parent) if parent.is_retriable() => waiting = true,
                Some(_) => {
                    return Ok(DependencyState::Broken(format!(
                        "dependency {dependency} exhausted"
                    )));
                }
                None => {
                    return Ok(DependencyState::Broken(format!(
                        "dependency {dependency} is no longer queued"
                    )));
                }
            }
        }
        Ok(if waiting {
            DependencyState::Waiting
        } else {
            DependencyState::Ready
        })
    }

    async fn fail(
        &self,
        action: &PendingAction,
        message: &str,
        terminal: bool,
        report: &mut PassReport,
    ) -> Result<(), AppError> {
        let updated = self
            .store
            .record_failure(action.id, Utc::now(), message, terminal)
            .await?;
        report.failed += 1;
        self.metrics
            .record_replay(ReplayOutcomeStatus::Failure, action.id.value());

        tracing::debug!(
            target: "feedsync::dispatcher",
            action_id = %updated.id,
            retry_count = updated.retry_count,
            max_retries = updated.max_retries,
            error = message,
            "pending action attempt failed"
        );

        if updated.is_terminal() {
            report.exhausted += 1;
            self.metrics.record_exhausted();
            tracing::warn!(
                target: "feedsync::dispatcher",
                action_id = %updated.id,
                entity_id = %updated.entity_id,
                action_type = %updated.action_type,
                retry_count = updated.retry_count,
                error = message,
                "pending action exhausted its retries"
            );
            self.emit_exhausted(&updated);
        }
        Ok(())
    }

    fn emit_exhausted(&self, action: &PendingAction) {
        if let Some(emitter) = &self.event_emitter {
            if let Err(err) = emitter.emit_exhausted(action) {
                tracing::warn!(
                    target: "feedsync::dispatcher",
                    error = %err,
                    "failed to emit exhausted action event"
                );
            }
        }
    }

    fn emit_report(&self, report: &PassReport) {
        if let Some(emitter) = &self.event_emitter {
            if let Err(err) = emitter.emit_report(report) {
                tracing::warn!(
                    target: "feedsync::dispatcher",
                    error = %err,
                    "failed to emit outbox pass report"
                );
            }
        }
    }
}
