use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, anyhow};
use feedsync_lib::application::ports::{
    DispatchEventEmitter, DispatchTrigger, PassReport, StaticTokenProvider,
};
use feedsync_lib::domain::entities::PendingAction;
use feedsync_lib::infrastructure::connectivity::SharedConnectivity;
use feedsync_lib::{AppConfig, SyncEngine, init_logging};
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

/// Reports dispatcher outcomes through the log; a UI host would forward them
/// to the user instead.
struct LogEmitter;

impl DispatchEventEmitter for LogEmitter {
    fn emit_exhausted(&self, action: &PendingAction) -> Result<(), String> {
        warn!(
            target: "feedsync::worker",
            action_id = %action.id,
            entity_id = %action.entity_id,
            last_error = action.last_error.as_deref().unwrap_or(""),
            "action needs attention"
        );
        Ok(())
    }

    fn emit_report(&self, report: &PassReport) -> Result<(), String> {
        let json = serde_json::to_string(report).map_err(|err| err.to_string())?;
        info!(target: "feedsync::worker", report = %json, "pass report");
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let config = AppConfig::from_env();
    config
        .validate()
        .map_err(|err| anyhow!(err))
        .context("invalid configuration")?;

    let connectivity = Arc::new(SharedConnectivity::new(true));
    let tokens = Arc::new(StaticTokenProvider::new(config.remote.access_token.clone()));
    let emitter: Arc<dyn DispatchEventEmitter> = Arc::new(LogEmitter);
    let engine = SyncEngine::open(&config, connectivity.clone(), tokens, Some(emitter))
        .await
        .context("failed to open sync engine")?;

    info!(
        target: "feedsync::worker",
        database = %config.database.url,
        interval_secs = config.sync.dispatch_interval_secs,
        "outbox worker started"
    );

    if config.sync.run_on_startup {
        engine
            .dispatcher
            .run_pass(DispatchTrigger::Startup)
            .await
            .context("startup pass failed")?;
    }

    let mut ticker = tokio::time::interval(Duration::from_secs(config.sync.dispatch_interval_secs));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker.tick().await;

    let mut connectivity_changes = connectivity.subscribe();

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                engine.dispatcher.trigger(DispatchTrigger::Periodic);
            }
            changed = connectivity_changes.changed() => {
                if changed.is_err() {
                    break;
                }
                if *connectivity_changes.borrow_and_update() {
                    engine.dispatcher.trigger(DispatchTrigger::ConnectivityRegained);
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!(target: "feedsync::worker", "shutdown requested");
                break;
            }
        }
    }

    let snapshot = engine.metrics.snapshot();
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}
