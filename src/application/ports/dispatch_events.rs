use crate::domain::entities::PendingAction;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What started an outbox pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchTrigger {
    Startup,
    Periodic,
    ConnectivityRegained,
    Manual,
}

impl DispatchTrigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            DispatchTrigger::Startup => "startup",
            DispatchTrigger::Periodic => "periodic",
            DispatchTrigger::ConnectivityRegained => "connectivity_regained",
            DispatchTrigger::Manual => "manual",
        }
    }
}

impl fmt::Display for DispatchTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Summary of one dispatcher pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PassReport {
    pub trigger: DispatchTrigger,
    /// Another pass held the guard, so nothing was attempted.
    pub skipped: bool,
    pub offline: bool,
    pub attempted: u32,
    pub succeeded: u32,
    pub failed: u32,
    pub exhausted: u32,
    pub deferred: u32,
    /// Set when the pass stopped early because the credentials were refused.
    pub halted_unauthenticated: bool,
}

impl PassReport {
    pub fn new(trigger: DispatchTrigger) -> Self {
        Self {
            trigger,
            skipped: false,
            offline: false,
            attempted: 0,
            succeeded: 0,
            failed: 0,
            exhausted: 0,
            deferred: 0,
            halted_unauthenticated: false,
        }
    }

    pub fn skipped(trigger: DispatchTrigger) -> Self {
        Self {
            skipped: true,
            ..Self::new(trigger)
        }
    }

    pub fn offline(trigger: DispatchTrigger) -> Self {
        Self {
            offline: true,
            ..Self::new(trigger)
        }
    }
}

/// Observer for dispatcher outcomes that need user or operator attention.
pub trait DispatchEventEmitter: Send + Sync {
    fn emit_exhausted(&self, action: &PendingAction) -> Result<(), String>;
    fn emit_report(&self, report: &PassReport) -> Result<(), String>;
}
