use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{Mutex, MutexGuard};

/// Numbered claim on a fetch, taken before the request goes out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    key: String,
    sequence: u64,
}

impl FetchTicket {
    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}

/// Orders concurrent fetches of the same view so a slow, older response can
/// never overwrite a newer one.
#[derive(Debug, Default)]
pub struct FetchSequencer {
    next: AtomicU64,
    applied: Mutex<HashMap<String, u64>>,
}

/// Held while a fetch result is written through. Dropping it lets the next
/// completion for any key be checked.
pub struct AppliedFetch<'a> {
    _guard: MutexGuard<'a, HashMap<String, u64>>,
}

impl FetchSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self, key: impl Into<String>) -> FetchTicket {
        FetchTicket {
            key: key.into(),
            sequence: self.next.fetch_add(1, Ordering::SeqCst) + 1,
        }
    }

    /// Returns `None` when a fetch started later for the same key has already
    /// been applied.
    pub async fn admit(&self, ticket: &FetchTicket) -> Option<AppliedFetch<'_>> {
        let mut applied = self.applied.lock().await;
        let latest = applied.get(&ticket.key).copied().unwrap_or(0);
        if ticket.sequence <= latest {
            return None;
        }
        applied.insert(ticket.key.clone(), ticket.sequence);
        Some(AppliedFetch { _guard: applied })
    }
}
