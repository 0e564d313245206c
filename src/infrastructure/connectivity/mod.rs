use crate::application::ports::ConnectivityMonitor;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::watch;

/// Connectivity flag fed by the platform's network callbacks.
///
/// Subscribers see every transition; the outbox worker listens for
/// offline-to-online edges to start a pass.
pub struct SharedConnectivity {
    online: AtomicBool,
    sender: watch::Sender<bool>,
}

impl SharedConnectivity {
    pub fn new(initially_online: bool) -> Self {
        let (sender, _) = watch::channel(initially_online);
        Self {
            online: AtomicBool::new(initially_online),
            sender,
        }
    }

    /// Returns `true` when the call flipped the state from offline to online.
    pub fn set_online(&self, online: bool) -> bool {
        let previous = self.online.swap(online, Ordering::SeqCst);
        if previous != online {
            self.sender.send_replace(online);
            tracing::info!(
                target: "feedsync::connectivity",
                online,
                "connectivity changed"
            );
        }
        !previous && online
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.sender.subscribe()
    }
}

impl Default for SharedConnectivity {
    fn default() -> Self {
        Self::new(true)
    }
}

#[async_trait]
impl ConnectivityMonitor for SharedConnectivity {
    async fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }
}
