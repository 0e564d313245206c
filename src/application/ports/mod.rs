pub mod action_replayer;
pub mod connectivity;
pub mod dispatch_events;
pub mod local_store;
pub mod remote_gateway;

pub use action_replayer::ActionReplayer;
pub use connectivity::ConnectivityMonitor;
pub use dispatch_events::{DispatchEventEmitter, DispatchTrigger, PassReport};
pub use local_store::{EntityStore, LocalStore, OutboxStore};
pub use remote_gateway::{AccessTokenProvider, RemoteGateway, StaticTokenProvider};
