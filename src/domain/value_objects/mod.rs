pub mod action_type;
pub mod entity_family;
pub mod entity_id;
pub mod idempotency_key;
pub mod payload;
pub mod pending_action_id;

pub use action_type::ActionType;
pub use entity_family::EntityFamily;
pub use entity_id::{EntityId, PROVISIONAL_PREFIX};
pub use idempotency_key::IdempotencyKey;
pub use payload::ActionPayload;
pub use pending_action_id::PendingActionId;
