pub mod entities;
pub mod reconciliation;
pub mod value_objects;
