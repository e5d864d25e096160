pub mod collector;
pub mod hard;
pub mod mixin;
pub mod models;
pub mod soft;


pub use collector::{Collected, can_hard_delete, cascade_related};
pub use hard::hard_delete;
pub use mixin::{delete, refresh, save, validate_unique};
pub use models::{DeletePolicy, DeletionOutcome, DeletionResult, RestoreResult};
pub use soft::{soft_delete, soft_delete_cascade, undelete};
