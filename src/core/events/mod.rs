pub mod base;
pub mod bus;

pub use base::{Event, POST_HARD_DELETE, POST_SOFTDELETE, POST_UNDELETE, PRE_SOFTDELETE};
pub use bus::{EventBus, EventHandler};
