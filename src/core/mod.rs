pub mod config;
pub mod error;
pub mod events;

pub use config::SafeDeleteConfig;
pub use error::{Result, SafeDeleteError};
pub use events::{Event, EventBus, EventHandler};
