pub mod filter;
pub mod memory;
pub mod record;
pub mod store;

pub use filter::{Filter, OrderBy, Select, compare_values};
pub use memory::MemoryStore;
pub use record::{Record, from_record, to_record};
pub use store::{Store, StoreError};
