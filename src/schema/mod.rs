pub mod meta;
pub mod registry;

pub use meta::{DEFAULT_DELETED_FIELD, DEFAULT_PK_FIELD, ForeignKey, ModelMeta, OnDelete};
pub use registry::Registry;
