pub mod manager;
pub mod prefetch;
pub mod queryset;
pub mod visibility;

pub use manager::Manager;
pub use prefetch::Prefetched;
pub use queryset::QuerySet;
pub use visibility::Visibility;
