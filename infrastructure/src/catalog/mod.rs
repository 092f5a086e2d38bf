//! Model catalog adapters.

mod cached;

pub use cached::CachedModelCatalog;
