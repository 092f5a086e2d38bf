//! Settings storage adapters.

mod fallback;
mod file_store;

pub use fallback::MirroredSettingsStore;
pub use file_store::FileSettingsStore;
