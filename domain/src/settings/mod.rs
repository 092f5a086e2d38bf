//! Settings domain.
//!
//! - [`entities::Settings`] - council membership and chairman, with validation
//! - [`catalog::ModelDescriptor`] - a model offered by the catalog

pub mod catalog;
pub mod entities;
