//! Core domain concepts shared across all subdomains.
//!
//! - [`error::DomainError`] - domain-level errors
//! - [`text::preview`] - single-line text previews
//! - [`timestamp`] - backend timestamp parsing

pub mod error;
pub mod text;
pub mod timestamp;
