//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod conversations;
pub mod manage_settings;
pub mod send_message;
