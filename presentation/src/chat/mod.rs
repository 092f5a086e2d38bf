//! Interactive chat module
//!
//! Provides a readline-based interactive chat interface for the council.

mod command;
mod repl;
mod turn;

pub use command::Command;
pub use repl::ChatRepl;
pub use turn::run_turn;
