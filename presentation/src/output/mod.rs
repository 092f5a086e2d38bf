//! Console output for council turns, conversations and settings

pub mod console;
