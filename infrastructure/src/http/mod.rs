//! Council backend over HTTP.

mod client;
mod sse;

pub use client::{HttpCouncilClient, HttpError};
pub use sse::{SseDecoder, SseFrame};
