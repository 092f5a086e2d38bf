//! Council turn domain
//!
//! A council turn runs three stages on the backend:
//!
//! ```text
//! ┌──────────────────────┐   ┌──────────────────────┐   ┌──────────────────────┐
//! │ Stage 1: Council     │ → │ Stage 2: Ranking     │ → │ Stage 3: Synthesis   │
//! │ members answer       │   │ members rank the     │   │ chairman writes the  │
//! │ independently        │   │ anonymized answers   │   │ final answer         │
//! └──────────────────────┘   └──────────────────────┘   └──────────────────────┘
//! ```
//!
//! The client only observes the stages through [`event::CouncilEvent`]s and
//! folds them into the in-flight assistant message with [`reducer::apply`].

pub mod event;
pub mod reducer;
pub mod stage;
pub mod value_objects;

pub use event::{CouncilEvent, DecodeError};
pub use reducer::{ReduceError, apply, fold};
pub use stage::Stage;
pub use value_objects::{AggregateRank, ChairmanAnswer, CouncilAnswer, PeerRanking, RankingMetadata};
