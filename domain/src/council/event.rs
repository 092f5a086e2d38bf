//! Stage lifecycle events streamed during a council turn.
//!
//! The backend sends `(event_type, payload)` pairs. [`CouncilEvent::decode`]
//! turns one pair into a typed event; unknown event types decode to
//! [`CouncilEvent::Unrecognized`] so newer backends do not break older
//! clients.

use super::stage::Stage;
use super::value_objects::{ChairmanAnswer, CouncilAnswer, PeerRanking, RankingMetadata};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

pub const STAGE1_START: &str = "stage1_start";
pub const STAGE1_COMPLETE: &str = "stage1_complete";
pub const STAGE2_START: &str = "stage2_start";
pub const STAGE2_COMPLETE: &str = "stage2_complete";
pub const STAGE3_START: &str = "stage3_start";
pub const STAGE3_COMPLETE: &str = "stage3_complete";
pub const TITLE_COMPLETE: &str = "title_complete";
pub const COMPLETE: &str = "complete";
pub const ERROR: &str = "error";

/// Errors decoding a recognized event whose payload is malformed
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("{event_type}: missing required field '{field}'")]
    MissingField {
        event_type: &'static str,
        field: &'static str,
    },

    #[error("{event_type}: invalid '{field}': {source}")]
    InvalidField {
        event_type: &'static str,
        field: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// An event in a council turn stream.
#[derive(Debug, Clone, PartialEq)]
pub enum CouncilEvent {
    Stage1Start,
    Stage1Complete {
        data: Vec<CouncilAnswer>,
    },
    Stage2Start,
    Stage2Complete {
        data: Vec<PeerRanking>,
        metadata: RankingMetadata,
    },
    Stage3Start,
    Stage3Complete {
        data: ChairmanAnswer,
    },
    /// The backend generated a conversation title; the summary list is stale.
    TitleComplete {
        title: Option<String>,
    },
    /// The turn finished successfully.
    Complete,
    /// The backend reported a failure; terminates the stream.
    Error {
        message: String,
    },
    /// An event type this client does not know. Ignored by the reducer.
    Unrecognized {
        event_type: String,
    },
}

impl CouncilEvent {
    /// Decode one wire event.
    pub fn decode(event_type: &str, payload: &Value) -> Result<Self, DecodeError> {
        let event = match event_type {
            STAGE1_START => CouncilEvent::Stage1Start,
            STAGE1_COMPLETE => CouncilEvent::Stage1Complete {
                data: required(STAGE1_COMPLETE, payload, "data")?,
            },
            STAGE2_START => CouncilEvent::Stage2Start,
            STAGE2_COMPLETE => CouncilEvent::Stage2Complete {
                data: required(STAGE2_COMPLETE, payload, "data")?,
                metadata: required(STAGE2_COMPLETE, payload, "metadata")?,
            },
            STAGE3_START => CouncilEvent::Stage3Start,
            STAGE3_COMPLETE => CouncilEvent::Stage3Complete {
                data: required(STAGE3_COMPLETE, payload, "data")?,
            },
            TITLE_COMPLETE => CouncilEvent::TitleComplete {
                title: payload
                    .pointer("/data/title")
                    .or_else(|| payload.get("title"))
                    .and_then(Value::as_str)
                    .map(str::to_string),
            },
            COMPLETE => CouncilEvent::Complete,
            ERROR => CouncilEvent::Error {
                message: payload
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("Unknown error")
                    .to_string(),
            },
            other => CouncilEvent::Unrecognized {
                event_type: other.to_string(),
            },
        };
        Ok(event)
    }

    /// Decode an event whose type is carried in the payload's `type` field.
    pub fn decode_tagged(payload: &Value) -> Result<Self, DecodeError> {
        let event_type = payload
            .get("type")
            .and_then(Value::as_str)
            .ok_or(DecodeError::MissingField {
                event_type: "event",
                field: "type",
            })?;
        Self::decode(event_type, payload)
    }

    pub fn event_type(&self) -> &str {
        match self {
            CouncilEvent::Stage1Start => STAGE1_START,
            CouncilEvent::Stage1Complete { .. } => STAGE1_COMPLETE,
            CouncilEvent::Stage2Start => STAGE2_START,
            CouncilEvent::Stage2Complete { .. } => STAGE2_COMPLETE,
            CouncilEvent::Stage3Start => STAGE3_START,
            CouncilEvent::Stage3Complete { .. } => STAGE3_COMPLETE,
            CouncilEvent::TitleComplete { .. } => TITLE_COMPLETE,
            CouncilEvent::Complete => COMPLETE,
            CouncilEvent::Error { .. } => ERROR,
            CouncilEvent::Unrecognized { event_type } => event_type,
        }
    }

    /// `Complete` and `Error` end the stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, CouncilEvent::Complete | CouncilEvent::Error { .. })
    }

    /// The stage a start or completion event refers to.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            CouncilEvent::Stage1Start | CouncilEvent::Stage1Complete { .. } => Some(Stage::Council),
            CouncilEvent::Stage2Start | CouncilEvent::Stage2Complete { .. } => Some(Stage::Ranking),
            CouncilEvent::Stage3Start | CouncilEvent::Stage3Complete { .. } => {
                Some(Stage::Synthesis)
            }
            CouncilEvent::TitleComplete { .. }
            | CouncilEvent::Complete
            | CouncilEvent::Error { .. }
            | CouncilEvent::Unrecognized { .. } => None,
        }
    }

    pub fn is_stage_start(&self) -> bool {
        matches!(
            self,
            CouncilEvent::Stage1Start | CouncilEvent::Stage2Start | CouncilEvent::Stage3Start
        )
    }

    /// Whether applying this event can change message content.
    pub fn mutates_message(&self) -> bool {
        self.stage().is_some()
    }
}

fn required<T: DeserializeOwned>(
    event_type: &'static str,
    payload: &Value,
    field: &'static str,
) -> Result<T, DecodeError> {
    let value = payload
        .get(field)
        .filter(|v| !v.is_null())
        .ok_or(DecodeError::MissingField { event_type, field })?;
    T::deserialize(value).map_err(|source| DecodeError::InvalidField {
        event_type,
        field,
        source,
    })
}
