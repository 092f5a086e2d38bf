//! Application-level configuration.
//!
//! Policies that control how use cases behave, independent of where the
//! values come from (config file, CLI flags).

/// Turn controller policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnPolicy {
    /// Reject a new message while a turn is in flight on the same conversation.
    ///
    /// Turns address their assistant message by id, so concurrent turns are
    /// safe to allow; serializing them keeps the transcript readable.
    pub serialize_turns: bool,
    /// Remove the optimistic user/assistant pair when the transport fails.
    pub rollback_on_transport_failure: bool,
}

impl Default for TurnPolicy {
    fn default() -> Self {
        Self {
            serialize_turns: true,
            rollback_on_transport_failure: true,
        }
    }
}

impl TurnPolicy {
    pub fn allow_concurrent_turns(mut self) -> Self {
        self.serialize_turns = false;
        self
    }

    pub fn keep_on_transport_failure(mut self) -> Self {
        self.rollback_on_transport_failure = false;
        self
    }
}
