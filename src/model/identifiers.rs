//! Identifier newtypes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a message within the transcript.
///
/// Built from the backend's conversation and message counters so the same
/// history item fetched twice (e.g. after a wraparound) keeps its identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MessageId {
    convo: u64,
    message: u64,
}

impl MessageId {
    /// Create an id from the backend's conversation and message counters.
    pub fn new(convo: u64, message: u64) -> Self {
        Self { convo, message }
    }

    /// Conversation counter.
    pub fn convo(&self) -> u64 {
        self.convo
    }

    /// Message counter within the conversation.
    pub fn message(&self) -> u64 {
        self.message
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.convo, self.message)
    }
}
