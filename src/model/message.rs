//! Transcript message records as they arrive from live interaction or history.

use super::error::InvalidTrust;
use super::identifiers::MessageId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Who produced a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SenderType {
    /// Typed by the person at the keyboard. Anchored to the left column.
    Input,
    /// Produced by the model. Shifted right by the counterpart offset.
    Response,
}

impl fmt::Display for SenderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SenderType::Input => f.write_str("input"),
            SenderType::Response => f.write_str("response"),
        }
    }
}

/// Trust score in `[0, 1]`.
///
/// Higher trust pulls a response toward the input column when trust-weighted
/// placement is enabled.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize)]
#[serde(transparent)]
pub struct Trust(f32);

impl Trust {
    /// No trust: responses sit at the full counterpart offset.
    pub const NONE: Self = Self(0.0);

    /// Smart constructor rejecting values outside `[0, 1]` (and NaN).
    pub fn new(value: f32) -> Result<Self, InvalidTrust> {
        if (0.0..=1.0).contains(&value) {
            Ok(Self(value))
        } else {
            Err(InvalidTrust(value))
        }
    }

    /// Clamp an arbitrary value into `[0, 1]`. NaN becomes zero.
    pub fn saturating(value: f32) -> Self {
        if value.is_nan() {
            Self::NONE
        } else {
            Self(value.clamp(0.0, 1.0))
        }
    }

    /// Raw value.
    pub fn get(&self) -> f32 {
        self.0
    }
}

impl<'de> Deserialize<'de> for Trust {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = f32::deserialize(deserializer)?;
        Trust::new(raw).map_err(serde::de::Error::custom)
    }
}

/// Wire form of a transcript message.
///
/// Shared by history pages and live appends:
///
/// ```json
/// {"convoId":0,"messageId":2,"timestamp":"2023-08-01T00:00:00Z",
///  "type":"input","text":"I am fine too.","trust":0.33}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageRecord {
    /// Backend conversation counter.
    pub convo_id: u64,
    /// Backend message counter within the conversation.
    pub message_id: u64,
    /// When the message was produced.
    pub timestamp: DateTime<Utc>,
    /// Sender of the message.
    #[serde(rename = "type")]
    pub sender: SenderType,
    /// Message body.
    pub text: String,
    /// Trust score.
    #[serde(default)]
    pub trust: Trust,
    /// Optional tokenization of `text`, carried through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens: Option<Vec<String>>,
}

impl MessageRecord {
    /// Create a record with no tokens.
    pub fn new(
        id: MessageId,
        timestamp: DateTime<Utc>,
        sender: SenderType,
        text: impl Into<String>,
        trust: Trust,
    ) -> Self {
        Self {
            convo_id: id.convo(),
            message_id: id.message(),
            timestamp,
            sender,
            text: text.into(),
            trust,
            tokens: None,
        }
    }

    /// Identity of this record.
    pub fn id(&self) -> MessageId {
        MessageId::new(self.convo_id, self.message_id)
    }

    /// Empty messages are dropped before they reach any buffer.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}
