//! Decoded stream frames and the payloads they carry.

use crate::id::{ConversationId, MessageId};
use serde::{Deserialize, Serialize};

/// Event name used when a record carries no `event:` line.
pub const DEFAULT_EVENT: &str = "message";

/// Event name of the frame carrying server-issued identifiers.
pub const METADATA_EVENT: &str = "metadata";

/// Event name of the sentinel frame closing the assistant content.
pub const END_EVENT: &str = "end";

/// One decoded record from the event stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SseFrame {
    /// Event name. `"message"` when the record had no `event:` line.
    pub event: String,
    /// Data payload.
    pub data: String,
}

impl SseFrame {
    /// Create a frame with an explicit event name.
    pub fn new(event: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            data: data.into(),
        }
    }

    /// Create a frame on the default `"message"` channel.
    pub fn message(data: impl Into<String>) -> Self {
        Self::new(DEFAULT_EVENT, data)
    }

    /// View this frame as the tagged union the reconciliation step works on.
    pub fn kind(&self) -> FrameKind<'_> {
        match self.event.as_str() {
            METADATA_EVENT => FrameKind::Metadata(&self.data),
            END_EVENT => FrameKind::End,
            _ => FrameKind::Delta(&self.data),
        }
    }
}

/// What a frame means, keyed by event name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind<'a> {
    /// JSON `{conversationId?, messageId?}` payload.
    Metadata(&'a str),
    /// End of assistant content. The payload is ignored.
    End,
    /// Raw text delta on any other channel.
    Delta(&'a str),
}

/// Identifiers carried by a `metadata` frame.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationMetadata {
    /// Conversation the exchange belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<ConversationId>,
    /// Durable id of the exchange.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<MessageId>,
}

impl ConversationMetadata {
    /// Parse a metadata payload.
    pub fn parse(payload: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(payload)
    }
}
