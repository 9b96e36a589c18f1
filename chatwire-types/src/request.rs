//! Outbound request and non-streaming reply shapes.

use crate::id::{AppId, ConversationId, MessageId, ModelId};
use serde::{Deserialize, Serialize};

/// Describes one prompt submission.
///
/// Serializes to the wire body
/// `{ "appId", "conversationId", "modelId", "prompt" }`, with
/// `conversationId` sent as `null` for a new conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    /// Chat application receiving the prompt.
    pub app_id: AppId,
    /// Existing conversation, or `None` to start a new one.
    pub conversation_id: Option<ConversationId>,
    /// Model answering the prompt.
    pub model_id: ModelId,
    /// Prompt text.
    pub prompt: String,
}

impl ChatRequest {
    /// Create a request that starts a new conversation.
    pub fn new(
        app_id: impl Into<AppId>,
        model_id: impl Into<ModelId>,
        prompt: impl Into<String>,
    ) -> Self {
        Self {
            app_id: app_id.into(),
            conversation_id: None,
            model_id: model_id.into(),
            prompt: prompt.into(),
        }
    }

    /// Continue an existing conversation.
    pub fn in_conversation(mut self, conversation_id: impl Into<ConversationId>) -> Self {
        self.conversation_id = Some(conversation_id.into());
        self
    }
}

/// Reply of the non-streaming endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionReply {
    /// Conversation the exchange belongs to.
    pub conversation_id: ConversationId,
    /// Durable id of the exchange.
    pub message_id: MessageId,
    /// Full assistant answer.
    pub content: String,
}
