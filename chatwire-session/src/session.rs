//! Per-submission state machine.
//!
//! A [`StreamSession`] moves `Optimistic -> Bound -> Finalized`, or to
//! `Failed` from any non-terminal state. It holds no I/O: the
//! [`Reconciler`](crate::Reconciler) drives it and applies the resulting
//! transcript writes.

use chatwire_types::{ChatRequest, ConversationId, ConversationMetadata, EntryId, MessageId};

/// Lifecycle state of a [`StreamSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// Entries exist with temporary ids; no metadata seen yet.
    Optimistic,
    /// Server identifiers have been recorded.
    Bound,
    /// The stream ended normally or was cancelled.
    Finalized,
    /// The stream failed; the assistant entry shows the failure message.
    Failed,
}

impl SessionState {
    /// Whether no further mutation may happen.
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionState::Finalized | SessionState::Failed)
    }
}

/// What binding one metadata payload changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindOutcome {
    /// A conversation was created by this submission and just learned.
    pub conversation_created: Option<ConversationId>,
    /// A message id was bound for the first time.
    pub message_bound: Option<MessageId>,
}

/// One prompt submission from optimistic entries to a terminal state.
#[derive(Debug, Clone)]
pub struct StreamSession {
    request: ChatRequest,
    user_entry: EntryId,
    assistant_entry: EntryId,
    content: String,
    conversation_id: Option<ConversationId>,
    message_id: Option<MessageId>,
    state: SessionState,
}

impl StreamSession {
    /// Start a session for `request` whose optimistic entries carry the given
    /// temporary ids.
    pub fn new(request: ChatRequest, user_entry: EntryId, assistant_entry: EntryId) -> Self {
        Self {
            request,
            user_entry,
            assistant_entry,
            content: String::new(),
            conversation_id: None,
            message_id: None,
            state: SessionState::Optimistic,
        }
    }

    /// The submitted request.
    pub fn request(&self) -> &ChatRequest {
        &self.request
    }

    /// Current id of the user entry.
    pub fn user_entry(&self) -> &EntryId {
        &self.user_entry
    }

    /// Current id of the assistant entry.
    pub fn assistant_entry(&self) -> &EntryId {
        &self.assistant_entry
    }

    /// Assistant content accumulated so far.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Conversation id: the request's, or the one the server issued.
    pub fn conversation_id(&self) -> Option<&ConversationId> {
        self.conversation_id
            .as_ref()
            .or(self.request.conversation_id.as_ref())
    }

    /// Message id issued by the server, once bound.
    pub fn message_id(&self) -> Option<&MessageId> {
        self.message_id.as_ref()
    }

    /// Current state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Record the identifiers from a metadata payload.
    ///
    /// A conversation counts as created only when the request carried no
    /// conversation id and none has been resolved yet, so repeated metadata
    /// never reports it twice. The message id binds at most once.
    pub fn bind(&mut self, metadata: ConversationMetadata) -> BindOutcome {
        let mut outcome = BindOutcome::default();
        if self.state.is_terminal() {
            return outcome;
        }

        if let Some(conversation_id) = metadata.conversation_id {
            if self.request.conversation_id.is_none() && self.conversation_id.is_none() {
                outcome.conversation_created = Some(conversation_id.clone());
            }
            if self.conversation_id.is_none() {
                self.conversation_id = Some(conversation_id);
            }
        }

        if let Some(message_id) = metadata.message_id {
            if self.message_id.is_none() {
                self.message_id = Some(message_id.clone());
                outcome.message_bound = Some(message_id);
            }
        }

        self.state = SessionState::Bound;
        outcome
    }

    /// Swap to the durable entry ids derived from the bound message id.
    pub(crate) fn rebind_entries(&mut self, user: EntryId, assistant: EntryId) {
        self.user_entry = user;
        self.assistant_entry = assistant;
    }

    /// Append a content delta. Returns the full content, or `None` once
    /// terminal.
    pub fn append(&mut self, delta: &str) -> Option<&str> {
        if self.state.is_terminal() {
            return None;
        }
        self.content.push_str(delta);
        Some(&self.content)
    }

    /// Move to `Finalized`. Returns `false` if already terminal.
    pub fn finalize(&mut self) -> bool {
        if self.state.is_terminal() {
            return false;
        }
        self.state = SessionState::Finalized;
        true
    }

    /// Move to `Failed`, replacing the content with `message`. Returns
    /// `false` if already terminal.
    pub fn fail(&mut self, message: &str) -> bool {
        if self.state.is_terminal() {
            return false;
        }
        self.content.clear();
        self.content.push_str(message);
        self.state = SessionState::Failed;
        true
    }
}

/// Final summary of a session, handed to
/// [`SessionListener::finished`](crate::SessionListener::finished) and
/// returned from [`ChatClient::submit`](crate::ChatClient::submit).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionReport {
    /// Terminal state.
    pub state: SessionState,
    /// Conversation the exchange belongs to, if known.
    pub conversation_id: Option<ConversationId>,
    /// Durable message id, if the server issued one.
    pub message_id: Option<MessageId>,
    /// Final assistant content.
    pub content: String,
    /// Whether the session ended because it was cancelled.
    pub cancelled: bool,
    /// Rendered error, when the session failed.
    pub error: Option<String>,
}
