//! Errors returned before a session starts.

use chatwire_types::ConversationId;
use thiserror::Error;

/// A submission was refused. Stream failures are not reported here; they
/// end the session in [`SessionState::Failed`](crate::SessionState::Failed).
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    /// A session for this conversation is still streaming.
    #[error("conversation {0} already has a response in flight")]
    AlreadyStreaming(ConversationId),
}
