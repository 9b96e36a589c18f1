//! Applies dispatched frames to a [`StreamSession`] and its transcript.

use std::sync::Arc;

use async_trait::async_trait;
use chatwire_sse::FrameHandler;
use chatwire_types::{
    ConversationId, ConversationMetadata, EntryId, FrameKind, MessageId, SseFrame, StreamError,
};
use tokio_util::sync::CancellationToken;

use crate::client::ConversationLease;
use crate::config::SessionConfig;
use crate::session::{SessionReport, SessionState, StreamSession};
use crate::transcript::Transcript;

/// Caller-facing notifications for one session. All methods default to
/// no-ops.
pub trait SessionListener: Send + Sync {
    /// The submission started a new conversation and the server named it.
    /// Fires at most once per session.
    fn conversation_created(&self, _conversation_id: &ConversationId) {}

    /// The assistant content changed. Always carries the full text.
    fn content_updated(&self, _content: &str) {}

    /// The session reached a terminal state.
    fn finished(&self, _report: &SessionReport) {}
}

/// Listener that ignores every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopListener;

impl SessionListener for NoopListener {}

/// Drives one [`StreamSession`] from frames, writing through to a shared
/// [`Transcript`].
pub struct Reconciler {
    session: StreamSession,
    transcript: Arc<Transcript>,
    listener: Arc<dyn SessionListener>,
    config: Arc<SessionConfig>,
    cancel: CancellationToken,
    lease: Option<Arc<ConversationLease>>,
    error: Option<String>,
}

impl Reconciler {
    /// Create a reconciler for a session whose optimistic entries are
    /// already in `transcript`.
    pub fn new(
        session: StreamSession,
        transcript: Arc<Transcript>,
        listener: Arc<dyn SessionListener>,
        config: Arc<SessionConfig>,
    ) -> Self {
        Self {
            session,
            transcript,
            listener,
            config,
            cancel: CancellationToken::new(),
            lease: None,
            error: None,
        }
    }

    /// Token whose state marks a completion as a cancellation.
    #[must_use]
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// In-flight lease that also claims a conversation the server creates
    /// mid-stream.
    #[must_use]
    pub(crate) fn with_lease(mut self, lease: Arc<ConversationLease>) -> Self {
        self.lease = Some(lease);
        self
    }

    /// The session being driven.
    pub fn session(&self) -> &StreamSession {
        &self.session
    }

    /// Record identifiers from a metadata payload and swap both entry ids to
    /// durable ones the first time a message id arrives.
    pub async fn apply_metadata(&mut self, metadata: ConversationMetadata) {
        let outcome = self.session.bind(metadata);

        if let Some(conversation_id) = &outcome.conversation_created {
            tracing::debug!(conversation_id = %conversation_id, "conversation created");
            if let Some(lease) = &self.lease {
                if !lease.claim(conversation_id) {
                    tracing::warn!(
                        conversation_id = %conversation_id,
                        "created conversation is already streaming in another session"
                    );
                }
            }
            self.listener.conversation_created(conversation_id);
        }

        if let Some(message_id) = &outcome.message_bound {
            self.swap_to_durable(message_id).await;
        }
    }

    /// Append a content delta and publish the full content.
    pub async fn apply_delta(&mut self, delta: &str) {
        let Some(content) = self.session.append(delta).map(str::to_owned) else {
            return;
        };
        self.transcript
            .replace_content(self.session.assistant_entry(), &content)
            .await;
        self.listener.content_updated(&content);
    }

    /// Build the report for the current state.
    pub fn report(&self) -> SessionReport {
        SessionReport {
            state: self.session.state(),
            conversation_id: self.session.conversation_id().cloned(),
            message_id: self.session.message_id().cloned(),
            content: self.session.content().to_string(),
            cancelled: self.session.state() == SessionState::Finalized
                && self.cancel.is_cancelled(),
            error: self.error.clone(),
        }
    }

    /// Consume the reconciler, returning its final report.
    pub fn into_report(self) -> SessionReport {
        self.report()
    }

    async fn swap_to_durable(&mut self, message_id: &MessageId) {
        let user = EntryId::durable(message_id, &self.config.question_suffix);
        let assistant = EntryId::durable(message_id, &self.config.answer_suffix);

        let swapped = self
            .transcript
            .reconcile(
                self.session.user_entry(),
                self.session.assistant_entry(),
                user.clone(),
                assistant.clone(),
            )
            .await;

        if swapped {
            tracing::debug!(message_id = %message_id, "entry identifiers reconciled");
            self.session.rebind_entries(user, assistant);
        } else {
            tracing::warn!(
                message_id = %message_id,
                "optimistic entries not found in transcript; identifiers left unchanged"
            );
        }
    }
}

#[async_trait]
impl FrameHandler for Reconciler {
    async fn on_frame(&mut self, frame: SseFrame) {
        if self.session.state().is_terminal() {
            return;
        }
        match frame.kind() {
            FrameKind::Metadata(payload) => match ConversationMetadata::parse(payload) {
                Ok(metadata) => self.apply_metadata(metadata).await,
                Err(e) => tracing::warn!(error = %e, "ignoring malformed metadata payload"),
            },
            FrameKind::End => {
                tracing::debug!(
                    chars = self.session.content().chars().count(),
                    "end of assistant content"
                );
            }
            FrameKind::Delta(text) => self.apply_delta(text).await,
        }
    }

    async fn on_error(&mut self, error: StreamError) {
        if !self.session.fail(&self.config.failure_message) {
            return;
        }
        tracing::warn!(
            error = %error,
            conversation_id = ?self.session.conversation_id().map(|c| c.as_str()),
            "chat session failed"
        );
        self.error = Some(error.to_string());
        self.transcript
            .replace_content(self.session.assistant_entry(), &self.config.failure_message)
            .await;
        self.listener.content_updated(&self.config.failure_message);
        self.listener.finished(&self.report());
    }

    async fn on_complete(&mut self) {
        if !self.session.finalize() {
            return;
        }
        let report = self.report();
        tracing::debug!(
            cancelled = report.cancelled,
            conversation_id = ?report.conversation_id.as_ref().map(|c| c.as_str()),
            "chat session finalized"
        );
        self.listener.finished(&report);
    }
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("session", &self.session)
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{ListenerEvent, RecordingListener};
    use chatwire_types::{
        ChatRequest, InterruptCause, Role, StreamInterruptedError, TranscriptEntry,
        TransportError,
    };

    async fn setup(request: ChatRequest) -> (Reconciler, Arc<Transcript>, Arc<RecordingListener>) {
        let transcript = Arc::new(Transcript::new());
        let user = TranscriptEntry::optimistic(Role::User, request.prompt.clone());
        let assistant = TranscriptEntry::optimistic(Role::Assistant, "");
        let session = StreamSession::new(request, user.id.clone(), assistant.id.clone());
        transcript.append_exchange(user, assistant).await;

        let listener = Arc::new(RecordingListener::new());
        let reconciler = Reconciler::new(
            session,
            transcript.clone(),
            listener.clone(),
            Arc::new(SessionConfig::default()),
        );
        (reconciler, transcript, listener)
    }

    fn metadata(conversation: &str, message: &str) -> SseFrame {
        SseFrame::new(
            "metadata",
            format!(r#"{{"conversationId":"{conversation}","messageId":"{message}"}}"#),
        )
    }

    #[tokio::test]
    async fn example_sequence_builds_durable_exchange() {
        let (mut r, transcript, listener) = setup(ChatRequest::new("app", "model", "Hi")).await;

        r.on_frame(metadata("c1", "m1")).await;
        r.on_frame(SseFrame::message("Hello")).await;
        r.on_frame(SseFrame::message("World")).await;
        r.on_frame(SseFrame::new("end", "end")).await;
        r.on_complete().await;

        let entries = transcript.entries().await;
        assert_eq!(entries[0].id.as_str(), "m1-question");
        assert_eq!(entries[0].content, "Hi");
        assert_eq!(entries[1].id.as_str(), "m1-answer");
        assert_eq!(entries[1].content, "HelloWorld");

        assert_eq!(
            listener.events(),
            vec![
                ListenerEvent::ConversationCreated("c1".into()),
                ListenerEvent::ContentUpdated("Hello".into()),
                ListenerEvent::ContentUpdated("HelloWorld".into()),
                ListenerEvent::Finished(SessionState::Finalized),
            ]
        );

        let report = r.into_report();
        assert_eq!(report.state, SessionState::Finalized);
        assert_eq!(report.message_id, Some(MessageId::new("m1")));
        assert!(!report.cancelled);
    }

    #[tokio::test]
    async fn deltas_after_end_are_still_appended() {
        let (mut r, _transcript, _listener) = setup(ChatRequest::new("app", "model", "Hi")).await;
        r.on_frame(SseFrame::message("a")).await;
        r.on_frame(SseFrame::new("end", "end")).await;
        r.on_frame(SseFrame::message("b")).await;
        assert_eq!(r.session().content(), "ab");
    }

    #[tokio::test]
    async fn malformed_metadata_is_ignored() {
        let (mut r, transcript, listener) = setup(ChatRequest::new("app", "model", "Hi")).await;
        r.on_frame(SseFrame::new("metadata", "not json")).await;
        r.on_frame(SseFrame::message("x")).await;

        assert_eq!(r.session().state(), SessionState::Optimistic);
        assert!(transcript.entries().await.iter().all(|e| !e.id.is_durable()));
        assert_eq!(listener.events(), vec![ListenerEvent::ContentUpdated("x".into())]);
    }

    #[tokio::test]
    async fn error_overwrites_partial_content() {
        let (mut r, transcript, listener) = setup(ChatRequest::new("app", "model", "Hi")).await;
        r.on_frame(metadata("c1", "m1")).await;
        r.on_frame(SseFrame::message("partial")).await;
        r.on_error(
            StreamInterruptedError {
                frames_dispatched: 2,
                cause: InterruptCause::Read("reset".into()),
            }
            .into(),
        )
        .await;

        let failure = SessionConfig::default().failure_message;
        let answer = transcript
            .get(&EntryId::Durable("m1-answer".into()))
            .await
            .unwrap();
        assert_eq!(answer.content, failure);
        assert_eq!(
            listener.events().last(),
            Some(&ListenerEvent::Finished(SessionState::Failed))
        );

        // Terminal: nothing else is applied.
        r.on_frame(SseFrame::message("late")).await;
        r.on_complete().await;
        let report = r.into_report();
        assert_eq!(report.state, SessionState::Failed);
        assert_eq!(report.content, failure);
        assert!(report.error.unwrap().contains("reset"));
    }

    #[tokio::test]
    async fn transport_error_fails_optimistic_session() {
        let (mut r, transcript, _listener) = setup(ChatRequest::new("app", "model", "Hi")).await;
        r.on_error(
            TransportError::Status {
                status: 500,
                status_text: "Internal Server Error".into(),
                body: String::new(),
            }
            .into(),
        )
        .await;

        let entries = transcript.entries().await;
        assert_eq!(entries[1].content, SessionConfig::default().failure_message);
        assert!(!entries[1].id.is_durable());
        assert_eq!(r.report().error.as_deref(), Some("HTTP 500 Internal Server Error"));
    }

    #[tokio::test]
    async fn completion_under_cancelled_token_reports_cancelled() {
        let (r, _transcript, _listener) = setup(ChatRequest::new("app", "model", "Hi")).await;
        let cancel = CancellationToken::new();
        let mut r = r.with_cancel(cancel.clone());
        r.on_frame(SseFrame::message("Hel")).await;
        cancel.cancel();
        r.on_complete().await;

        let report = r.into_report();
        assert!(report.cancelled);
        assert_eq!(report.state, SessionState::Finalized);
        assert_eq!(report.content, "Hel");
    }

    #[tokio::test]
    async fn custom_suffixes_are_used() {
        let transcript = Arc::new(Transcript::new());
        let user = TranscriptEntry::optimistic(Role::User, "Hi");
        let assistant = TranscriptEntry::optimistic(Role::Assistant, "");
        let session = StreamSession::new(
            ChatRequest::new("app", "model", "Hi"),
            user.id.clone(),
            assistant.id.clone(),
        );
        transcript.append_exchange(user, assistant).await;
        let config = SessionConfig {
            question_suffix: "/q".into(),
            answer_suffix: "/a".into(),
            ..SessionConfig::default()
        };
        let mut r = Reconciler::new(
            session,
            transcript.clone(),
            Arc::new(NoopListener),
            Arc::new(config),
        );

        r.on_frame(metadata("c1", "m7")).await;
        let ids: Vec<_> = transcript
            .entries()
            .await
            .into_iter()
            .map(|e| e.id.to_string())
            .collect();
        assert_eq!(ids, vec!["m7/q", "m7/a"]);
    }

    fn _assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn listener_is_object_safe() {
        _assert_send_sync::<Arc<dyn SessionListener>>();
    }
}
