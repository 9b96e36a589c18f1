//! Submits prompts and runs their sessions to completion.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use chatwire_sse::{DispatchOptions, FrameHandler, run};
use chatwire_transport::EventSource;
use chatwire_types::{
    ChatRequest, ConversationId, ConversationMetadata, Role, TranscriptEntry,
};
use tokio_util::sync::CancellationToken;

use crate::config::SessionConfig;
use crate::error::SubmitError;
use crate::reconcile::{NoopListener, Reconciler, SessionListener};
use crate::session::{SessionReport, StreamSession};
use crate::transcript::Transcript;

/// One prompt submission: the request, the transcript it writes into, and
/// optional listener and cancellation token.
pub struct Submission {
    request: ChatRequest,
    transcript: Arc<Transcript>,
    listener: Arc<dyn SessionListener>,
    cancel: CancellationToken,
}

impl Submission {
    /// Submit `request`, recording the exchange in `transcript`.
    pub fn new(request: ChatRequest, transcript: Arc<Transcript>) -> Self {
        Self {
            request,
            transcript,
            listener: Arc::new(NoopListener),
            cancel: CancellationToken::new(),
        }
    }

    /// Receive session notifications.
    #[must_use]
    pub fn listener(mut self, listener: Arc<dyn SessionListener>) -> Self {
        self.listener = listener;
        self
    }

    /// Stop the session when `cancel` fires.
    #[must_use]
    pub fn cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}

impl std::fmt::Debug for Submission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Submission")
            .field("app_id", &self.request.app_id)
            .field("conversation_id", &self.request.conversation_id)
            .finish_non_exhaustive()
    }
}

/// Chat client: opens streams through an [`EventSource`] and reconciles
/// them into transcripts.
///
/// At most one session per conversation may be in flight. Submissions that
/// start a new conversation are never blocked.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use chatwire_auth_static::StaticCredentials;
/// use chatwire_session::{ChatClient, Submission, Transcript};
/// use chatwire_transport::EventSource;
/// use chatwire_types::ChatRequest;
///
/// # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
/// let source = EventSource::new(Arc::new(StaticCredentials::new("token")));
/// let client = ChatClient::new(source);
/// let transcript = Arc::new(Transcript::new());
///
/// let report = client
///     .submit(Submission::new(
///         ChatRequest::new("app-1", "gpt-4o", "Hello"),
///         transcript.clone(),
///     ))
///     .await?;
/// println!("{:?}: {}", report.state, report.content);
/// # Ok(())
/// # }
/// ```
pub struct ChatClient {
    source: EventSource,
    config: Arc<SessionConfig>,
    in_flight: Arc<Mutex<HashSet<ConversationId>>>,
}

impl ChatClient {
    /// Create a client with the default [`SessionConfig`].
    pub fn new(source: EventSource) -> Self {
        Self::with_config(source, SessionConfig::default())
    }

    /// Create a client with an explicit configuration.
    pub fn with_config(source: EventSource, config: SessionConfig) -> Self {
        Self {
            source,
            config: Arc::new(config),
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// The active configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Whether a session for `conversation_id` is currently streaming.
    pub fn is_streaming(&self, conversation_id: &ConversationId) -> bool {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(conversation_id)
    }

    /// Stream a response for the submission.
    ///
    /// The optimistic user and assistant entries are appended before any
    /// network I/O. Transport and stream failures do not surface as `Err`:
    /// they end the session in `Failed` and the report says why.
    pub async fn submit(&self, submission: Submission) -> Result<SessionReport, SubmitError> {
        let Submission {
            request,
            transcript,
            listener,
            cancel,
        } = submission;
        let lease = self.acquire(request.conversation_id.as_ref())?;
        let mut reconciler = self
            .prepare(request, transcript, listener)
            .await
            .with_cancel(cancel.clone())
            .with_lease(lease);

        let request = reconciler.session().request().clone();
        let opened = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            opened = self.source.open(&request) => Some(opened),
        };

        match opened {
            None => {
                tracing::debug!("submission cancelled before the stream opened");
                reconciler.on_complete().await;
            }
            Some(Err(e)) => reconciler.on_error(e.into()).await,
            Some(Ok(stream)) => {
                let options = DispatchOptions {
                    idle_timeout: self.config.idle_timeout,
                    cancel,
                };
                let termination = run(stream, &mut reconciler, options).await;
                tracing::debug!(frames = termination.frames(), "stream drained");
            }
        }

        Ok(reconciler.into_report())
    }

    /// Get the full response from the non-streaming endpoint.
    ///
    /// Leaves the transcript in the same final state the streaming path
    /// would for the same answer.
    pub async fn submit_blocking(
        &self,
        submission: Submission,
    ) -> Result<SessionReport, SubmitError> {
        let Submission {
            request,
            transcript,
            listener,
            cancel,
        } = submission;
        let lease = self.acquire(request.conversation_id.as_ref())?;
        let mut reconciler = self
            .prepare(request, transcript, listener)
            .await
            .with_cancel(cancel.clone())
            .with_lease(lease);

        let request = reconciler.session().request().clone();
        let replied = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            replied = self.source.complete(&request) => Some(replied),
        };

        match replied {
            None => reconciler.on_complete().await,
            Some(Err(e)) => reconciler.on_error(e.into()).await,
            Some(Ok(reply)) => {
                reconciler
                    .apply_metadata(ConversationMetadata {
                        conversation_id: Some(reply.conversation_id),
                        message_id: Some(reply.message_id),
                    })
                    .await;
                reconciler.apply_delta(&reply.content).await;
                reconciler.on_complete().await;
            }
        }

        Ok(reconciler.into_report())
    }

    async fn prepare(
        &self,
        request: ChatRequest,
        transcript: Arc<Transcript>,
        listener: Arc<dyn SessionListener>,
    ) -> Reconciler {
        let user = TranscriptEntry::optimistic(Role::User, request.prompt.clone());
        let assistant = TranscriptEntry::optimistic(Role::Assistant, "");
        let session = StreamSession::new(request, user.id.clone(), assistant.id.clone());
        transcript.append_exchange(user, assistant).await;
        tracing::debug!(
            app_id = %session.request().app_id,
            conversation_id = ?session.request().conversation_id.as_ref().map(|c| c.as_str()),
            "optimistic exchange appended"
        );
        Reconciler::new(session, transcript, listener, self.config.clone())
    }

    fn acquire(
        &self,
        conversation_id: Option<&ConversationId>,
    ) -> Result<Arc<ConversationLease>, SubmitError> {
        let lease = ConversationLease {
            in_flight: self.in_flight.clone(),
            held: Mutex::new(Vec::new()),
        };
        if let Some(id) = conversation_id {
            if !lease.claim(id) {
                tracing::debug!(conversation_id = %id, "rejecting concurrent submission");
                return Err(SubmitError::AlreadyStreaming(id.clone()));
            }
        }
        Ok(Arc::new(lease))
    }
}

impl std::fmt::Debug for ChatClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatClient")
            .field("source", &self.source)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// In-flight slots held by one session. Every claimed conversation is
/// released when the last handle drops.
#[derive(Debug)]
pub(crate) struct ConversationLease {
    in_flight: Arc<Mutex<HashSet<ConversationId>>>,
    held: Mutex<Vec<ConversationId>>,
}

impl ConversationLease {
    /// Mark `conversation_id` as streaming. Returns `false` if another
    /// session already holds it.
    pub(crate) fn claim(&self, conversation_id: &ConversationId) -> bool {
        let inserted = self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(conversation_id.clone());
        if inserted {
            self.held
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(conversation_id.clone());
        }
        inserted
    }
}

impl Drop for ConversationLease {
    fn drop(&mut self) {
        let held = std::mem::take(
            self.held
                .get_mut()
                .unwrap_or_else(PoisonError::into_inner),
        );
        let mut in_flight = self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        for id in &held {
            in_flight.remove(id);
        }
    }
}
