//! Event source client struct and builder.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use bytes::Bytes;
use chatwire_auth::CredentialProvider;
use chatwire_types::{ChatRequest, CompletionReply, TransportError};
use futures::stream::BoxStream;
use futures::{Stream, StreamExt};
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};

use crate::error::{
    ERROR_BODY_LIMIT, map_credential_error, map_http_status, map_reqwest_error, read_error_body,
};

/// Default platform base URL.
const DEFAULT_BASE_URL: &str = "http://localhost:8080";

/// Default streaming endpoint path.
const DEFAULT_STREAM_PATH: &str = "/api/chat/stream";

/// Default non-streaming endpoint path.
const DEFAULT_COMPLETION_PATH: &str = "/api/chat";

/// Default time allowed for reading a rejected response's body.
const DEFAULT_ERROR_BODY_TIMEOUT: Duration = Duration::from_secs(5);

/// Media type requested from the streaming endpoint.
const EVENT_STREAM: &str = "text/event-stream";

/// Raw response body stream.
pub type ByteStream = BoxStream<'static, Result<Bytes, reqwest::Error>>;

/// Issues chat requests against the platform's chat endpoints.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use chatwire_auth_static::StaticCredentials;
/// use chatwire_transport::EventSource;
///
/// let source = EventSource::new(Arc::new(StaticCredentials::new("token")))
///     .base_url("https://chat.example.com");
/// ```
pub struct EventSource {
    /// Platform base URL (override for testing or proxies).
    pub(crate) base_url: String,
    /// Path of the streaming endpoint.
    pub(crate) stream_path: String,
    /// Path of the non-streaming endpoint.
    pub(crate) completion_path: String,
    /// Supplies the bearer token for every request.
    pub(crate) credentials: Arc<dyn CredentialProvider>,
    /// Shared HTTP client.
    pub(crate) client: reqwest::Client,
    /// Time allowed for reading the body of a non-success response.
    pub(crate) error_body_timeout: Duration,
}

impl EventSource {
    /// Create a source with default endpoints.
    #[must_use]
    pub fn new(credentials: Arc<dyn CredentialProvider>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            stream_path: DEFAULT_STREAM_PATH.into(),
            completion_path: DEFAULT_COMPLETION_PATH.into(),
            credentials,
            client: reqwest::Client::new(),
            error_body_timeout: DEFAULT_ERROR_BODY_TIMEOUT,
        }
    }

    /// Override the base URL.
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Override the streaming endpoint path.
    #[must_use]
    pub fn stream_path(mut self, path: impl Into<String>) -> Self {
        self.stream_path = path.into();
        self
    }

    /// Override the non-streaming endpoint path.
    #[must_use]
    pub fn completion_path(mut self, path: impl Into<String>) -> Self {
        self.completion_path = path.into();
        self
    }

    /// Use a preconfigured HTTP client (timeouts, proxies).
    #[must_use]
    pub fn client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Limit how long a rejected response's body is read before failing.
    #[must_use]
    pub fn error_body_timeout(mut self, timeout: Duration) -> Self {
        self.error_body_timeout = timeout;
        self
    }

    pub(crate) fn stream_url(&self) -> String {
        format!("{}{}", self.base_url, self.stream_path)
    }

    pub(crate) fn completion_url(&self) -> String {
        format!("{}{}", self.base_url, self.completion_path)
    }

    /// Open the event stream for one prompt.
    ///
    /// Fails before returning when the response status is not a success, so
    /// no frame can ever be produced for a rejected request. The body is
    /// returned unread.
    pub async fn open(&self, request: &ChatRequest) -> Result<RawStream, TransportError> {
        let url = self.stream_url();
        let token = self
            .credentials
            .current_token()
            .await
            .map_err(map_credential_error)?;

        tracing::debug!(
            url = %url,
            app_id = %request.app_id,
            conversation_id = ?request.conversation_id.as_ref().map(|c| c.as_str()),
            "opening chat stream"
        );

        let response = self
            .client
            .post(&url)
            .header(AUTHORIZATION, token.authorization_header().as_str())
            .header(ACCEPT, EVENT_STREAM)
            .header(CONTENT_TYPE, "application/json")
            .json(request)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            let body =
                read_error_body(response, ERROR_BODY_LIMIT, self.error_body_timeout).await;
            tracing::warn!(status = status.as_u16(), "chat stream rejected");
            return Err(map_http_status(status, &body));
        }

        Ok(RawStream {
            status,
            body: response.bytes_stream().boxed(),
        })
    }

    /// Send the prompt to the non-streaming endpoint and wait for the full
    /// answer.
    pub async fn complete(&self, request: &ChatRequest) -> Result<CompletionReply, TransportError> {
        let url = self.completion_url();
        let token = self
            .credentials
            .current_token()
            .await
            .map_err(map_credential_error)?;

        tracing::debug!(url = %url, app_id = %request.app_id, "sending chat completion");

        let response = self
            .client
            .post(&url)
            .header(AUTHORIZATION, token.authorization_header().as_str())
            .header(CONTENT_TYPE, "application/json")
            .json(request)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            let body =
                read_error_body(response, ERROR_BODY_LIMIT, self.error_body_timeout).await;
            return Err(map_http_status(status, &body));
        }
        let text = response.text().await.map_err(map_reqwest_error)?;

        serde_json::from_str(&text)
            .map_err(|e| TransportError::Encode(format!("invalid completion reply: {e}")))
    }
}

impl std::fmt::Debug for EventSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSource")
            .field("base_url", &self.base_url)
            .field("stream_path", &self.stream_path)
            .field("completion_path", &self.completion_path)
            .finish_non_exhaustive()
    }
}

/// An opened, unconsumed response body.
///
/// Implements [`Stream`] so it can be handed straight to the dispatch loop.
pub struct RawStream {
    status: reqwest::StatusCode,
    body: ByteStream,
}

impl RawStream {
    /// Status of the response that opened the stream.
    pub fn status(&self) -> u16 {
        self.status.as_u16()
    }

    /// Take the body stream.
    pub fn into_body(self) -> ByteStream {
        self.body
    }
}

impl Stream for RawStream {
    type Item = Result<Bytes, reqwest::Error>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().body.poll_next_unpin(cx)
    }
}

impl std::fmt::Debug for RawStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawStream")
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}
