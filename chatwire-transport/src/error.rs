//! Internal helpers for mapping HTTP/reqwest errors to [`TransportError`].

use std::time::Duration;

use chatwire_auth::CredentialError;
use chatwire_types::TransportError;

/// Most bytes of a rejected response's body kept for the error.
pub(crate) const ERROR_BODY_LIMIT: usize = 64 * 1024;

/// Map a non-success status and its body to [`TransportError::Status`].
pub(crate) fn map_http_status(status: reqwest::StatusCode, body: &str) -> TransportError {
    TransportError::Status {
        status: status.as_u16(),
        status_text: status.canonical_reason().unwrap_or_default().to_string(),
        body: body.to_string(),
    }
}

/// Read at most `limit` bytes of a rejected response's body, giving up after
/// `timeout`. Whatever arrived by then is kept; read errors end the body.
pub(crate) async fn read_error_body(
    mut response: reqwest::Response,
    limit: usize,
    timeout: Duration,
) -> String {
    let mut body = Vec::new();
    let read = async {
        while body.len() < limit {
            match response.chunk().await {
                Ok(Some(chunk)) => body.extend_from_slice(&chunk),
                Ok(None) | Err(_) => break,
            }
        }
    };
    if tokio::time::timeout(timeout, read).await.is_err() {
        tracing::debug!(limit, ?timeout, "gave up reading error body");
    }
    body.truncate(limit);
    String::from_utf8_lossy(&body).into_owned()
}

/// Map a [`reqwest::Error`] to a [`TransportError`].
pub(crate) fn map_reqwest_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout
    } else if err.is_connect() {
        TransportError::Connect(err.to_string())
    } else if err.is_decode() || err.is_body() {
        TransportError::Encode(err.to_string())
    } else {
        TransportError::Network(err.to_string())
    }
}

/// Map a credential lookup failure.
pub(crate) fn map_credential_error(err: CredentialError) -> TransportError {
    TransportError::Credentials(err.to_string())
}
