//! Error taxonomy shared by the transport, the dispatch loop, and the
//! reconciliation step.
//!
//! Both [`TransportError`] and [`StreamInterruptedError`] reach callers
//! through the single [`StreamError`] handed to `on_error`.

use std::time::Duration;
use thiserror::Error;

/// The stream could not be opened. No frame was or will be produced.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum TransportError {
    /// The server answered with a non-success status.
    #[error("HTTP {status} {status_text}")]
    Status {
        /// Numeric HTTP status.
        status: u16,
        /// Canonical reason phrase.
        status_text: String,
        /// Response body, if any.
        body: String,
    },

    /// The request timed out before a response arrived.
    #[error("request timed out")]
    Timeout,

    /// The connection could not be established (DNS, refused, TLS).
    #[error("connection failed: {0}")]
    Connect(String),

    /// Any other network-level failure (reset, protocol error).
    #[error("network error: {0}")]
    Network(String),

    /// No bearer credential could be obtained.
    #[error("credentials unavailable: {0}")]
    Credentials(String),

    /// The request or reply body could not be encoded or decoded.
    #[error("encoding error: {0}")]
    Encode(String),
}

impl TransportError {
    /// HTTP status of a [`TransportError::Status`] failure.
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the failure happened below HTTP (no response at all).
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            TransportError::Timeout | TransportError::Connect(_) | TransportError::Network(_)
        )
    }
}

/// Why a stream stopped after it was opened.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InterruptCause {
    /// Reading the body failed.
    #[error("read failed: {0}")]
    Read(String),

    /// No bytes arrived within the idle window.
    #[error("no data received for {0:?}")]
    IdleTimeout(Duration),
}

/// The stream broke after zero or more frames were dispatched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("stream interrupted after {frames_dispatched} frame(s): {cause}")]
pub struct StreamInterruptedError {
    /// Frames delivered before the failure.
    pub frames_dispatched: usize,
    /// What went wrong.
    pub cause: InterruptCause,
}

/// The single error value delivered to `on_error`.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum StreamError {
    /// Opening the stream failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The open stream failed mid-way.
    #[error(transparent)]
    Interrupted(#[from] StreamInterruptedError),
}

impl StreamError {
    /// HTTP status, when the failure was a non-success response.
    pub fn status(&self) -> Option<u16> {
        match self {
            StreamError::Transport(e) => e.status(),
            StreamError::Interrupted(_) => None,
        }
    }
}
