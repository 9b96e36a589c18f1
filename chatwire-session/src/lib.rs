#![deny(missing_docs)]
//! Streaming sessions and transcript reconciliation for chatwire.
//!
//! A [`ChatClient`] turns each submitted prompt into a [`StreamSession`]:
//!
//! 1. Optimistic user and assistant entries with temporary ids are appended
//!    to the [`Transcript`] before any network I/O.
//! 2. The stream is opened and every frame goes through a [`Reconciler`].
//!    The first `metadata` frame binds the server ids and swaps both entry
//!    ids to durable ones in a single transcript write. Content deltas are
//!    appended and the full text is republished each time.
//! 3. The session ends `Finalized` on completion or cancellation, or
//!    `Failed` on any error, in which case the assistant entry shows
//!    [`SessionConfig::failure_message`]. Nothing mutates after that.
//!
//! Observers registered on the [`Transcript`] see every write, in order.

pub mod client;
pub mod config;
pub mod error;
pub mod reconcile;
pub mod session;
pub mod transcript;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use client::{ChatClient, Submission};
pub use config::SessionConfig;
pub use error::SubmitError;
pub use reconcile::{NoopListener, Reconciler, SessionListener};
pub use session::{BindOutcome, SessionReport, SessionState, StreamSession};
pub use transcript::{Transcript, TranscriptChange, TranscriptObserver};
