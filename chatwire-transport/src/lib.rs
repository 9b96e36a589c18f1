#![deny(missing_docs)]
//! HTTP transport for chatwire.
//!
//! [`EventSource::open`] posts a [`ChatRequest`](chatwire_types::ChatRequest)
//! as JSON with `Accept: text/event-stream` and a bearer token from the
//! injected [`CredentialProvider`](chatwire_auth::CredentialProvider), and
//! returns the response body untouched. Consuming the body is the dispatch
//! loop's job. [`EventSource::complete`] is the non-streaming variant.
//!
//! Failures are reported as [`TransportError`](chatwire_types::TransportError):
//! non-success statuses before any frame exists, network failures with a
//! distinguishable kind. Nothing is retried.

pub mod client;
pub(crate) mod error;

pub use client::{ByteStream, EventSource, RawStream};
