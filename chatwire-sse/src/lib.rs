#![deny(missing_docs)]
//! Event-stream decoding and dispatch for chatwire.
//!
//! - [`FrameDecoder`] is an explicit accumulator: `feed` bytes in, get
//!   complete [`SseFrame`](chatwire_types::SseFrame)s out, `flush` at end of
//!   input. It is independent of any I/O and can be driven by hand.
//! - [`run`] owns one decoder, reads a byte stream chunk by chunk, and calls a
//!   [`FrameHandler`] strictly in arrival order. Exactly one of `on_complete`
//!   or `on_error` ends every run.

pub mod decoder;
pub mod dispatch;

pub use decoder::FrameDecoder;
pub use dispatch::{Callbacks, DispatchOptions, FrameHandler, Termination, run};
