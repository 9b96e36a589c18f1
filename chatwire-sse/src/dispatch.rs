//! Sequential read loop feeding the [`FrameDecoder`] and invoking callbacks.
//!
//! For any run exactly one of [`FrameHandler::on_complete`] and
//! [`FrameHandler::on_error`] fires, exactly once, and nothing fires after it.

use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chatwire_types::{InterruptCause, SseFrame, StreamError, StreamInterruptedError};
use futures::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;

use crate::decoder::FrameDecoder;

/// Receives dispatched frames and the terminal notification.
#[async_trait]
pub trait FrameHandler: Send {
    /// Called once per decoded frame, in arrival order.
    async fn on_frame(&mut self, frame: SseFrame);

    /// Called once if the stream fails. Nothing is dispatched afterwards.
    async fn on_error(&mut self, _error: StreamError) {}

    /// Called once when the stream ends normally or is cancelled.
    async fn on_complete(&mut self) {}
}

/// Knobs for one [`run`].
#[derive(Debug, Clone, Default)]
pub struct DispatchOptions {
    /// Fail the stream when no chunk arrives within this window.
    pub idle_timeout: Option<Duration>,
    /// Stops reading when cancelled. The decoder is not flushed.
    pub cancel: CancellationToken,
}

impl DispatchOptions {
    /// Set the idle window.
    pub fn with_idle_timeout(mut self, window: Duration) -> Self {
        self.idle_timeout = Some(window);
        self
    }

    /// Use the given cancellation token.
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// End of stream reached; `on_complete` fired.
    Completed {
        /// Frames dispatched, including a flushed trailing frame.
        frames: usize,
    },
    /// The stream failed; `on_error` fired.
    Failed {
        /// Frames dispatched before the failure.
        frames: usize,
    },
    /// The cancellation token fired; `on_complete` fired.
    Cancelled {
        /// Frames dispatched before cancellation.
        frames: usize,
    },
}

impl Termination {
    /// Frames dispatched during the run.
    pub fn frames(&self) -> usize {
        match self {
            Termination::Completed { frames }
            | Termination::Failed { frames }
            | Termination::Cancelled { frames } => *frames,
        }
    }
}

/// Read `stream` to the end, dispatching every decoded frame to `handler`.
pub async fn run<S, E, H>(stream: S, handler: &mut H, options: DispatchOptions) -> Termination
where
    S: Stream<Item = Result<Bytes, E>> + Send,
    E: std::fmt::Display,
    H: FrameHandler + ?Sized,
{
    let mut stream = std::pin::pin!(stream);
    let mut decoder = FrameDecoder::new();
    let mut frames = 0usize;

    loop {
        let next = tokio::select! {
            biased;
            _ = options.cancel.cancelled() => None,
            next = next_chunk(&mut stream, options.idle_timeout) => Some(next),
        };

        let Some(next) = next else {
            tracing::debug!(frames, "stream cancelled");
            handler.on_complete().await;
            return Termination::Cancelled { frames };
        };

        match next {
            Ok(Some(chunk)) => {
                for frame in decoder.feed(&chunk) {
                    if options.cancel.is_cancelled() {
                        tracing::debug!(frames, "stream cancelled mid-chunk");
                        handler.on_complete().await;
                        return Termination::Cancelled { frames };
                    }
                    frames += 1;
                    handler.on_frame(frame).await;
                }
            }
            Ok(None) => {
                if let Some(frame) = decoder.flush() {
                    frames += 1;
                    handler.on_frame(frame).await;
                }
                tracing::debug!(frames, "stream completed");
                handler.on_complete().await;
                return Termination::Completed { frames };
            }
            Err(cause) => {
                tracing::warn!(frames, %cause, "stream interrupted");
                let error = StreamInterruptedError {
                    frames_dispatched: frames,
                    cause,
                };
                handler.on_error(error.into()).await;
                return Termination::Failed { frames };
            }
        }
    }
}

async fn next_chunk<S, E>(
    stream: &mut Pin<&mut S>,
    idle_timeout: Option<Duration>,
) -> Result<Option<Bytes>, InterruptCause>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: std::fmt::Display,
{
    let item = match idle_timeout {
        Some(window) => tokio::time::timeout(window, stream.next())
            .await
            .map_err(|_| InterruptCause::IdleTimeout(window))?,
        None => stream.next().await,
    };
    match item {
        Some(Ok(chunk)) => Ok(Some(chunk)),
        Some(Err(e)) => Err(InterruptCause::Read(e.to_string())),
        None => Ok(None),
    }
}

type MessageFn<'a> = Box<dyn FnMut(SseFrame) + Send + 'a>;
type ErrorFn<'a> = Box<dyn FnMut(StreamError) + Send + 'a>;
type CompleteFn<'a> = Box<dyn FnMut() + Send + 'a>;

/// Closure-based [`FrameHandler`]: `on_message` is required, the terminal
/// callbacks are optional.
pub struct Callbacks<'a> {
    on_message: MessageFn<'a>,
    on_error: Option<ErrorFn<'a>>,
    on_complete: Option<CompleteFn<'a>>,
}

impl<'a> Callbacks<'a> {
    /// Create with the per-frame callback.
    pub fn new(on_message: impl FnMut(SseFrame) + Send + 'a) -> Self {
        Self {
            on_message: Box::new(on_message),
            on_error: None,
            on_complete: None,
        }
    }

    /// Set the error callback.
    pub fn on_error(mut self, f: impl FnMut(StreamError) + Send + 'a) -> Self {
        self.on_error = Some(Box::new(f));
        self
    }

    /// Set the completion callback.
    pub fn on_complete(mut self, f: impl FnMut() + Send + 'a) -> Self {
        self.on_complete = Some(Box::new(f));
        self
    }
}

#[async_trait]
impl FrameHandler for Callbacks<'_> {
    async fn on_frame(&mut self, frame: SseFrame) {
        (self.on_message)(frame);
    }

    async fn on_error(&mut self, error: StreamError) {
        if let Some(f) = self.on_error.as_mut() {
            f(error);
        }
    }

    async fn on_complete(&mut self) {
        if let Some(f) = self.on_complete.as_mut() {
            f();
        }
    }
}
