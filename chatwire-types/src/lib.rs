//! # chatwire-types: shared protocol types for chatwire
//!
//! Defines the vocabulary every other chatwire crate speaks:
//!
//! | Module | Types | What it covers |
//! |--------|-------|----------------|
//! | [`id`] | [`ConversationId`], [`MessageId`], [`EntryId`], ... | Typed identifiers |
//! | [`frame`] | [`SseFrame`], [`FrameKind`], [`ConversationMetadata`] | Decoded stream records |
//! | [`request`] | [`ChatRequest`], [`CompletionReply`] | Outbound request and fallback reply |
//! | [`error`] | [`TransportError`], [`StreamInterruptedError`], [`StreamError`] | Failure taxonomy |
//! | [`transcript`] | [`Role`], [`TranscriptEntry`] | Rendered chat turns |

#![deny(missing_docs)]

pub mod error;
pub mod frame;
pub mod id;
pub mod request;
pub mod transcript;

pub use error::{InterruptCause, StreamError, StreamInterruptedError, TransportError};
pub use frame::{
    ConversationMetadata, DEFAULT_EVENT, END_EVENT, FrameKind, METADATA_EVENT, SseFrame,
};
pub use id::{AppId, ConversationId, EntryId, LocalId, MessageId, ModelId};
pub use request::{ChatRequest, CompletionReply};
pub use transcript::{Role, TranscriptEntry};
