#![deny(missing_docs)]
//! # chatwire: umbrella crate
//!
//! Single import surface for the chatwire streaming chat client.
//! Re-exports the member crates behind feature flags, plus a `prelude` for
//! the happy path.

#[cfg(feature = "client")]
pub use chatwire_auth as auth;
#[cfg(feature = "auth-env")]
pub use chatwire_auth_env as auth_env;
#[cfg(feature = "auth-static")]
pub use chatwire_auth_static as auth_static;
#[cfg(feature = "client")]
pub use chatwire_session as session;
#[cfg(feature = "core")]
pub use chatwire_sse as sse;
#[cfg(feature = "client")]
pub use chatwire_transport as transport;
#[cfg(feature = "core")]
pub use chatwire_types as types;

/// Happy-path imports for submitting prompts and rendering transcripts.
pub mod prelude {
    #[cfg(feature = "core")]
    pub use chatwire_types::{
        AppId, ChatRequest, ConversationId, EntryId, MessageId, ModelId, Role, SseFrame,
        StreamError, TranscriptEntry, TransportError,
    };

    #[cfg(feature = "core")]
    pub use chatwire_sse::{Callbacks, DispatchOptions, FrameDecoder, FrameHandler, Termination};

    #[cfg(feature = "client")]
    pub use chatwire_auth::{BearerToken, CredentialChain, CredentialError, CredentialProvider};

    #[cfg(feature = "client")]
    pub use chatwire_transport::EventSource;

    #[cfg(feature = "client")]
    pub use chatwire_session::{
        ChatClient, SessionConfig, SessionListener, SessionReport, SessionState, SubmitError,
        Submission, Transcript, TranscriptChange, TranscriptObserver,
    };

    #[cfg(feature = "auth-env")]
    pub use chatwire_auth_env::EnvCredentials;

    #[cfg(feature = "auth-static")]
    pub use chatwire_auth_static::StaticCredentials;
}
