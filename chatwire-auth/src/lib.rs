#![deny(missing_docs)]
//! Credential providers for the chatwire transport.
//!
//! The transport never reads a session token from global state. It is handed
//! an `Arc<dyn CredentialProvider>` and asks it for the current token right
//! before every request. [`CredentialChain`] composes several providers and
//! returns the first token any of them produces.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::SystemTime;
use thiserror::Error;
use zeroize::Zeroizing;

/// Errors from credential providers.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum CredentialError {
    /// No credential is available (signed out, variable unset).
    #[error("credential unavailable: {0}")]
    Unavailable(String),

    /// A credential exists but is past its expiry.
    #[error("credential expired")]
    Expired,

    /// The backing session store failed.
    #[error("backend error: {0}")]
    Backend(String),

    /// Catch-all.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// An opaque bearer token with optional expiry.
///
/// Cannot be cloned, displayed, or serialized. Memory is zeroed on drop.
/// The only way to read the token is [`BearerToken::with_secret`].
pub struct BearerToken {
    inner: Zeroizing<String>,
    expires_at: Option<SystemTime>,
}

impl BearerToken {
    /// Create a token that expires at the given time.
    pub fn new(token: impl Into<String>, expires_at: Option<SystemTime>) -> Self {
        Self {
            inner: Zeroizing::new(token.into()),
            expires_at,
        }
    }

    /// Create a token that never expires.
    pub fn permanent(token: impl Into<String>) -> Self {
        Self::new(token, None)
    }

    /// Scoped exposure of the token text.
    pub fn with_secret<R>(&self, f: impl FnOnce(&str) -> R) -> R {
        f(&self.inner)
    }

    /// Render the `Authorization` header value.
    pub fn authorization_header(&self) -> Zeroizing<String> {
        Zeroizing::new(format!("Bearer {}", self.inner.as_str()))
    }

    /// Check if this token has expired.
    pub fn is_expired(&self) -> bool {
        self.expires_at
            .map(|exp| SystemTime::now() > exp)
            .unwrap_or(false)
    }

    /// Returns when this token expires, if known.
    pub fn expires_at(&self) -> Option<SystemTime> {
        self.expires_at
    }
}

impl std::fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BearerToken")
            .field("value", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Supplies the bearer credential attached to outbound requests.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Return the token for the current session.
    async fn current_token(&self) -> Result<BearerToken, CredentialError>;
}

/// Tries providers in order until one returns a live token.
///
/// Expired tokens count as failures so the next provider gets a chance.
pub struct CredentialChain {
    providers: Vec<Arc<dyn CredentialProvider>>,
}

impl CredentialChain {
    /// Create a new empty chain.
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
        }
    }

    /// Add a provider to the end of the chain.
    pub fn with_provider(mut self, provider: Arc<dyn CredentialProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    /// Add a provider to the end of the chain (mutable).
    pub fn add(&mut self, provider: Arc<dyn CredentialProvider>) {
        self.providers.push(provider);
    }
}

impl Default for CredentialChain {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CredentialProvider for CredentialChain {
    async fn current_token(&self) -> Result<BearerToken, CredentialError> {
        let mut last_err = None;
        for provider in &self.providers {
            match provider.current_token().await {
                Ok(token) if token.is_expired() => last_err = Some(CredentialError::Expired),
                Ok(token) => return Ok(token),
                Err(e) => last_err = Some(e),
            }
        }
        Err(last_err
            .unwrap_or_else(|| CredentialError::Unavailable("no providers configured".into())))
    }
}
