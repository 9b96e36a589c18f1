#![deny(missing_docs)]
//! Credential provider that reads the bearer token from a process
//! environment variable.
//!
//! The variable is read on every call, so a token rotated by the host
//! process is picked up by the next request.

use async_trait::async_trait;
use chatwire_auth::{BearerToken, CredentialError, CredentialProvider};

/// Variable read by [`EnvCredentials::default`].
pub const DEFAULT_VAR: &str = "CHATWIRE_TOKEN";

/// Reads the token from an environment variable at call time.
#[derive(Debug, Clone)]
pub struct EnvCredentials {
    var_name: String,
}

impl EnvCredentials {
    /// Read from the named variable.
    pub fn new(var_name: impl Into<String>) -> Self {
        Self {
            var_name: var_name.into(),
        }
    }

    /// Name of the variable this provider reads.
    pub fn var_name(&self) -> &str {
        &self.var_name
    }
}

impl Default for EnvCredentials {
    fn default() -> Self {
        Self::new(DEFAULT_VAR)
    }
}

#[async_trait]
impl CredentialProvider for EnvCredentials {
    async fn current_token(&self) -> Result<BearerToken, CredentialError> {
        match std::env::var(&self.var_name) {
            Ok(val) if !val.trim().is_empty() => Ok(BearerToken::permanent(val.trim())),
            Ok(_) => Err(CredentialError::Unavailable(format!(
                "env var {} is empty",
                self.var_name
            ))),
            Err(_) => Err(CredentialError::Unavailable(format!(
                "env var {} not set",
                self.var_name
            ))),
        }
    }
}
