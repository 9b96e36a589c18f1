#![deny(missing_docs)]
//! Static credential provider that always returns the same token.
//!
//! Intended for dev/test use only. Not suitable for production.

use async_trait::async_trait;
use chatwire_auth::{BearerToken, CredentialError, CredentialProvider};

/// A credential provider that always returns the same token. Dev/test only.
pub struct StaticCredentials {
    token: String,
}

impl StaticCredentials {
    /// Create with a fixed token.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl std::fmt::Debug for StaticCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("StaticCredentials([REDACTED])")
    }
}

#[async_trait]
impl CredentialProvider for StaticCredentials {
    async fn current_token(&self) -> Result<BearerToken, CredentialError> {
        Ok(BearerToken::permanent(self.token.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn _assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn object_safety() {
        _assert_send_sync::<Arc<dyn CredentialProvider>>();
        let _: Arc<dyn CredentialProvider> = Arc::new(StaticCredentials::new("token"));
    }

    #[tokio::test]
    async fn returns_same_token_every_time() {
        let provider = StaticCredentials::new("fixed");
        let t1 = provider.current_token().await.unwrap();
        let t2 = provider.current_token().await.unwrap();
        t1.with_secret(|t| assert_eq!(t, "fixed"));
        t2.with_secret(|t| assert_eq!(t, "fixed"));
        assert!(!t1.is_expired());
    }

    #[test]
    fn debug_hides_token() {
        let debug = format!("{:?}", StaticCredentials::new("hunter2"));
        assert!(!debug.contains("hunter2"));
    }
}
