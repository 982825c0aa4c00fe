//! Mock identity verifier for testing.

use crate::error::{AuthError, Result};
use crate::providers::IdentityVerifier;
use ocall_core::Identity;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Mock identity verifier.
///
/// Maps tokens to identities in memory. Unknown tokens are rejected.
#[derive(Debug, Clone, Default)]
pub struct MockIdentityVerifier {
    tokens: Arc<Mutex<HashMap<String, Identity>>>,
}

impl MockIdentityVerifier {
    /// Create a verifier that knows no tokens.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`Self::insert`].
    #[must_use]
    pub fn with_token(self, token: impl Into<String>, identity: Identity) -> Self {
        self.insert(token, identity);
        self
    }

    /// Accept `token` as `identity` from now on.
    pub fn insert(&self, token: impl Into<String>, identity: Identity) {
        if let Ok(mut tokens) = self.tokens.lock() {
            tokens.insert(token.into(), identity);
        }
    }

    /// Stop accepting `token`.
    pub fn revoke(&self, token: &str) {
        if let Ok(mut tokens) = self.tokens.lock() {
            tokens.remove(token);
        }
    }
}

impl IdentityVerifier for MockIdentityVerifier {
    async fn verify(&self, token: &str) -> Result<Identity> {
        self.tokens
            .lock()
            .map_err(|_| AuthError::Unauthenticated)?
            .get(token)
            .cloned()
            .ok_or(AuthError::Unauthenticated)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn known_tokens_resolve_and_revoked_ones_fail() {
        let verifier = MockIdentityVerifier::new().with_token("tok", Identity::new("uid-1"));
        assert_eq!(verifier.verify("tok").await.unwrap(), Identity::new("uid-1"));
        assert_eq!(verifier.verify("other").await.unwrap_err(), AuthError::Unauthenticated);

        verifier.revoke("tok");
        assert!(verifier.verify("tok").await.is_err());
    }
}
