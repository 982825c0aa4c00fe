//! Bearer token verification.

use crate::error::{AuthError, Result};
use ocall_core::Identity;
use std::future::Future;

/// Verifies an opaque bearer token and yields the identity it was issued to.
///
/// The token format belongs to the external identity provider; this crate
/// only needs the stable subject it resolves to.
pub trait IdentityVerifier: Send + Sync {
    /// Verify `token`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Unauthenticated`] if the token is invalid,
    /// expired or revoked.
    fn verify(&self, token: &str) -> impl Future<Output = Result<Identity>> + Send;
}

/// Placeholder verifier type for an [`Authenticator`] built without one.
///
/// Every token is rejected.
///
/// [`Authenticator`]: crate::authenticator::Authenticator
#[derive(Debug, Clone, Copy, Default)]
pub struct NoVerifier;

impl IdentityVerifier for NoVerifier {
    async fn verify(&self, _token: &str) -> Result<Identity> {
        Err(AuthError::Unauthenticated)
    }
}
