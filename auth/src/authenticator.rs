//! Turns a request's `Authorization` header into a [`Caller`].
//!
//! Two schemes are understood:
//!
//! - `Basic <base64 user:password>` matching the configured service
//!   credential yields [`Caller::Service`]. Any other Basic credential is a
//!   hard failure, before authorization runs.
//! - `Bearer <token>` is handed to the [`IdentityVerifier`].
//!
//! Without a verifier the configured development identity, if any, stands in
//! for every bearer token and for requests without a header.

use crate::config::AuthConfig;
use crate::engine::Caller;
use crate::error::{AuthError, Result};
use crate::providers::{IdentityVerifier, NoVerifier};
use constant_time_eq::constant_time_eq;

/// Authenticates requests.
#[derive(Debug, Clone)]
pub struct Authenticator<V> {
    verifier: Option<V>,
    config: AuthConfig,
}

impl Authenticator<NoVerifier> {
    /// An authenticator with no identity provider. Only the service
    /// credential and the development identity are accepted.
    #[must_use]
    pub const fn without_verifier(config: AuthConfig) -> Self {
        Self {
            verifier: None,
            config,
        }
    }
}

impl<V: IdentityVerifier> Authenticator<V> {
    /// An authenticator backed by `verifier`.
    #[must_use]
    pub const fn new(config: AuthConfig, verifier: V) -> Self {
        Self {
            verifier: Some(verifier),
            config,
        }
    }

    /// The configuration in use.
    #[must_use]
    pub const fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Resolve the caller behind `authorization`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidServiceCredential`] for a Basic credential
    /// that does not match, and [`AuthError::Unauthenticated`] when no
    /// identity can be established.
    #[tracing::instrument(skip_all)]
    pub async fn authenticate(&self, authorization: Option<&str>) -> Result<Caller> {
        let Some(header) = authorization.map(str::trim).filter(|h| !h.is_empty()) else {
            return self.fallback_identity();
        };

        let (scheme, credential) = header.split_once(' ').unwrap_or((header, ""));
        let credential = credential.trim();

        if scheme.eq_ignore_ascii_case("basic") {
            return self.service_caller(credential);
        }

        if scheme.eq_ignore_ascii_case("bearer") {
            if credential.is_empty() {
                return Err(AuthError::Unauthenticated);
            }
            return match &self.verifier {
                Some(verifier) => match verifier.verify(credential).await {
                    Ok(identity) => {
                        tracing::debug!(identity = %identity, "Bearer token verified");
                        Ok(Caller::Identity(identity))
                    }
                    Err(e) => {
                        tracing::debug!(error = %e, "Bearer token rejected");
                        Err(AuthError::Unauthenticated)
                    }
                },
                None => self.fallback_identity(),
            };
        }

        tracing::debug!(scheme, "Unsupported authorization scheme");
        Err(AuthError::Unauthenticated)
    }

    fn service_caller(&self, credential: &str) -> Result<Caller> {
        let Some(expected) = self.config.encoded_service_credential() else {
            tracing::warn!("Service credential presented but none is configured");
            return Err(AuthError::InvalidServiceCredential);
        };
        if constant_time_eq(credential.as_bytes(), expected.as_bytes()) {
            tracing::debug!("Service caller authenticated");
            Ok(Caller::Service)
        } else {
            tracing::warn!("Invalid service credential");
            Err(AuthError::InvalidServiceCredential)
        }
    }

    fn fallback_identity(&self) -> Result<Caller> {
        if self.verifier.is_some() {
            return Err(AuthError::Unauthenticated);
        }
        self.config
            .dev_identity
            .clone()
            .map(Caller::Identity)
            .ok_or(AuthError::Unauthenticated)
    }
}
