//! Error types for authentication and authorization.

use ocall_core::DomainError;
use thiserror::Error;

/// Result type alias for auth operations.
pub type Result<T> = std::result::Result<T, AuthError>;

/// Errors raised at the authentication and authorization boundary.
///
/// Every authorization denial surfaces as the same [`AuthError::Forbidden`],
/// whatever the internal reason, so callers cannot probe which resources exist.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    // ═══════════════════════════════════════════════════════════
    // Authentication Errors
    // ═══════════════════════════════════════════════════════════

    /// No verifiable identity on the request.
    #[error("Unauthenticated")]
    Unauthenticated,

    /// A service credential was presented and did not match.
    #[error("Invalid service credential")]
    InvalidServiceCredential,

    // ═══════════════════════════════════════════════════════════
    // Authorization Errors
    // ═══════════════════════════════════════════════════════════

    /// The caller may not perform this operation on this resource.
    #[error("Forbidden")]
    Forbidden,

    // ═══════════════════════════════════════════════════════════
    // Infrastructure Errors
    // ═══════════════════════════════════════════════════════════

    /// Configuration is missing or inconsistent.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A domain operation failed.
    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl AuthError {
    /// Returns `true` if this error is due to the caller rather than a fault
    /// on our side.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        match self {
            Self::Unauthenticated | Self::InvalidServiceCredential | Self::Forbidden => true,
            Self::Configuration(_) => false,
            Self::Domain(e) => e.is_client_error(),
        }
    }
}
