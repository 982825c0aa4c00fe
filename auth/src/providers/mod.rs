//! External collaborators of the auth layer.
//!
//! Providers are interfaces, not implementations. The [`Authenticator`]
//! depends on these traits; the embedding application supplies concrete
//! verifiers and tests use the in-memory mocks.
//!
//! [`Authenticator`]: crate::authenticator::Authenticator

pub mod identity;

pub use identity::{IdentityVerifier, NoVerifier};
