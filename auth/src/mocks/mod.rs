//! Mock provider implementations for testing.

pub mod identity;

pub use identity::MockIdentityVerifier;
