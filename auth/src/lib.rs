//! # ocall authentication & authorization
//!
//! Ownership-based access control for the booking core.
//!
//! ## Features
//!
//! - **Authentication**: service credential and bearer tokens resolved by a
//!   pluggable [`IdentityVerifier`]
//! - **Profile Directory**: identity-to-profile control and resource ownership
//! - **Authorization**: allow or deny per caller, resource and operation, with
//!   every denial reported as the same [`AuthError::Forbidden`]
//!
//! ## Flow
//!
//! ```text
//! Authorization header → Authenticator → Caller
//! Caller + Resource + Operation → Authorizer → ProfileDirectory → Decision
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use ocall_auth::*;
//!
//! let caller = authenticator.authenticate(header).await?;
//! authorizer
//!     .require(&caller, Resource::Event(event_id), Operation::Modify, deadline)
//!     .await?;
//! agenda.update_event(event_id, update, deadline).await?;
//! ```

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]

// Public modules
pub mod authenticator;
pub mod config;
pub mod directory;
pub mod engine;
pub mod error;
pub mod providers;

/// In-memory provider implementations for tests.
#[cfg(any(test, feature = "test-utils"))]
pub mod mocks;

// Re-export main types for convenience
pub use authenticator::Authenticator;
pub use config::AuthConfig;
pub use directory::ProfileDirectory;
pub use engine::{Authorizer, Caller, Decision, DenyReason, Operation, Resource};
pub use error::{AuthError, Result};
pub use providers::{IdentityVerifier, NoVerifier};
