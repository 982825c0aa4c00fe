//! Error types shared by every layer of the booking core.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Result type alias for domain operations.
pub type Result<T> = std::result::Result<T, DomainError>;

/// Malformed or invariant-violating input. Always a client fault.
///
/// Carries the offending field so callers can report precisely what was
/// wrong instead of a generic failure.
///
/// # Examples
///
/// ```
/// # use ocall_core::ValidationError;
/// let err = ValidationError::new("tags", "event must have at least one tag");
/// assert_eq!(err.field, "tags");
/// assert_eq!(err.to_string(), "invalid tags: event must have at least one tag");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("invalid {field}: {reason}")]
pub struct ValidationError {
    /// Name of the offending field.
    pub field: String,
    /// Human-readable reason.
    pub reason: String,
}

impl ValidationError {
    /// Create a new validation error.
    #[must_use]
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// A required field was empty.
    #[must_use]
    pub fn required(field: impl Into<String>) -> Self {
        let field = field.into();
        let reason = format!("{field} is required");
        Self { field, reason }
    }
}

/// The kind of entity an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// A performer, producer or venue profile.
    Profile,
    /// An identity-to-profile link.
    UserLink,
    /// An event.
    Event,
    /// An application to an event.
    Application,
    /// An act.
    Act,
    /// A registered tag.
    Tag,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Profile => "profile",
            Self::UserLink => "user link",
            Self::Event => "event",
            Self::Application => "application",
            Self::Act => "act",
            Self::Tag => "tag",
        };
        f.write_str(name)
    }
}

/// Error taxonomy for lifecycle, directory and search operations.
///
/// Authentication failures (`Unauthenticated`, `Forbidden`) live in the
/// auth crate; everything that can happen below the authorization boundary
/// is here.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// Input violated a structural or cross-entity invariant.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A referenced entity does not exist.
    #[error("{entity} {id} not found")]
    NotFound {
        /// Kind of the missing entity
        entity: EntityKind,
        /// Identifier that was looked up
        id: String,
    },

    /// The requested change would leave the entity as it already is.
    #[error("{entity} {id} already has {field} = {value}")]
    NoOp {
        /// Kind of the entity
        entity: EntityKind,
        /// Identifier of the entity
        id: String,
        /// Field that was being changed
        field: &'static str,
        /// Value it already holds
        value: String,
    },

    /// Optimistic concurrency conflict: the entity changed between read and write.
    #[error("{entity} {id} was modified concurrently: expected version {expected}, found {actual}")]
    Conflict {
        /// Kind of the entity
        entity: EntityKind,
        /// Identifier of the entity
        id: String,
        /// Version the writer read
        expected: u64,
        /// Version currently stored
        actual: u64,
    },

    /// The caller-supplied deadline elapsed before the operation finished.
    #[error("Deadline exceeded")]
    DeadlineExceeded,

    /// The persistence collaborator failed.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl DomainError {
    /// Shorthand for [`DomainError::NotFound`].
    #[must_use]
    pub fn not_found(entity: EntityKind, id: impl fmt::Display) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Shorthand for a [`ValidationError`] wrapped in [`DomainError::Validation`].
    #[must_use]
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation(ValidationError::new(field, reason))
    }

    /// Returns `true` for [`DomainError::NotFound`].
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns `true` if this error is due to the caller's input rather than
    /// a fault on our side.
    ///
    /// # Examples
    ///
    /// ```
    /// # use ocall_core::{DomainError, EntityKind};
    /// assert!(DomainError::not_found(EntityKind::Event, "e-1").is_client_error());
    /// assert!(!DomainError::Storage("down".into()).is_client_error());
    /// ```
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::NotFound { .. } | Self::NoOp { .. }
        )
    }
}
