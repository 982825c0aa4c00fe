//! # ocall Core
//!
//! Domain model and collaborator contracts for the ocall booking platform.
//!
//! Identities (opaque strings issued by an external identity provider) hold
//! one or more typed profiles: performers, producers and venues. Producers
//! publish [`Event`]s, performers submit [`Application`]s to them and
//! producers curate [`Act`]s.
//!
//! This crate contains no I/O. It provides:
//!
//! - Value types whose constructors enforce the structural invariants
//!   (non-empty names, at least one tag, venue-or-location, ...)
//! - The error taxonomy shared by every layer ([`DomainError`], [`ValidationError`])
//! - The great-circle metric used by event search ([`GeoPoint`])
//! - Deadlines threaded through every collaborator call ([`Deadline`])
//! - The persistence contracts ([`store::ProfileStore`], [`store::AgendaStore`])
//!
//! ## Ownership graph
//!
//! ```text
//! Identity ──UserLink──▶ Profile ◀──producer_id── Event ◀──event_id── Application
//!                           ▲                                            │
//!                           └──────────────performer_id──────────────────┘
//! ```
//!
//! A profile is controlled by every identity linked to it; an event by the
//! controllers of its producer; an application jointly by the controllers of
//! its performer and of its event's producer.

pub mod act;
pub mod application;
pub mod deadline;
pub mod error;
pub mod event;
pub mod geo;
pub mod ids;
pub mod profile;
pub mod store;
pub mod tag;

// Re-export commonly used types
pub use act::{Act, ActUpdate, Media, MediaKind, NewAct};
pub use application::{Application, ApplicationStatus, ApplicationUpdate, NewApplication};
pub use chrono::{DateTime, Utc};
pub use deadline::Deadline;
pub use error::{DomainError, EntityKind, Result, ValidationError};
pub use event::{Event, EventStatus, EventUpdate, NewEvent};
pub use geo::GeoPoint;
pub use ids::{ActId, ApplicationId, EventId, Identity, ParseIdError, ProfileId, TagId};
pub use profile::{
    NewProfile, Performer, Permission, Producer, Profile, ProfileKind, ProfileUpdate, UserLink,
    Venue,
};
pub use tag::Tag;

/// Environment module - injected dependencies that are not persistence.
pub mod environment {
    use chrono::{DateTime, Utc};

    /// Clock trait - abstracts time operations for testability.
    ///
    /// Services stamp `created_at`/`updated_at` through this trait so tests
    /// can run against a fixed instant.
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Wall-clock implementation of [`Clock`].
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }
}
