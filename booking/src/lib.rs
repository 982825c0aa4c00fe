//! # ocall Booking
//!
//! Lifecycle services and event search for the ocall booking platform.
//!
//! - [`ProfileService`] creates profiles and manages the identity links on them.
//! - [`AgendaService`] owns events, applications, acts and the tag registry,
//!   enforcing every cross-entity invariant before it writes.
//! - [`EventSearch`] streams events filtered by time window and great-circle radius.
//!
//! Services are stateless request-scoped handles over the persistence
//! collaborators. Every operation takes the caller's [`Deadline`], and every
//! store call it makes runs under that deadline.
//!
//! [`Deadline`]: ocall_core::Deadline

pub mod config;
pub mod lifecycle;
pub mod profiles;
pub mod search;

pub use config::SearchConfig;
pub use lifecycle::AgendaService;
pub use profiles::ProfileService;
pub use search::{EventFilter, EventSearch, SearchQuery, TimeWindow};
