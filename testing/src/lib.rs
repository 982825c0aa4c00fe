//! # ocall Testing
//!
//! Testing utilities for the ocall booking core.
//!
//! This crate provides:
//! - In-memory implementations of the persistence collaborators, with
//!   latency and outage injection
//! - A fixed clock
//! - Fixture builders for profiles and events
//! - Property-based testing strategies
//!
//! ## Example
//!
//! ```
//! use ocall_core::store::ProfileStore;
//! use ocall_core::ProfileKind;
//! use ocall_testing::{InMemoryProfileStore, fixtures};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let store = InMemoryProfileStore::new();
//! let venue = fixtures::profile(ProfileKind::Venue, "Blue Room");
//! store.insert_profile(&venue).await.unwrap();
//! assert_eq!(store.get_profile(venue.id).await.unwrap().name(), "Blue Room");
//! # });
//! ```

use chrono::{DateTime, Utc};
use ocall_core::environment::Clock;

pub mod fixtures;
pub mod stores;

/// Mock implementations of environment traits.
pub mod mocks {
    use super::{Clock, DateTime, Utc};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use ocall_testing::mocks::FixedClock;
    /// use ocall_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// Panics if the hardcoded timestamp fails to parse, which cannot happen.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }
}

/// Property-based testing strategies for domain types.
pub mod properties {
    use ocall_core::{ApplicationStatus, GeoPoint, Identity};
    use proptest::prelude::*;

    /// Any valid coordinate.
    #[allow(clippy::unwrap_used)]
    pub fn geo_point() -> impl Strategy<Value = GeoPoint> {
        (-90.0f64..=90.0, -180.0f64..=180.0)
            .prop_map(|(lat, lon)| GeoPoint::new(lat, lon).unwrap())
    }

    /// Short opaque identities.
    pub fn identity() -> impl Strategy<Value = Identity> {
        "[a-z0-9]{4,12}".prop_map(Identity::new)
    }

    /// Any application status.
    pub fn application_status() -> impl Strategy<Value = ApplicationStatus> {
        prop::sample::select(ApplicationStatus::ALL.to_vec())
    }
}

/// Install a `tracing` subscriber for test output.
///
/// Honours `RUST_LOG`, defaulting to `warn`. Safe to call from every test;
/// only the first call installs anything.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_test_writer()
        .try_init();
}

// Re-export commonly used items
pub use mocks::{FixedClock, test_clock};
pub use stores::{Faults, InMemoryAgendaStore, InMemoryProfileStore};
