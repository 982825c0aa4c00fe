//! Fixture builders.
//!
//! Every fixture is stamped with [`test_clock`](crate::test_clock) time so
//! equality assertions stay deterministic.

#![allow(clippy::expect_used)]

use crate::mocks::test_clock;
use chrono::{DateTime, Duration, Utc};
use ocall_core::environment::Clock;
use ocall_core::{
    Event, EventId, GeoPoint, NewEvent, NewProfile, Profile, ProfileId, ProfileKind,
};

/// A valid point.
///
/// # Panics
///
/// Panics on out-of-range coordinates.
#[must_use]
pub fn point(latitude: f64, longitude: f64) -> GeoPoint {
    GeoPoint::new(latitude, longitude).expect("fixture coordinates must be valid")
}

/// A profile with no links and no location.
///
/// # Panics
///
/// Panics on a blank name.
#[must_use]
pub fn profile(kind: ProfileKind, name: &str) -> Profile {
    Profile::new(
        ProfileId::new(),
        NewProfile {
            kind,
            name: name.to_string(),
            location: None,
        },
        test_clock().now(),
    )
    .expect("fixture profile must be valid")
}

/// A venue profile at `location`.
#[must_use]
pub fn venue(name: &str, location: GeoPoint) -> Profile {
    let mut venue = profile(ProfileKind::Venue, name);
    venue.location = Some(location);
    venue
}

/// `days` after the fixed test instant.
#[must_use]
pub fn day(days: i64) -> DateTime<Utc> {
    test_clock().now() + Duration::days(days)
}

/// Event input placed in lower Manhattan, one week after the test instant.
#[must_use]
pub fn new_event(producer_id: ProfileId, tags: &[&str]) -> NewEvent {
    NewEvent::new("Late Set", tags, producer_id, day(7)).with_location(point(40.7128, -74.006))
}

/// A stored-shape event built from [`new_event`].
///
/// # Panics
///
/// Panics if `tags` is empty.
#[must_use]
pub fn event(producer_id: ProfileId, tags: &[&str]) -> Event {
    Event::new(EventId::new(), new_event(producer_id, tags), test_clock().now())
        .expect("fixture event must be valid")
}
