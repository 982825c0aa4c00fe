//! Spatio-temporal event search.
//!
//! A search combines an inclusive time window with an optional great-circle
//! radius around a point. Both are optional and compose conjunctively; with
//! neither, every event matches.
//!
//! [`EventFilter`] is the pure predicate. [`EventSearch`] drives it over the
//! store page by page and yields matches as a stream, so an unfiltered
//! search never holds more than one page in memory.
//!
//! # Example
//!
//! ```
//! use ocall_booking::{SearchQuery, TimeWindow};
//! use ocall_core::GeoPoint;
//!
//! let query = SearchQuery::all()
//!     .within(TimeWindow::unbounded())
//!     .near(GeoPoint::new(40.7128, -74.006).unwrap(), 1.0);
//! assert!(query.filter().is_ok());
//!
//! let missing_radius = SearchQuery { radius_km: None, ..query };
//! assert!(missing_radius.filter().is_err());
//! ```

use crate::config::SearchConfig;
use async_stream::try_stream;
use chrono::{DateTime, Utc};
use futures::Stream;
use ocall_core::store::{AgendaStore, ProfileStore};
use ocall_core::{Deadline, DomainError, Event, GeoPoint, ProfileId, Result, ValidationError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Inclusive bounds on an event's time. An absent bound is open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    /// Earliest matching time.
    pub start: Option<DateTime<Utc>>,
    /// Latest matching time.
    pub end: Option<DateTime<Utc>>,
}

impl TimeWindow {
    /// No bounds.
    #[must_use]
    pub const fn unbounded() -> Self {
        Self {
            start: None,
            end: None,
        }
    }

    /// Both bounds.
    #[must_use]
    pub const fn between(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    /// From `start` onwards.
    #[must_use]
    pub const fn since(start: DateTime<Utc>) -> Self {
        Self {
            start: Some(start),
            end: None,
        }
    }

    /// Up to `end`.
    #[must_use]
    pub const fn until(end: DateTime<Utc>) -> Self {
        Self {
            start: None,
            end: Some(end),
        }
    }

    /// Whether `time` falls inside the window, bounds included.
    #[must_use]
    pub fn contains(&self, time: DateTime<Utc>) -> bool {
        self.start.is_none_or(|start| time >= start) && self.end.is_none_or(|end| time <= end)
    }
}

/// A search request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchQuery {
    /// Time bounds.
    pub window: TimeWindow,
    /// Centre of the radius filter.
    pub center: Option<GeoPoint>,
    /// Radius in kilometres around `center`.
    pub radius_km: Option<f64>,
}

impl SearchQuery {
    /// Match every event.
    #[must_use]
    pub const fn all() -> Self {
        Self {
            window: TimeWindow::unbounded(),
            center: None,
            radius_km: None,
        }
    }

    /// Restrict to `window`.
    #[must_use]
    pub const fn within(mut self, window: TimeWindow) -> Self {
        self.window = window;
        self
    }

    /// Restrict to `radius_km` around `center`.
    #[must_use]
    pub const fn near(mut self, center: GeoPoint, radius_km: f64) -> Self {
        self.center = Some(center);
        self.radius_km = Some(radius_km);
        self
    }

    /// Validate into a predicate.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] when only one of `center` and `radius_km`
    /// is given, the radius is negative or not finite, or the window starts
    /// after it ends.
    pub fn filter(&self) -> std::result::Result<EventFilter, ValidationError> {
        if let (Some(start), Some(end)) = (self.window.start, self.window.end) {
            if start > end {
                return Err(ValidationError::new("window", "start is after end"));
            }
        }
        let radius = match (self.center, self.radius_km) {
            (None, None) => None,
            (Some(center), Some(radius_km)) => {
                if !radius_km.is_finite() || radius_km < 0.0 {
                    return Err(ValidationError::new(
                        "radius_km",
                        format!("{radius_km} is not a non-negative distance"),
                    ));
                }
                Some((center, radius_km))
            }
            (Some(_), None) => {
                return Err(ValidationError::new("radius_km", "a center needs a radius"));
            }
            (None, Some(_)) => {
                return Err(ValidationError::new("center", "a radius needs a center"));
            }
        };
        Ok(EventFilter {
            window: self.window,
            radius,
        })
    }
}

/// Pure predicate over an event and its resolved point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EventFilter {
    window: TimeWindow,
    radius: Option<(GeoPoint, f64)>,
}

impl EventFilter {
    /// Whether matching needs the event's point.
    #[must_use]
    pub const fn needs_point(&self) -> bool {
        self.radius.is_some()
    }

    /// Whether `event`, located at `point`, matches.
    ///
    /// `point` is the event's own location or, for venue-backed events, the
    /// venue's. An event without a point never matches a radius filter.
    #[must_use]
    pub fn matches(&self, event: &Event, point: Option<GeoPoint>) -> bool {
        if !self.window.contains(event.time) {
            return false;
        }
        match self.radius {
            None => true,
            Some((center, radius_km)) => point.is_some_and(|p| center.within_km(&p, radius_km)),
        }
    }
}

/// Streams events matching a [`SearchQuery`].
#[derive(Clone)]
pub struct EventSearch<A, P> {
    agenda: A,
    profiles: P,
    config: SearchConfig,
}

impl<A: AgendaStore, P: ProfileStore> EventSearch<A, P> {
    /// Create a search over the stores.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] if `config` is invalid.
    pub fn new(agenda: A, profiles: P, config: SearchConfig) -> std::result::Result<Self, ValidationError> {
        config.validate()?;
        Ok(Self {
            agenda,
            profiles,
            config,
        })
    }

    /// Search for events.
    ///
    /// The query is validated up front. The returned stream then fetches
    /// pages lazily; dropping it stops the search. Venue points are looked up
    /// once per search.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a malformed query. The stream yields
    /// store errors, including `DeadlineExceeded`, and ends after the first.
    pub fn search(
        &self,
        query: SearchQuery,
        deadline: Deadline,
    ) -> Result<impl Stream<Item = Result<Event>> + Send + '_> {
        let filter = query.filter()?;
        let page_size = self.config.page_size;
        tracing::debug!(?query, page_size, "Starting event search");

        Ok(try_stream! {
            let mut after = None;
            let mut venue_points: HashMap<ProfileId, Option<GeoPoint>> = HashMap::new();
            loop {
                let page = deadline.run(self.agenda.events_page(after, page_size)).await?;
                let exhausted = page.len() < page_size;
                let Some(last) = page.last() else {
                    break;
                };
                after = Some(last.id);

                for event in page {
                    let point = if filter.needs_point() {
                        self.event_point(&event, &mut venue_points, deadline).await?
                    } else {
                        None
                    };
                    if filter.matches(&event, point) {
                        yield event;
                    }
                }
                if exhausted {
                    break;
                }
            }
        })
    }

    /// The event's own point, else its venue's.
    async fn event_point(
        &self,
        event: &Event,
        venue_points: &mut HashMap<ProfileId, Option<GeoPoint>>,
        deadline: Deadline,
    ) -> Result<Option<GeoPoint>> {
        if let Some(point) = event.location() {
            return Ok(Some(point));
        }
        let Some(venue_id) = event.venue_id() else {
            return Ok(None);
        };
        if let Some(point) = venue_points.get(&venue_id) {
            return Ok(*point);
        }
        let point = match deadline.run(self.profiles.get_profile(venue_id)).await {
            Ok(profile) => profile.as_venue().and_then(|venue| venue.location()),
            Err(DomainError::NotFound { .. }) => {
                tracing::debug!(event_id = %event.id, venue_id = %venue_id, "Venue missing, event has no point");
                None
            }
            Err(e) => return Err(e),
        };
        venue_points.insert(venue_id, point);
        Ok(point)
    }
}
