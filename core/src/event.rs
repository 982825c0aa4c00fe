//! Events published by producers.

use crate::error::ValidationError;
use crate::geo::GeoPoint;
use crate::ids::{EventId, ProfileId};
use crate::tag::normalize_tag_names;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Publication state of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    /// Not yet visible to performers.
    #[default]
    Draft,
    /// Accepting applications.
    Open,
    /// No longer accepting applications.
    Closed,
    /// Called off.
    Cancelled,
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Draft => "draft",
            Self::Open => "open",
            Self::Closed => "closed",
            Self::Cancelled => "cancelled",
        })
    }
}

impl FromStr for EventStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "draft" => Ok(Self::Draft),
            "open" => Ok(Self::Open),
            "closed" => Ok(Self::Closed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(ValidationError::new(
                "status",
                format!("invalid event status {other}. Allowed: draft, open, closed, cancelled"),
            )),
        }
    }
}

/// Input for creating an event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEvent {
    /// Event name.
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Tag names; at least one.
    pub tags: Vec<String>,
    /// Owning producer profile.
    pub producer_id: Option<ProfileId>,
    /// Hosting venue profile.
    #[serde(default)]
    pub venue_id: Option<ProfileId>,
    /// The event's own point, when there is no venue or it differs.
    #[serde(default)]
    pub location: Option<GeoPoint>,
    /// When the event happens.
    pub time: DateTime<Utc>,
    /// Application cutoff.
    #[serde(default)]
    pub apply_by: Option<DateTime<Utc>>,
    /// Initial status.
    #[serde(default)]
    pub status: EventStatus,
    /// Free-form pay description.
    #[serde(default)]
    pub pay_structure: String,
    /// Producer-defined application form.
    #[serde(default)]
    pub application_form: serde_json::Value,
}

impl NewEvent {
    /// Minimal input: name, one or more tags, producer and time.
    ///
    /// A venue or location must still be supplied before construction succeeds.
    #[must_use]
    pub fn new(name: impl Into<String>, tags: &[&str], producer_id: ProfileId, time: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            tags: tags.iter().map(|t| (*t).to_string()).collect(),
            producer_id: Some(producer_id),
            venue_id: None,
            location: None,
            time,
            apply_by: None,
            status: EventStatus::Draft,
            pay_structure: String::new(),
            application_form: serde_json::Value::Null,
        }
    }

    /// Set the venue.
    #[must_use]
    pub fn with_venue(mut self, venue_id: ProfileId) -> Self {
        self.venue_id = Some(venue_id);
        self
    }

    /// Set the event's own point.
    #[must_use]
    pub fn with_location(mut self, location: GeoPoint) -> Self {
        self.location = Some(location);
        self
    }

    /// Set the initial status.
    #[must_use]
    pub fn with_status(mut self, status: EventStatus) -> Self {
        self.status = status;
        self
    }
}

/// Partial update of an event.
///
/// `status` is changed through the dedicated status transition, not here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventUpdate {
    /// New name.
    pub name: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// Replacement tag list.
    pub tags: Option<Vec<String>>,
    /// Must equal the current producer if supplied.
    pub producer_id: Option<ProfileId>,
    /// New venue; `Some(None)` clears it.
    pub venue_id: Option<Option<ProfileId>>,
    /// New point; `Some(None)` clears it.
    pub location: Option<Option<GeoPoint>>,
    /// New time.
    pub time: Option<DateTime<Utc>>,
    /// New cutoff; `Some(None)` clears it.
    pub apply_by: Option<Option<DateTime<Utc>>>,
    /// New pay description.
    pub pay_structure: Option<String>,
    /// New application form.
    pub application_form: Option<serde_json::Value>,
}

/// An event owned by exactly one producer.
///
/// Invariants held by construction: non-empty name, at least one tag, a
/// producer, and a venue or an explicit location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Event ID.
    pub id: EventId,
    name: String,
    /// Free-form description.
    pub description: String,
    tags: BTreeSet<String>,
    producer_id: ProfileId,
    venue_id: Option<ProfileId>,
    location: Option<GeoPoint>,
    /// When the event happens.
    pub time: DateTime<Utc>,
    /// Application cutoff.
    pub apply_by: Option<DateTime<Utc>>,
    /// Publication state.
    pub status: EventStatus,
    /// Free-form pay description.
    pub pay_structure: String,
    /// Producer-defined application form.
    pub application_form: serde_json::Value,
    /// Optimistic concurrency version, bumped by the store on every update.
    pub version: u64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Event {
    /// Build an event from input.
    ///
    /// Does not check that the referenced profiles exist or that the tags
    /// are registered; that needs storage.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] for a blank name, no tags, no producer, or
    /// neither venue nor location.
    pub fn new(id: EventId, input: NewEvent, now: DateTime<Utc>) -> Result<Self, ValidationError> {
        let name = required_text("name", &input.name)?;
        let tags = normalize_tag_names(&input.tags)?;
        let producer_id = input
            .producer_id
            .ok_or_else(|| ValidationError::required("producer_id"))?;
        check_place(input.venue_id, input.location)?;

        Ok(Self {
            id,
            name,
            description: input.description,
            tags,
            producer_id,
            venue_id: input.venue_id,
            location: input.location,
            time: input.time,
            apply_by: input.apply_by,
            status: input.status,
            pay_structure: input.pay_structure,
            application_form: input.application_form,
            version: 0,
            created_at: now,
            updated_at: now,
        })
    }

    /// Event name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Tag names.
    #[must_use]
    pub const fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    /// Owning producer.
    #[must_use]
    pub const fn producer_id(&self) -> ProfileId {
        self.producer_id
    }

    /// Hosting venue, if any.
    #[must_use]
    pub const fn venue_id(&self) -> Option<ProfileId> {
        self.venue_id
    }

    /// The event's own point, if any.
    #[must_use]
    pub const fn location(&self) -> Option<GeoPoint> {
        self.location
    }

    /// Apply a partial update, returning the updated event.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] if the producer would change or any
    /// construction invariant would break.
    pub fn apply(&self, update: EventUpdate, now: DateTime<Utc>) -> Result<Self, ValidationError> {
        if let Some(producer_id) = update.producer_id {
            if producer_id != self.producer_id {
                return Err(ValidationError::new("producer_id", "producer_id is immutable"));
            }
        }

        let mut next = self.clone();
        if let Some(name) = update.name {
            next.name = required_text("name", &name)?;
        }
        if let Some(description) = update.description {
            next.description = description;
        }
        if let Some(tags) = update.tags {
            next.tags = normalize_tag_names(&tags)?;
        }
        if let Some(venue_id) = update.venue_id {
            next.venue_id = venue_id;
        }
        if let Some(location) = update.location {
            next.location = location;
        }
        check_place(next.venue_id, next.location)?;
        if let Some(time) = update.time {
            next.time = time;
        }
        if let Some(apply_by) = update.apply_by {
            next.apply_by = apply_by;
        }
        if let Some(pay_structure) = update.pay_structure {
            next.pay_structure = pay_structure;
        }
        if let Some(form) = update.application_form {
            next.application_form = form;
        }
        next.updated_at = now;
        Ok(next)
    }
}

pub(crate) fn required_text(field: &str, value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::required(field));
    }
    Ok(trimmed.to_string())
}

fn check_place(venue_id: Option<ProfileId>, location: Option<GeoPoint>) -> Result<(), ValidationError> {
    if venue_id.is_none() && location.is_none() {
        return Err(ValidationError::new(
            "location",
            "event needs a venue or a location",
        ));
    }
    Ok(())
}
