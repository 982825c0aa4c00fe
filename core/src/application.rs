//! Applications: a performer's bid to play an event.

use crate::error::ValidationError;
use crate::event::required_text;
use crate::ids::{ApplicationId, EventId, ProfileId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Where an application stands.
///
/// Any status may move to any other status; only re-applying the current
/// status is refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    /// Submitted, awaiting the producer.
    #[default]
    Pending,
    /// The producer made an offer.
    Offered,
    /// The performer accepted.
    Accepted,
    /// Turned down.
    Rejected,
}

impl ApplicationStatus {
    /// All statuses, in lifecycle order.
    pub const ALL: [Self; 4] = [Self::Pending, Self::Offered, Self::Accepted, Self::Rejected];
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pending => "pending",
            Self::Offered => "offered",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        })
    }
}

impl FromStr for ApplicationStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "offered" => Ok(Self::Offered),
            "accepted" => Ok(Self::Accepted),
            "rejected" => Ok(Self::Rejected),
            other => Err(ValidationError::new(
                "status",
                format!("invalid application status {other}. Allowed: pending, offered, accepted, rejected"),
            )),
        }
    }
}

/// Input for creating an application.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewApplication {
    /// Display name.
    pub name: String,
    /// Applying performer.
    pub performer_id: Option<ProfileId>,
    /// Target event.
    pub event_id: Option<EventId>,
    /// Initial status; defaults to pending.
    #[serde(default)]
    pub status: Option<ApplicationStatus>,
    /// Reference to the performer's form response.
    #[serde(default)]
    pub form_response_id: Option<String>,
}

/// Partial update of an application. The performer and event never change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationUpdate {
    /// New display name.
    pub name: Option<String>,
    /// New form response; `Some(None)` clears it.
    pub form_response_id: Option<Option<String>>,
}

/// A performer's application to an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    /// Application ID.
    pub id: ApplicationId,
    name: String,
    /// Current status.
    pub status: ApplicationStatus,
    performer_id: ProfileId,
    event_id: EventId,
    /// Reference to the performer's form response.
    pub form_response_id: Option<String>,
    /// Whether the producer bookmarked this application.
    pub saved: bool,
    /// Optimistic concurrency version, bumped by the store on every update.
    pub version: u64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Application {
    /// Build an application from input.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] for a blank name or a missing performer or event.
    pub fn new(id: ApplicationId, input: NewApplication, now: DateTime<Utc>) -> Result<Self, ValidationError> {
        let name = required_text("name", &input.name)?;
        let performer_id = input
            .performer_id
            .ok_or_else(|| ValidationError::required("performer_id"))?;
        let event_id = input
            .event_id
            .ok_or_else(|| ValidationError::required("event_id"))?;
        Ok(Self {
            id,
            name,
            status: input.status.unwrap_or_default(),
            performer_id,
            event_id,
            form_response_id: input.form_response_id,
            saved: false,
            version: 0,
            created_at: now,
            updated_at: now,
        })
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Applying performer.
    #[must_use]
    pub const fn performer_id(&self) -> ProfileId {
        self.performer_id
    }

    /// Target event.
    #[must_use]
    pub const fn event_id(&self) -> EventId {
        self.event_id
    }

    /// Apply a partial update.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] if the new name is blank.
    pub fn apply(&self, update: ApplicationUpdate, now: DateTime<Utc>) -> Result<Self, ValidationError> {
        let mut next = self.clone();
        if let Some(name) = update.name {
            next.name = required_text("name", &name)?;
        }
        if let Some(form_response_id) = update.form_response_id {
            next.form_response_id = form_response_id;
        }
        next.updated_at = now;
        Ok(next)
    }
}
