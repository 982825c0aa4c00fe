//! Acts: a performer's reusable offering, optionally confirmed for an event.

use crate::error::ValidationError;
use crate::event::required_text;
use crate::ids::{ActId, EventId, ProfileId};
use crate::tag::normalize_tag_names;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Kind of media attached to an act.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// Still image.
    Image,
    /// Audio clip.
    Audio,
    /// Video clip.
    Video,
    /// External link.
    Link,
}

/// A media reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Media {
    /// What the URL points at.
    pub kind: MediaKind,
    /// Where it lives.
    pub url: String,
}

/// Input for creating an act.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewAct {
    /// Act name.
    pub name: String,
    /// Tag names; at least one.
    pub tags: Vec<String>,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Attached media.
    #[serde(default)]
    pub media: Vec<Media>,
    /// Form the performer fills for this act.
    #[serde(default)]
    pub application_form: serde_json::Value,
    /// Owning performer.
    pub performer_id: Option<ProfileId>,
}

/// Partial update of an act. The performer never changes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActUpdate {
    /// New name.
    pub name: Option<String>,
    /// Replacement tag list.
    pub tags: Option<Vec<String>>,
    /// New description.
    pub description: Option<String>,
    /// Replacement media list.
    pub media: Option<Vec<Media>>,
    /// New form.
    pub application_form: Option<serde_json::Value>,
}

/// A performer's act.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Act {
    /// Act ID.
    pub id: ActId,
    name: String,
    tags: BTreeSet<String>,
    /// Free-form description.
    pub description: String,
    /// Attached media.
    pub media: Vec<Media>,
    /// Form the performer fills for this act.
    pub application_form: serde_json::Value,
    performer_id: ProfileId,
    /// Event this act is confirmed for, if any.
    pub event_id: Option<EventId>,
    /// Optimistic concurrency version, bumped by the store on every update.
    pub version: u64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Act {
    /// Build an act from input.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] for a blank name, no tags or no performer.
    pub fn new(id: ActId, input: NewAct, now: DateTime<Utc>) -> Result<Self, ValidationError> {
        let name = required_text("name", &input.name)?;
        let performer_id = input
            .performer_id
            .ok_or_else(|| ValidationError::required("performer_id"))?;
        let tags = normalize_tag_names(&input.tags)?;
        Ok(Self {
            id,
            name,
            tags,
            description: input.description,
            media: input.media,
            application_form: input.application_form,
            performer_id,
            event_id: None,
            version: 0,
            created_at: now,
            updated_at: now,
        })
    }

    /// Act name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Tag names.
    #[must_use]
    pub const fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    /// Owning performer.
    #[must_use]
    pub const fn performer_id(&self) -> ProfileId {
        self.performer_id
    }

    /// Apply a partial update.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] for a blank name or an empty tag list.
    pub fn apply(&self, update: ActUpdate, now: DateTime<Utc>) -> Result<Self, ValidationError> {
        let mut next = self.clone();
        if let Some(name) = update.name {
            next.name = required_text("name", &name)?;
        }
        if let Some(tags) = update.tags {
            next.tags = normalize_tag_names(&tags)?;
        }
        if let Some(description) = update.description {
            next.description = description;
        }
        if let Some(media) = update.media {
            next.media = media;
        }
        if let Some(form) = update.application_form {
            next.application_form = form;
        }
        next.updated_at = now;
        Ok(next)
    }
}
