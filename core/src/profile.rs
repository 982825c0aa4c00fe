//! Profiles and the identity links that control them.
//!
//! Performer, producer and venue profiles share one entity with a [`ProfileKind`]
//! discriminant. Kind-specific data lives in optional fields and is reached
//! through the narrowing accessors [`Profile::as_performer`],
//! [`Profile::as_producer`] and [`Profile::as_venue`].

use crate::error::ValidationError;
use crate::geo::GeoPoint;
use crate::ids::{ActId, Identity, ProfileId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The persona a profile represents. Immutable after creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileKind {
    /// Submits applications and owns acts.
    Performer,
    /// Publishes events and curates acts.
    Producer,
    /// Hosts events; referenced, never owning.
    Venue,
}

impl fmt::Display for ProfileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Performer => "performer",
            Self::Producer => "producer",
            Self::Venue => "venue",
        })
    }
}

impl FromStr for ProfileKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "performer" => Ok(Self::Performer),
            "producer" => Ok(Self::Producer),
            "venue" => Ok(Self::Venue),
            other => Err(ValidationError::new(
                "kind",
                format!("invalid profile kind {other}. Allowed: performer, producer, venue"),
            )),
        }
    }
}

/// Access level an identity holds on a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    /// Full control, including sharing.
    Admin,
    /// Limited control.
    Restricted,
    /// Unrecognised level.
    #[default]
    Unknown,
}

impl Permission {
    /// Parse leniently: anything unrecognised becomes [`Permission::Unknown`].
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Self::Admin,
            "restricted" => Self::Restricted,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Admin => "admin",
            Self::Restricted => "restricted",
            Self::Unknown => "unknown",
        })
    }
}

/// Many-to-many bridge between an external identity and a profile.
///
/// The `(identity, profile_id)` pair is unique.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserLink {
    /// The controlling identity.
    pub identity: Identity,
    /// The controlled profile.
    pub profile_id: ProfileId,
    /// Access level.
    pub permission: Permission,
}

impl UserLink {
    /// Create a link.
    #[must_use]
    pub const fn new(identity: Identity, profile_id: ProfileId, permission: Permission) -> Self {
        Self {
            identity,
            profile_id,
            permission,
        }
    }

    /// An admin link, as granted to the creator of a profile.
    #[must_use]
    pub const fn admin(identity: Identity, profile_id: ProfileId) -> Self {
        Self::new(identity, profile_id, Permission::Admin)
    }
}

/// Input for creating a profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProfile {
    /// Profile kind.
    pub kind: ProfileKind,
    /// Display name.
    pub name: String,
    /// Optional location (venues typically have one).
    pub location: Option<GeoPoint>,
}

/// Partial update of a profile. The kind cannot be changed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    /// New display name.
    pub name: Option<String>,
    /// New location; `Some(None)` clears it.
    pub location: Option<Option<GeoPoint>>,
    /// Must equal the current kind if supplied.
    pub kind: Option<ProfileKind>,
}

/// A performer, producer or venue persona.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// Profile ID.
    pub id: ProfileId,
    kind: ProfileKind,
    name: String,
    /// Optional geographic point.
    pub location: Option<GeoPoint>,
    /// Identities controlling this profile.
    pub user_links: Vec<UserLink>,
    /// Acts a producer has saved. Always empty for other kinds.
    saved_acts: Vec<ActId>,
    /// Optimistic concurrency version, bumped by the store on every update.
    pub version: u64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    /// Build a profile from validated input.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] if the name is blank.
    pub fn new(id: ProfileId, input: NewProfile, now: DateTime<Utc>) -> Result<Self, ValidationError> {
        let name = validate_name(&input.name)?;
        Ok(Self {
            id,
            kind: input.kind,
            name,
            location: input.location,
            user_links: Vec::new(),
            saved_acts: Vec::new(),
            version: 0,
            created_at: now,
            updated_at: now,
        })
    }

    /// The profile kind.
    #[must_use]
    pub const fn kind(&self) -> ProfileKind {
        self.kind
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The link `identity` holds on this profile, if any.
    #[must_use]
    pub fn link_for(&self, identity: &Identity) -> Option<&UserLink> {
        self.user_links.iter().find(|link| &link.identity == identity)
    }

    /// Whether `identity` controls this profile.
    #[must_use]
    pub fn is_controlled_by(&self, identity: &Identity) -> bool {
        self.link_for(identity).is_some()
    }

    /// Fail unless this profile is of `expected` kind.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] on `field` naming both kinds.
    pub fn require_kind(&self, expected: ProfileKind, field: &str) -> Result<(), ValidationError> {
        if self.kind == expected {
            Ok(())
        } else {
            Err(ValidationError::new(
                field,
                format!("profile {} is a {}, expected a {expected}", self.id, self.kind),
            ))
        }
    }

    /// Apply a partial update, returning the updated profile.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] if the kind would change or the new name is blank.
    pub fn apply(&self, update: ProfileUpdate, now: DateTime<Utc>) -> Result<Self, ValidationError> {
        if let Some(kind) = update.kind {
            if kind != self.kind {
                return Err(ValidationError::new(
                    "kind",
                    format!("profile kind is immutable (is {}, got {kind})", self.kind),
                ));
            }
        }
        let mut next = self.clone();
        if let Some(name) = update.name {
            next.name = validate_name(&name)?;
        }
        if let Some(location) = update.location {
            next.location = location;
        }
        next.updated_at = now;
        Ok(next)
    }

    /// Narrow to a performer view.
    #[must_use]
    pub fn as_performer(&self) -> Option<Performer<'_>> {
        (self.kind == ProfileKind::Performer).then_some(Performer(self))
    }

    /// Narrow to a producer view.
    #[must_use]
    pub fn as_producer(&self) -> Option<Producer<'_>> {
        (self.kind == ProfileKind::Producer).then_some(Producer(self))
    }

    /// Narrow to a venue view.
    #[must_use]
    pub fn as_venue(&self) -> Option<Venue<'_>> {
        (self.kind == ProfileKind::Venue).then_some(Venue(self))
    }

    /// Add `act` to a producer's saved list. Returns `false` if already saved.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] if this is not a producer profile.
    pub fn save_act(&mut self, act: ActId) -> Result<bool, ValidationError> {
        self.require_kind(ProfileKind::Producer, "producer_id")?;
        if self.saved_acts.contains(&act) {
            return Ok(false);
        }
        self.saved_acts.push(act);
        Ok(true)
    }

    /// Remove `act` from a producer's saved list. Returns `false` if it was not saved.
    pub fn unsave_act(&mut self, act: ActId) -> bool {
        let before = self.saved_acts.len();
        self.saved_acts.retain(|saved| *saved != act);
        before != self.saved_acts.len()
    }
}

fn validate_name(name: &str) -> Result<String, ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::required("name"));
    }
    Ok(trimmed.to_string())
}

/// Borrowed view of a performer profile.
#[derive(Debug, Clone, Copy)]
pub struct Performer<'a>(&'a Profile);

impl<'a> Performer<'a> {
    /// The underlying profile.
    #[must_use]
    pub const fn profile(&self) -> &'a Profile {
        self.0
    }

    /// Profile ID.
    #[must_use]
    pub const fn id(&self) -> ProfileId {
        self.0.id
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &'a str {
        &self.0.name
    }
}

/// Borrowed view of a producer profile.
#[derive(Debug, Clone, Copy)]
pub struct Producer<'a>(&'a Profile);

impl<'a> Producer<'a> {
    /// The underlying profile.
    #[must_use]
    pub const fn profile(&self) -> &'a Profile {
        self.0
    }

    /// Profile ID.
    #[must_use]
    pub const fn id(&self) -> ProfileId {
        self.0.id
    }

    /// Acts this producer has saved.
    #[must_use]
    pub fn saved_acts(&self) -> &'a [ActId] {
        &self.0.saved_acts
    }
}

/// Borrowed view of a venue profile.
#[derive(Debug, Clone, Copy)]
pub struct Venue<'a>(&'a Profile);

impl<'a> Venue<'a> {
    /// The underlying profile.
    #[must_use]
    pub const fn profile(&self) -> &'a Profile {
        self.0
    }

    /// Profile ID.
    #[must_use]
    pub const fn id(&self) -> ProfileId {
        self.0.id
    }

    /// Where the venue is, if known.
    #[must_use]
    pub const fn location(&self) -> Option<GeoPoint> {
        self.0.location
    }
}
