//! Event, application, act and tag lifecycle.
//!
//! [`AgendaService`] enforces the invariants that need storage before it
//! writes anything:
//!
//! - referenced producers, performers and venues exist and have the right kind
//! - every tag named by an event or act is registered (tags are never
//!   created as a side effect)
//! - status changes are idempotence-guarded and written with an optimistic
//!   version check, so two identical concurrent transitions yield exactly
//!   one success
//!
//! The service is also the read path the authorization directory uses to
//! walk from events and applications back to their owning profiles.

mod acts;
mod applications;
mod events;
mod tags;

use chrono::{DateTime, Utc};
use ocall_core::environment::Clock;
use ocall_core::store::{AgendaStore, ProfileStore};
use ocall_core::{Deadline, DomainError, EntityKind, Profile, ProfileId, ProfileKind, Result};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Lifecycle service for events, applications, acts and tags.
#[derive(Clone)]
pub struct AgendaService<A, P> {
    agenda: A,
    profiles: P,
    clock: Arc<dyn Clock>,
}

impl<A: AgendaStore, P: ProfileStore> AgendaService<A, P> {
    /// Create a service over the two stores.
    pub fn new(agenda: A, profiles: P, clock: Arc<dyn Clock>) -> Self {
        Self {
            agenda,
            profiles,
            clock,
        }
    }

    /// The agenda store.
    pub const fn agenda(&self) -> &A {
        &self.agenda
    }

    /// The profile store.
    pub const fn profiles(&self) -> &P {
        &self.profiles
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Delete a profile and its links once nothing in the agenda refers to it.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if absent and a validation error on `id` while
    /// events, applications or acts still refer to the profile.
    #[tracing::instrument(skip(self))]
    pub async fn delete_profile(&self, id: ProfileId, deadline: Deadline) -> Result<()> {
        deadline.run(self.profiles.get_profile(id)).await?;

        let produced = deadline.run(self.agenda.events_by_producer(id)).await?.len();
        let hosted = deadline.run(self.agenda.events_by_venue(id)).await?.len();
        let applications = deadline.run(self.agenda.applications_by_performer(id)).await?.len();
        let acts = deadline.run(self.agenda.acts_by_performer(id)).await?.len();

        let dependents: Vec<String> = [
            (produced, "produced events"),
            (hosted, "hosted events"),
            (applications, "applications"),
            (acts, "acts"),
        ]
        .into_iter()
        .filter(|(count, _)| *count > 0)
        .map(|(count, what)| format!("{count} {what}"))
        .collect();
        if !dependents.is_empty() {
            tracing::debug!(profile_id = %id, dependents = ?dependents, "Refusing to delete a referenced profile");
            return Err(DomainError::validation(
                "id",
                format!("profile {id} is still referenced by {}", dependents.join(", ")),
            ));
        }

        deadline.run(self.profiles.delete_profile(id)).await?;
        tracing::info!(profile_id = %id, "Profile deleted");
        Ok(())
    }

    /// Load a profile referenced by `field` and check its kind.
    ///
    /// An absent profile is the caller's fault here, so it is reported as a
    /// validation error on `field` rather than `NotFound`.
    async fn referenced_profile(
        &self,
        id: ProfileId,
        kind: ProfileKind,
        field: &str,
        deadline: Deadline,
    ) -> Result<Profile> {
        match deadline.run(self.profiles.get_profile(id)).await {
            Ok(profile) => {
                profile.require_kind(kind, field)?;
                Ok(profile)
            }
            Err(DomainError::NotFound { .. }) => Err(DomainError::validation(
                field,
                format!("{kind} profile {id} does not exist"),
            )),
            Err(e) => Err(e),
        }
    }

    /// Fail unless every name in `names` is a registered tag.
    async fn require_registered_tags(&self, names: &BTreeSet<String>, deadline: Deadline) -> Result<()> {
        let found = deadline.run(self.agenda.tags_by_name(names)).await?;
        let known: BTreeSet<&str> = found.iter().map(|tag| tag.name.as_str()).collect();
        let missing: Vec<&str> = names
            .iter()
            .map(String::as_str)
            .filter(|name| !known.contains(name))
            .collect();
        if missing.is_empty() {
            return Ok(());
        }
        tracing::debug!(missing = ?missing, "Rejecting unregistered tags");
        Err(DomainError::validation(
            "tags",
            format!("unregistered tags: {}", missing.join(", ")),
        ))
    }
}

/// A no-op error for `field` already holding `value`.
fn no_op(entity: EntityKind, id: impl std::fmt::Display, field: &'static str, value: impl std::fmt::Display) -> DomainError {
    DomainError::NoOp {
        entity,
        id: id.to_string(),
        field,
        value: value.to_string(),
    }
}
