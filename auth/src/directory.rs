//! Profile Directory: who controls which profile, and who owns what.
//!
//! The directory is the read side authorization decisions are built on. It
//! answers two families of questions:
//!
//! - control: which identities are linked to a profile, and the inverse
//! - ownership: which profile produced an event or applied with an
//!   application
//!
//! Ownership lookups go through the booking read path, so an application's
//! producer is found in two hops: application to event, event to producer.

use ocall_booking::AgendaService;
use ocall_core::store::{AgendaStore, ProfileStore};
use ocall_core::{ApplicationId, Deadline, EventId, Identity, Permission, ProfileId, Result};
use std::collections::BTreeSet;

/// Read-only view over profile links and resource ownership.
#[derive(Clone)]
pub struct ProfileDirectory<A, P> {
    agenda: AgendaService<A, P>,
}

impl<A: AgendaStore, P: ProfileStore> ProfileDirectory<A, P> {
    /// Create a directory over the booking read path.
    pub const fn new(agenda: AgendaService<A, P>) -> Self {
        Self { agenda }
    }

    /// Profiles `identity` is linked to. Empty when there are none.
    ///
    /// # Errors
    ///
    /// Returns `DeadlineExceeded` or a storage error.
    pub async fn profiles_controlled_by(
        &self,
        identity: &Identity,
        deadline: Deadline,
    ) -> Result<BTreeSet<ProfileId>> {
        let profiles = deadline
            .run(self.agenda.profiles().profiles_for_identity(identity))
            .await?;
        Ok(profiles.into_iter().map(|p| p.id).collect())
    }

    /// Identities linked to `profile_id`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the profile is absent.
    pub async fn controlling_identities(
        &self,
        profile_id: ProfileId,
        deadline: Deadline,
    ) -> Result<BTreeSet<Identity>> {
        let links = deadline
            .run(self.agenda.profiles().links_for_profile(profile_id))
            .await?;
        Ok(links.into_iter().map(|link| link.identity).collect())
    }

    /// Whether `identity` is linked to `profile_id`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the profile is absent.
    pub async fn controls(
        &self,
        identity: &Identity,
        profile_id: ProfileId,
        deadline: Deadline,
    ) -> Result<bool> {
        Ok(self
            .controlling_identities(profile_id, deadline)
            .await?
            .contains(identity))
    }

    /// The permission `identity` holds on `profile_id`; `Unknown` when unlinked.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the profile is absent.
    pub async fn permission_level(
        &self,
        identity: &Identity,
        profile_id: ProfileId,
        deadline: Deadline,
    ) -> Result<Permission> {
        let links = deadline
            .run(self.agenda.profiles().links_for_profile(profile_id))
            .await?;
        Ok(links
            .into_iter()
            .find(|link| &link.identity == identity)
            .map(|link| link.permission)
            .unwrap_or_default())
    }

    /// The producer that owns `event_id`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the event is absent.
    pub async fn producer_of_event(&self, event_id: EventId, deadline: Deadline) -> Result<ProfileId> {
        let event = self.agenda.get_event(event_id, deadline).await?;
        Ok(event.producer_id())
    }

    /// The performer that submitted `application_id`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the application is absent.
    pub async fn performer_of_application(
        &self,
        application_id: ApplicationId,
        deadline: Deadline,
    ) -> Result<ProfileId> {
        let application = self.agenda.get_application(application_id, deadline).await?;
        Ok(application.performer_id())
    }

    /// The producer of the event `application_id` applies to.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the application or its event is absent.
    pub async fn producer_of_application(
        &self,
        application_id: ApplicationId,
        deadline: Deadline,
    ) -> Result<ProfileId> {
        let application = self.agenda.get_application(application_id, deadline).await?;
        self.producer_of_event(application.event_id(), deadline).await
    }
}
