//! Profile lifecycle and the identity links that grant control.

use chrono::{DateTime, Utc};
use ocall_core::environment::Clock;
use ocall_core::store::ProfileStore;
use ocall_core::{
    Deadline, Identity, NewProfile, Permission, Profile, ProfileId, ProfileUpdate, Result,
    UserLink,
};
use std::sync::Arc;

/// Creates, updates and shares profiles.
///
/// Deletion lives on [`crate::AgendaService::delete_profile`], which can see
/// what in the agenda still refers to a profile.
#[derive(Clone)]
pub struct ProfileService<P> {
    store: P,
    clock: Arc<dyn Clock>,
}

impl<P: ProfileStore> ProfileService<P> {
    /// Create a service over `store`.
    pub fn new(store: P, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// The underlying store.
    pub const fn store(&self) -> &P {
        &self.store
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Create a profile. The creator, if any, receives an admin link.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a blank name, or any store error. If
    /// linking the creator fails the profile is removed again.
    #[tracing::instrument(skip(self, input), fields(kind = %input.kind))]
    pub async fn create_profile(
        &self,
        creator: Option<&Identity>,
        input: NewProfile,
        deadline: Deadline,
    ) -> Result<Profile> {
        let profile = Profile::new(ProfileId::new(), input, self.now())?;
        deadline.run(self.store.insert_profile(&profile)).await?;

        if let Some(creator) = creator {
            let link = UserLink::admin(creator.clone(), profile.id);
            if let Err(e) = deadline.run(self.store.insert_link(&link)).await {
                tracing::warn!(profile_id = %profile.id, error = %e, "Linking creator failed, removing profile");
                if let Err(rollback) = deadline.run(self.store.delete_profile(profile.id)).await {
                    tracing::warn!(profile_id = %profile.id, error = %rollback, "Removing unlinked profile failed");
                }
                return Err(e);
            }
        }

        tracing::info!(profile_id = %profile.id, "Profile created");
        deadline.run(self.store.get_profile(profile.id)).await
    }

    /// Get a profile with its links.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if absent.
    pub async fn get_profile(&self, id: ProfileId, deadline: Deadline) -> Result<Profile> {
        deadline.run(self.store.get_profile(id)).await
    }

    /// Update name or location. The kind never changes.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if absent, a validation error if the update would
    /// change the kind or blank the name, and `Conflict` if the profile
    /// changed since it was read.
    #[tracing::instrument(skip(self, update))]
    pub async fn update_profile(
        &self,
        id: ProfileId,
        update: ProfileUpdate,
        deadline: Deadline,
    ) -> Result<Profile> {
        let current = deadline.run(self.store.get_profile(id)).await?;
        let next = current.apply(update, self.now())?;
        deadline.run(self.store.update_profile(&next, current.version)).await
    }

    /// Grant `identity` access to a profile.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the profile is absent, a validation error if the
    /// identity is already linked.
    #[tracing::instrument(skip(self))]
    pub async fn share_profile(
        &self,
        profile_id: ProfileId,
        identity: Identity,
        permission: Permission,
        deadline: Deadline,
    ) -> Result<UserLink> {
        let link = UserLink::new(identity, profile_id, permission);
        deadline.run(self.store.insert_link(&link)).await?;
        tracing::info!(profile_id = %profile_id, identity = %link.identity, permission = %permission, "Profile shared");
        Ok(link)
    }

    /// Remove `identity`'s access to a profile.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if there is no such link.
    #[tracing::instrument(skip(self))]
    pub async fn revoke_access(
        &self,
        profile_id: ProfileId,
        identity: &Identity,
        deadline: Deadline,
    ) -> Result<()> {
        deadline.run(self.store.delete_link(identity, profile_id)).await?;
        tracing::info!(profile_id = %profile_id, identity = %identity, "Profile access revoked");
        Ok(())
    }

    /// Profiles `identity` is linked to.
    ///
    /// # Errors
    ///
    /// Returns error if the store fails.
    pub async fn profiles_for_identity(
        &self,
        identity: &Identity,
        deadline: Deadline,
    ) -> Result<Vec<Profile>> {
        deadline.run(self.store.profiles_for_identity(identity)).await
    }

    /// Every profile.
    ///
    /// # Errors
    ///
    /// Returns error if the store fails.
    pub async fn list_profiles(&self, deadline: Deadline) -> Result<Vec<Profile>> {
        deadline.run(self.store.list_profiles()).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use ocall_core::{DomainError, ProfileKind};
    use ocall_testing::{InMemoryProfileStore, test_clock};
    use std::time::Duration;

    fn service() -> ProfileService<InMemoryProfileStore> {
        ProfileService::new(InMemoryProfileStore::new(), Arc::new(test_clock()))
    }

    fn input(kind: ProfileKind) -> NewProfile {
        NewProfile {
            kind,
            name: "Blue Room".into(),
            location: None,
        }
    }

    #[tokio::test]
    async fn creator_gets_an_admin_link() {
        let service = service();
        let owner = Identity::new("uid-owner");
        let profile = service
            .create_profile(Some(&owner), input(ProfileKind::Venue), Deadline::none())
            .await
            .unwrap();

        assert_eq!(profile.link_for(&owner).unwrap().permission, Permission::Admin);
        assert_eq!(profile.created_at, test_clock().now());
    }

    #[tokio::test]
    async fn link_failure_is_returned_even_when_removal_fails() {
        let store = InMemoryProfileStore::new();
        let service = ProfileService::new(store.clone(), Arc::new(test_clock()));
        store.faults().set_latency(Duration::from_millis(50));

        let err = service
            .create_profile(
                Some(&Identity::new("uid-owner")),
                input(ProfileKind::Venue),
                Deadline::after(Duration::from_millis(75)),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::DeadlineExceeded));
        assert_eq!(store.link_count(), 0);
        // The removal ran out of budget too, so the unlinked profile stays.
        assert_eq!(store.profile_count(), 1);
    }

    #[tokio::test]
    async fn stale_update_is_a_conflict() {
        let store = InMemoryProfileStore::new();
        let service = ProfileService::new(store.clone(), Arc::new(test_clock()));
        let profile = service
            .create_profile(None, input(ProfileKind::Producer), Deadline::none())
            .await
            .unwrap();

        let renamed = service
            .update_profile(
                profile.id,
                ProfileUpdate {
                    name: Some("Green Room".into()),
                    ..ProfileUpdate::default()
                },
                Deadline::none(),
            )
            .await
            .unwrap();
        assert_eq!(renamed.version, 1);

        let err = store.update_profile(&profile, profile.version).await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict { expected: 0, actual: 1, .. }));
        assert_eq!(store.get_profile(profile.id).await.unwrap().name(), "Green Room");
    }

    #[tokio::test]
    async fn share_then_revoke() {
        let service = service();
        let profile = service
            .create_profile(None, input(ProfileKind::Producer), Deadline::none())
            .await
            .unwrap();
        let guest = Identity::new("uid-guest");

        service
            .share_profile(profile.id, guest.clone(), Permission::Restricted, Deadline::none())
            .await
            .unwrap();
        assert_eq!(
            service.profiles_for_identity(&guest, Deadline::none()).await.unwrap().len(),
            1
        );

        service.revoke_access(profile.id, &guest, Deadline::none()).await.unwrap();
        assert!(service.profiles_for_identity(&guest, Deadline::none()).await.unwrap().is_empty());

        let again = service.revoke_access(profile.id, &guest, Deadline::none()).await;
        assert!(matches!(again, Err(DomainError::NotFound { .. })));
    }

    #[tokio::test]
    async fn update_keeps_kind_and_links() {
        let service = service();
        let owner = Identity::new("uid-owner");
        let profile = service
            .create_profile(Some(&owner), input(ProfileKind::Performer), Deadline::none())
            .await
            .unwrap();

        let err = service
            .update_profile(
                profile.id,
                ProfileUpdate {
                    kind: Some(ProfileKind::Venue),
                    ..ProfileUpdate::default()
                },
                Deadline::none(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(ref v) if v.field == "kind"));

        service
            .update_profile(
                profile.id,
                ProfileUpdate {
                    name: Some("Green Room".into()),
                    ..ProfileUpdate::default()
                },
                Deadline::none(),
            )
            .await
            .unwrap();
        let read = service.get_profile(profile.id, Deadline::none()).await.unwrap();
        assert_eq!(read.name(), "Green Room");
        assert!(read.is_controlled_by(&owner));
    }
}
