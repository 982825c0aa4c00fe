use super::{Faults, poisoned};
use ocall_core::store::ProfileStore;
use ocall_core::{DomainError, EntityKind, Identity, Profile, ProfileId, Result, UserLink};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Default)]
struct ProfileState {
    profiles: HashMap<ProfileId, Profile>,
    links: BTreeMap<(Identity, ProfileId), UserLink>,
}

impl ProfileState {
    fn hydrate(&self, profile: &Profile) -> Profile {
        let mut profile = profile.clone();
        profile.user_links = self
            .links
            .values()
            .filter(|link| link.profile_id == profile.id)
            .cloned()
            .collect();
        profile
    }
}

/// In-memory [`ProfileStore`].
///
/// Profiles and links are kept apart the way a relational backend keeps
/// them in separate tables; `get_profile` joins them.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProfileStore {
    state: Arc<Mutex<ProfileState>>,
    faults: Faults,
}

impl InMemoryProfileStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fault injection handle.
    #[must_use]
    pub const fn faults(&self) -> &Faults {
        &self.faults
    }

    /// Number of stored profiles.
    #[must_use]
    pub fn profile_count(&self) -> usize {
        self.state.lock().map_or(0, |s| s.profiles.len())
    }

    /// Number of stored links.
    #[must_use]
    pub fn link_count(&self) -> usize {
        self.state.lock().map_or(0, |s| s.links.len())
    }

    fn state(&self) -> Result<MutexGuard<'_, ProfileState>> {
        self.state.lock().map_err(poisoned)
    }
}

impl ProfileStore for InMemoryProfileStore {
    async fn insert_profile(&self, profile: &Profile) -> Result<()> {
        self.faults.enter().await?;
        let mut state = self.state()?;
        if state.profiles.contains_key(&profile.id) {
            return Err(DomainError::validation("id", format!("profile {} already exists", profile.id)));
        }
        let mut stored = profile.clone();
        stored.user_links.clear();
        state.profiles.insert(profile.id, stored);
        Ok(())
    }

    async fn get_profile(&self, id: ProfileId) -> Result<Profile> {
        self.faults.enter().await?;
        let state = self.state()?;
        let profile = state
            .profiles
            .get(&id)
            .ok_or_else(|| DomainError::not_found(EntityKind::Profile, id))?;
        Ok(state.hydrate(profile))
    }

    async fn update_profile(&self, profile: &Profile, expected_version: u64) -> Result<Profile> {
        self.faults.enter().await?;
        let mut state = self.state()?;
        let slot = state
            .profiles
            .get_mut(&profile.id)
            .ok_or_else(|| DomainError::not_found(EntityKind::Profile, profile.id))?;
        if slot.version != expected_version {
            return Err(DomainError::Conflict {
                entity: EntityKind::Profile,
                id: profile.id.to_string(),
                expected: expected_version,
                actual: slot.version,
            });
        }
        let mut stored = profile.clone();
        stored.user_links.clear();
        stored.version = expected_version + 1;
        *slot = stored.clone();
        Ok(state.hydrate(&stored))
    }

    async fn delete_profile(&self, id: ProfileId) -> Result<()> {
        self.faults.enter().await?;
        let mut state = self.state()?;
        if state.profiles.remove(&id).is_none() {
            return Err(DomainError::not_found(EntityKind::Profile, id));
        }
        state.links.retain(|(_, profile_id), _| *profile_id != id);
        Ok(())
    }

    async fn insert_link(&self, link: &UserLink) -> Result<()> {
        self.faults.enter().await?;
        let mut state = self.state()?;
        if !state.profiles.contains_key(&link.profile_id) {
            return Err(DomainError::not_found(EntityKind::Profile, link.profile_id));
        }
        let key = (link.identity.clone(), link.profile_id);
        if state.links.contains_key(&key) {
            return Err(DomainError::validation(
                "identity",
                format!("{} is already linked to profile {}", link.identity, link.profile_id),
            ));
        }
        state.links.insert(key, link.clone());
        Ok(())
    }

    async fn delete_link(&self, identity: &Identity, profile_id: ProfileId) -> Result<()> {
        self.faults.enter().await?;
        let mut state = self.state()?;
        state
            .links
            .remove(&(identity.clone(), profile_id))
            .map(|_| ())
            .ok_or_else(|| DomainError::not_found(EntityKind::UserLink, format!("{identity}/{profile_id}")))
    }

    async fn links_for_profile(&self, profile_id: ProfileId) -> Result<Vec<UserLink>> {
        self.faults.enter().await?;
        let state = self.state()?;
        if !state.profiles.contains_key(&profile_id) {
            return Err(DomainError::not_found(EntityKind::Profile, profile_id));
        }
        Ok(state
            .links
            .values()
            .filter(|link| link.profile_id == profile_id)
            .cloned()
            .collect())
    }

    async fn profiles_for_identity(&self, identity: &Identity) -> Result<Vec<Profile>> {
        self.faults.enter().await?;
        let state = self.state()?;
        Ok(state
            .links
            .keys()
            .filter(|(linked, _)| linked == identity)
            .filter_map(|(_, profile_id)| state.profiles.get(profile_id))
            .map(|profile| state.hydrate(profile))
            .collect())
    }

    async fn list_profiles(&self) -> Result<Vec<Profile>> {
        self.faults.enter().await?;
        let state = self.state()?;
        let mut profiles: Vec<Profile> = state.profiles.values().map(|p| state.hydrate(p)).collect();
        profiles.sort_by_key(|p| p.id);
        Ok(profiles)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::fixtures;
    use ocall_core::{Permission, ProfileKind};

    #[tokio::test]
    async fn links_are_joined_on_read_and_removed_with_the_profile() {
        let store = InMemoryProfileStore::new();
        let profile = fixtures::profile(ProfileKind::Performer, "Trio");
        store.insert_profile(&profile).await.unwrap();

        let owner = Identity::new("uid-1");
        store.insert_link(&UserLink::admin(owner.clone(), profile.id)).await.unwrap();

        let read = store.get_profile(profile.id).await.unwrap();
        assert_eq!(read.user_links.len(), 1);
        assert_eq!(read.user_links[0].permission, Permission::Admin);

        store.delete_profile(profile.id).await.unwrap();
        assert_eq!(store.link_count(), 0);
        assert!(store.profiles_for_identity(&owner).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn stale_profile_write_is_rejected_and_links_survive() {
        let store = InMemoryProfileStore::new();
        let profile = fixtures::profile(ProfileKind::Producer, "Booker");
        store.insert_profile(&profile).await.unwrap();
        store
            .insert_link(&UserLink::admin(Identity::new("uid-1"), profile.id))
            .await
            .unwrap();

        let read = store.get_profile(profile.id).await.unwrap();
        let written = store.update_profile(&read, read.version).await.unwrap();
        assert_eq!(written.version, 1);
        assert_eq!(written.user_links.len(), 1);

        let err = store.update_profile(&read, read.version).await.unwrap_err();
        assert!(matches!(
            err,
            DomainError::Conflict { entity: EntityKind::Profile, expected: 0, actual: 1, .. }
        ));
        assert_eq!(store.get_profile(profile.id).await.unwrap().version, 1);
    }

    #[tokio::test]
    async fn duplicate_link_is_rejected() {
        let store = InMemoryProfileStore::new();
        let profile = fixtures::profile(ProfileKind::Venue, "Hall");
        store.insert_profile(&profile).await.unwrap();
        let link = UserLink::admin(Identity::new("uid-1"), profile.id);
        store.insert_link(&link).await.unwrap();

        let err = store.insert_link(&link).await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn deleting_a_missing_link_is_not_found() {
        let store = InMemoryProfileStore::new();
        let err = store
            .delete_link(&Identity::new("nobody"), ProfileId::new())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn outage_surfaces_as_storage_error() {
        let store = InMemoryProfileStore::new();
        store.faults().set_unavailable(true);
        let err = store.get_profile(ProfileId::new()).await.unwrap_err();
        assert!(matches!(err, DomainError::Storage(_)));
    }
}
