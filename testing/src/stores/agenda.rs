use super::{Faults, poisoned};
use ocall_core::store::AgendaStore;
use ocall_core::{
    Act, ActId, Application, ApplicationId, DomainError, EntityKind, Event, EventId, ProfileId,
    Result, Tag, TagId,
};
use std::collections::{BTreeMap, BTreeSet};
use std::ops::Bound;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Default)]
struct AgendaState {
    tags: BTreeMap<String, Tag>,
    events: BTreeMap<EventId, Event>,
    applications: BTreeMap<ApplicationId, Application>,
    acts: BTreeMap<ActId, Act>,
}

/// In-memory [`AgendaStore`].
///
/// Versioned writes check and bump the version under the same lock, which
/// gives them the compare-and-swap semantics a relational backend gets from
/// `UPDATE .. WHERE version = $expected`.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAgendaStore {
    state: Arc<Mutex<AgendaState>>,
    faults: Faults,
}

impl InMemoryAgendaStore {
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

    /// Number of stored events.
    #[must_use]
    pub fn event_count(&self) -> usize {
        self.state.lock().map_or(0, |s| s.events.len())
    }

    /// Number of stored applications.
    #[must_use]
    pub fn application_count(&self) -> usize {
        self.state.lock().map_or(0, |s| s.applications.len())
    }

    /// Number of stored acts.
    #[must_use]
    pub fn act_count(&self) -> usize {
        self.state.lock().map_or(0, |s| s.acts.len())
    }

    fn state(&self) -> Result<MutexGuard<'_, AgendaState>> {
        self.state.lock().map_err(poisoned)
    }
}

fn duplicate(entity: EntityKind, id: impl std::fmt::Display) -> DomainError {
    DomainError::validation("id", format!("{entity} {id} already exists"))
}

impl AgendaStore for InMemoryAgendaStore {
    async fn insert_tag(&self, tag: &Tag) -> Result<()> {
        self.faults.enter().await?;
        let mut state = self.state()?;
        if state.tags.contains_key(&tag.name) {
            return Err(DomainError::validation(
                "name",
                format!("tag {} already exists", tag.name),
            ));
        }
        state.tags.insert(tag.name.clone(), tag.clone());
        Ok(())
    }

    async fn tags_by_name(&self, names: &BTreeSet<String>) -> Result<Vec<Tag>> {
        self.faults.enter().await?;
        let state = self.state()?;
        Ok(names
            .iter()
            .filter_map(|name| state.tags.get(name))
            .cloned()
            .collect())
    }

    async fn list_tags(&self) -> Result<Vec<Tag>> {
        self.faults.enter().await?;
        let state = self.state()?;
        Ok(state.tags.values().cloned().collect())
    }

    async fn delete_tag(&self, id: TagId) -> Result<()> {
        self.faults.enter().await?;
        let mut state = self.state()?;
        let before = state.tags.len();
        state.tags.retain(|_, tag| tag.id != id);
        if state.tags.len() == before {
            return Err(DomainError::not_found(EntityKind::Tag, id));
        }
        Ok(())
    }

    async fn insert_event(&self, event: &Event) -> Result<()> {
        self.faults.enter().await?;
        let mut state = self.state()?;
        if state.events.contains_key(&event.id) {
            return Err(duplicate(EntityKind::Event, event.id));
        }
        state.events.insert(event.id, event.clone());
        Ok(())
    }

    async fn get_event(&self, id: EventId) -> Result<Event> {
        self.faults.enter().await?;
        let state = self.state()?;
        state
            .events
            .get(&id)
            .cloned()
            .ok_or_else(|| DomainError::not_found(EntityKind::Event, id))
    }

    async fn update_event(&self, event: &Event, expected_version: u64) -> Result<Event> {
        self.faults.enter().await?;
        let mut state = self.state()?;
        let stored = state
            .events
            .get_mut(&event.id)
            .ok_or_else(|| DomainError::not_found(EntityKind::Event, event.id))?;
        if stored.version != expected_version {
            return Err(DomainError::Conflict {
                entity: EntityKind::Event,
                id: event.id.to_string(),
                expected: expected_version,
                actual: stored.version,
            });
        }
        let mut next = event.clone();
        next.version = expected_version + 1;
        *stored = next.clone();
        Ok(next)
    }

    async fn delete_event(&self, id: EventId) -> Result<()> {
        self.faults.enter().await?;
        let mut state = self.state()?;
        state
            .events
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| DomainError::not_found(EntityKind::Event, id))
    }

    async fn events_by_producer(&self, producer_id: ProfileId) -> Result<Vec<Event>> {
        self.faults.enter().await?;
        let state = self.state()?;
        Ok(state
            .events
            .values()
            .filter(|event| event.producer_id() == producer_id)
            .cloned()
            .collect())
    }

    async fn events_by_venue(&self, venue_id: ProfileId) -> Result<Vec<Event>> {
        self.faults.enter().await?;
        let state = self.state()?;
        Ok(state
            .events
            .values()
            .filter(|event| event.venue_id() == Some(venue_id))
            .cloned()
            .collect())
    }

    async fn events_page(&self, after: Option<EventId>, limit: usize) -> Result<Vec<Event>> {
        self.faults.enter().await?;
        let state = self.state()?;
        let lower = after.map_or(Bound::Unbounded, Bound::Excluded);
        Ok(state
            .events
            .range((lower, Bound::Unbounded))
            .take(limit)
            .map(|(_, event)| event.clone())
            .collect())
    }

    async fn insert_application(&self, application: &Application) -> Result<()> {
        self.faults.enter().await?;
        let mut state = self.state()?;
        if state.applications.contains_key(&application.id) {
            return Err(duplicate(EntityKind::Application, application.id));
        }
        state.applications.insert(application.id, application.clone());
        Ok(())
    }

    async fn get_application(&self, id: ApplicationId) -> Result<Application> {
        self.faults.enter().await?;
        let state = self.state()?;
        state
            .applications
            .get(&id)
            .cloned()
            .ok_or_else(|| DomainError::not_found(EntityKind::Application, id))
    }

    async fn update_application(
        &self,
        application: &Application,
        expected_version: u64,
    ) -> Result<Application> {
        self.faults.enter().await?;
        let mut state = self.state()?;
        let stored = state
            .applications
            .get_mut(&application.id)
            .ok_or_else(|| DomainError::not_found(EntityKind::Application, application.id))?;
        if stored.version != expected_version {
            return Err(DomainError::Conflict {
                entity: EntityKind::Application,
                id: application.id.to_string(),
                expected: expected_version,
                actual: stored.version,
            });
        }
        let mut next = application.clone();
        next.version = expected_version + 1;
        *stored = next.clone();
        Ok(next)
    }

    async fn delete_application(&self, id: ApplicationId) -> Result<()> {
        self.faults.enter().await?;
        let mut state = self.state()?;
        state
            .applications
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| DomainError::not_found(EntityKind::Application, id))
    }

    async fn applications_by_event(&self, event_id: EventId) -> Result<Vec<Application>> {
        self.faults.enter().await?;
        let state = self.state()?;
        Ok(state
            .applications
            .values()
            .filter(|app| app.event_id() == event_id)
            .cloned()
            .collect())
    }

    async fn applications_by_performer(&self, performer_id: ProfileId) -> Result<Vec<Application>> {
        self.faults.enter().await?;
        let state = self.state()?;
        Ok(state
            .applications
            .values()
            .filter(|app| app.performer_id() == performer_id)
            .cloned()
            .collect())
    }

    async fn insert_act(&self, act: &Act) -> Result<()> {
        self.faults.enter().await?;
        let mut state = self.state()?;
        if state.acts.contains_key(&act.id) {
            return Err(duplicate(EntityKind::Act, act.id));
        }
        state.acts.insert(act.id, act.clone());
        Ok(())
    }

    async fn get_act(&self, id: ActId) -> Result<Act> {
        self.faults.enter().await?;
        let state = self.state()?;
        state
            .acts
            .get(&id)
            .cloned()
            .ok_or_else(|| DomainError::not_found(EntityKind::Act, id))
    }

    async fn update_act(&self, act: &Act, expected_version: u64) -> Result<Act> {
        self.faults.enter().await?;
        let mut state = self.state()?;
        let stored = state
            .acts
            .get_mut(&act.id)
            .ok_or_else(|| DomainError::not_found(EntityKind::Act, act.id))?;
        if stored.version != expected_version {
            return Err(DomainError::Conflict {
                entity: EntityKind::Act,
                id: act.id.to_string(),
                expected: expected_version,
                actual: stored.version,
            });
        }
        let mut next = act.clone();
        next.version = expected_version + 1;
        *stored = next.clone();
        Ok(next)
    }

    async fn delete_act(&self, id: ActId) -> Result<()> {
        self.faults.enter().await?;
        let mut state = self.state()?;
        state
            .acts
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| DomainError::not_found(EntityKind::Act, id))
    }

    async fn acts_by_performer(&self, performer_id: ProfileId) -> Result<Vec<Act>> {
        self.faults.enter().await?;
        let state = self.state()?;
        Ok(state
            .acts
            .values()
            .filter(|act| act.performer_id() == performer_id)
            .cloned()
            .collect())
    }

    async fn acts_by_event(&self, event_id: EventId) -> Result<Vec<Act>> {
        self.faults.enter().await?;
        let state = self.state()?;
        Ok(state
            .acts
            .values()
            .filter(|act| act.event_id == Some(event_id))
            .cloned()
            .collect())
    }
}
