use super::{AgendaService, no_op};
use ocall_core::store::{AgendaStore, ProfileStore};
use ocall_core::{
    Act, ActId, Application, ApplicationId, ApplicationStatus, Deadline, DomainError, EntityKind,
    Event, EventId, EventStatus, EventUpdate, NewApplication, NewEvent, ProfileId, ProfileKind,
    Result,
};
use std::collections::BTreeSet;

impl<A: AgendaStore, P: ProfileStore> AgendaService<A, P> {
    /// Create an event.
    ///
    /// The producer must be an existing producer profile, the venue (if any)
    /// an existing venue profile, and every tag registered. Nothing is
    /// written unless all checks pass.
    ///
    /// # Errors
    ///
    /// Returns a validation error naming the offending field; for tags the
    /// reason lists every unregistered name.
    #[tracing::instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_event(&self, input: NewEvent, deadline: Deadline) -> Result<Event> {
        let event = Event::new(EventId::new(), input, self.now())?;

        self.referenced_profile(event.producer_id(), ProfileKind::Producer, "producer_id", deadline)
            .await?;
        if let Some(venue_id) = event.venue_id() {
            self.referenced_profile(venue_id, ProfileKind::Venue, "venue_id", deadline)
                .await?;
        }
        self.require_registered_tags(event.tags(), deadline).await?;

        deadline.run(self.agenda.insert_event(&event)).await?;
        tracing::info!(event_id = %event.id, producer_id = %event.producer_id(), "Event created");
        Ok(event)
    }

    /// Get an event.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if absent.
    pub async fn get_event(&self, id: EventId, deadline: Deadline) -> Result<Event> {
        deadline.run(self.agenda.get_event(id)).await
    }

    /// Update an event's details. The producer never changes.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if absent, a validation error for a changed
    /// producer, an unknown venue or unregistered tags, and `Conflict` if the
    /// event changed since it was read.
    #[tracing::instrument(skip(self, update))]
    pub async fn update_event(&self, id: EventId, update: EventUpdate, deadline: Deadline) -> Result<Event> {
        let current = deadline.run(self.agenda.get_event(id)).await?;
        let next = current.apply(update, self.now())?;

        if next.venue_id() != current.venue_id() {
            if let Some(venue_id) = next.venue_id() {
                self.referenced_profile(venue_id, ProfileKind::Venue, "venue_id", deadline)
                    .await?;
            }
        }
        if next.tags() != current.tags() {
            self.require_registered_tags(next.tags(), deadline).await?;
        }

        deadline.run(self.agenda.update_event(&next, current.version)).await
    }

    /// Delete an event with its applications, releasing confirmed acts.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if absent and `Conflict` if a confirmed act changed
    /// while it was being released.
    #[tracing::instrument(skip(self))]
    pub async fn delete_event(&self, id: EventId, deadline: Deadline) -> Result<()> {
        deadline.run(self.agenda.get_event(id)).await?;

        for application in deadline.run(self.agenda.applications_by_event(id)).await? {
            deadline.run(self.agenda.delete_application(application.id)).await?;
        }
        for mut act in deadline.run(self.agenda.acts_by_event(id)).await? {
            act.event_id = None;
            act.updated_at = self.now();
            deadline.run(self.agenda.update_act(&act, act.version)).await?;
        }

        deadline.run(self.agenda.delete_event(id)).await?;
        tracing::info!(event_id = %id, "Event deleted");
        Ok(())
    }

    /// Move an event to `status`.
    ///
    /// # Errors
    ///
    /// Returns `NoOp` if the event already has `status`, `NotFound` if absent
    /// and `Conflict` if a different concurrent change won.
    #[tracing::instrument(skip(self))]
    pub async fn update_event_status(
        &self,
        id: EventId,
        status: EventStatus,
        deadline: Deadline,
    ) -> Result<Event> {
        let current = deadline.run(self.agenda.get_event(id)).await?;
        if current.status == status {
            return Err(no_op(EntityKind::Event, id, "status", status));
        }

        let mut next = current.clone();
        next.status = status;
        next.updated_at = self.now();

        match deadline.run(self.agenda.update_event(&next, current.version)).await {
            Ok(stored) => {
                tracing::info!(event_id = %id, from = %current.status, to = %status, "Event status changed");
                Ok(stored)
            }
            Err(DomainError::Conflict { .. }) => {
                let latest = deadline.run(self.agenda.get_event(id)).await?;
                if latest.status == status {
                    Err(no_op(EntityKind::Event, id, "status", status))
                } else {
                    Err(DomainError::Conflict {
                        entity: EntityKind::Event,
                        id: id.to_string(),
                        expected: current.version,
                        actual: latest.version,
                    })
                }
            }
            Err(e) => Err(e),
        }
    }

    /// Events owned by a producer.
    ///
    /// # Errors
    ///
    /// Returns error if the store fails.
    pub async fn events_by_producer(&self, producer_id: ProfileId, deadline: Deadline) -> Result<Vec<Event>> {
        deadline.run(self.agenda.events_by_producer(producer_id)).await
    }

    /// Events hosted at a venue.
    ///
    /// # Errors
    ///
    /// Returns error if the store fails.
    pub async fn events_by_venue(&self, venue_id: ProfileId, deadline: Deadline) -> Result<Vec<Event>> {
        deadline.run(self.agenda.events_by_venue(venue_id)).await
    }

    /// Replace the list of acts confirmed for an event.
    ///
    /// Acts dropped from the list are released; acts added are confirmed.
    /// Every act must exist before anything changes.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an absent event, a validation error on `acts`
    /// for an absent act, and `Conflict` if an act changed since it was read.
    #[tracing::instrument(skip(self, act_ids))]
    pub async fn set_confirmed_acts(
        &self,
        event_id: EventId,
        act_ids: &[ActId],
        deadline: Deadline,
    ) -> Result<Vec<Act>> {
        deadline.run(self.agenda.get_event(event_id)).await?;

        let wanted: BTreeSet<ActId> = act_ids.iter().copied().collect();
        let mut to_confirm = Vec::with_capacity(wanted.len());
        for id in &wanted {
            match deadline.run(self.agenda.get_act(*id)).await {
                Ok(act) => to_confirm.push(act),
                Err(DomainError::NotFound { .. }) => {
                    return Err(DomainError::validation("acts", format!("act {id} does not exist")));
                }
                Err(e) => return Err(e),
            }
        }

        let now = self.now();
        for mut act in deadline.run(self.agenda.acts_by_event(event_id)).await? {
            if !wanted.contains(&act.id) {
                act.event_id = None;
                act.updated_at = now;
                deadline.run(self.agenda.update_act(&act, act.version)).await?;
            }
        }
        for mut act in to_confirm {
            if act.event_id != Some(event_id) {
                act.event_id = Some(event_id);
                act.updated_at = now;
                deadline.run(self.agenda.update_act(&act, act.version)).await?;
            }
        }

        tracing::info!(event_id = %event_id, acts = wanted.len(), "Confirmed acts updated");
        deadline.run(self.agenda.acts_by_event(event_id)).await
    }

    /// Acts confirmed for an event.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the event is absent.
    pub async fn confirmed_acts(&self, event_id: EventId, deadline: Deadline) -> Result<Vec<Act>> {
        deadline.run(self.agenda.get_event(event_id)).await?;
        deadline.run(self.agenda.acts_by_event(event_id)).await
    }

    /// Create a pending application on behalf of each performer.
    ///
    /// Applications are named `Manual: {performer} - {event}`. Every
    /// performer is checked before any application is written.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an absent event and a validation error on
    /// `performer_ids` for a missing or non-performer profile.
    #[tracing::instrument(skip(self, performer_ids))]
    pub async fn add_performers_to_event(
        &self,
        event_id: EventId,
        performer_ids: &[ProfileId],
        deadline: Deadline,
    ) -> Result<Vec<Application>> {
        let event = deadline.run(self.agenda.get_event(event_id)).await?;
        let now = self.now();

        let mut applications = Vec::with_capacity(performer_ids.len());
        for performer_id in performer_ids {
            let performer = self
                .referenced_profile(*performer_id, ProfileKind::Performer, "performer_ids", deadline)
                .await?;
            let application = Application::new(
                ApplicationId::new(),
                NewApplication {
                    name: format!("Manual: {} - {}", performer.name(), event.name()),
                    performer_id: Some(performer.id),
                    event_id: Some(event.id),
                    status: Some(ApplicationStatus::Pending),
                    form_response_id: None,
                },
                now,
            )?;
            applications.push(application);
        }

        for application in &applications {
            deadline.run(self.agenda.insert_application(application)).await?;
        }
        tracing::info!(event_id = %event_id, added = applications.len(), "Performers added to event");
        Ok(applications)
    }
}
