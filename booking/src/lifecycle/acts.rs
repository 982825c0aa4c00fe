use super::{AgendaService, no_op};
use ocall_core::store::{AgendaStore, ProfileStore};
use ocall_core::{
    Act, ActId, ActUpdate, Deadline, DomainError, EntityKind, NewAct, Profile, ProfileId,
    ProfileKind, Result,
};

impl<A: AgendaStore, P: ProfileStore> AgendaService<A, P> {
    /// Create an act for a performer.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the performer does not resolve to a
    /// performer profile or a tag is unregistered.
    #[tracing::instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_act(&self, input: NewAct, deadline: Deadline) -> Result<Act> {
        let act = Act::new(ActId::new(), input, self.now())?;
        self.referenced_profile(act.performer_id(), ProfileKind::Performer, "performer_id", deadline)
            .await?;
        self.require_registered_tags(act.tags(), deadline).await?;

        deadline.run(self.agenda.insert_act(&act)).await?;
        tracing::info!(act_id = %act.id, performer_id = %act.performer_id(), "Act created");
        Ok(act)
    }

    /// Get an act.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if absent.
    pub async fn get_act(&self, id: ActId, deadline: Deadline) -> Result<Act> {
        deadline.run(self.agenda.get_act(id)).await
    }

    /// Update an act's details.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if absent, a validation error for a blank name
    /// or unregistered tags, and `Conflict` if the act changed since it was
    /// read.
    #[tracing::instrument(skip(self, update))]
    pub async fn update_act(&self, id: ActId, update: ActUpdate, deadline: Deadline) -> Result<Act> {
        let current = deadline.run(self.agenda.get_act(id)).await?;
        let next = current.apply(update, self.now())?;
        if next.tags() != current.tags() {
            self.require_registered_tags(next.tags(), deadline).await?;
        }
        deadline.run(self.agenda.update_act(&next, current.version)).await
    }

    /// Delete an act and drop it from every producer's saved list.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if absent, and `Conflict` if a producer's saved
    /// list keeps changing underneath the cleanup.
    #[tracing::instrument(skip(self))]
    pub async fn delete_act(&self, id: ActId, deadline: Deadline) -> Result<()> {
        deadline.run(self.agenda.get_act(id)).await?;

        for profile in deadline.run(self.profiles.list_profiles()).await? {
            self.drop_saved_act(profile, id, deadline).await?;
        }

        deadline.run(self.agenda.delete_act(id)).await?;
        tracing::info!(act_id = %id, "Act deleted");
        Ok(())
    }

    /// Acts owned by a performer.
    ///
    /// # Errors
    ///
    /// Returns error if the store fails.
    pub async fn acts_by_performer(&self, performer_id: ProfileId, deadline: Deadline) -> Result<Vec<Act>> {
        deadline.run(self.agenda.acts_by_performer(performer_id)).await
    }

    /// Add an act to a producer's saved list.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the producer does not resolve,
    /// `NotFound` if the act is absent, `NoOp` if it is already saved and
    /// `Conflict` if the producer changed concurrently.
    #[tracing::instrument(skip(self))]
    pub async fn save_act_for_producer(
        &self,
        producer_id: ProfileId,
        act_id: ActId,
        deadline: Deadline,
    ) -> Result<()> {
        let current = self
            .referenced_profile(producer_id, ProfileKind::Producer, "producer_id", deadline)
            .await?;
        deadline.run(self.agenda.get_act(act_id)).await?;

        let mut next = current.clone();
        if !next.save_act(act_id)? {
            return Err(no_op(EntityKind::Profile, producer_id, "saved_acts", act_id));
        }
        next.updated_at = self.now();

        match deadline.run(self.profiles.update_profile(&next, current.version)).await {
            Ok(_) => {
                tracing::info!(producer_id = %producer_id, act_id = %act_id, "Act saved");
                Ok(())
            }
            Err(DomainError::Conflict { .. }) => {
                let latest = deadline.run(self.profiles.get_profile(producer_id)).await?;
                if latest.as_producer().is_some_and(|p| p.saved_acts().contains(&act_id)) {
                    Err(no_op(EntityKind::Profile, producer_id, "saved_acts", act_id))
                } else {
                    Err(profile_conflict(&current, &latest))
                }
            }
            Err(e) => Err(e),
        }
    }

    /// Remove an act from a producer's saved list.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the producer does not resolve,
    /// `NotFound` if the act was not saved and `Conflict` if the producer
    /// changed concurrently.
    #[tracing::instrument(skip(self))]
    pub async fn unsave_act_for_producer(
        &self,
        producer_id: ProfileId,
        act_id: ActId,
        deadline: Deadline,
    ) -> Result<()> {
        let current = self
            .referenced_profile(producer_id, ProfileKind::Producer, "producer_id", deadline)
            .await?;
        let mut next = current.clone();
        if !next.unsave_act(act_id) {
            return Err(DomainError::not_found(EntityKind::Act, act_id));
        }
        next.updated_at = self.now();

        match deadline.run(self.profiles.update_profile(&next, current.version)).await {
            Ok(_) => Ok(()),
            Err(DomainError::Conflict { .. }) => {
                let latest = deadline.run(self.profiles.get_profile(producer_id)).await?;
                if latest.as_producer().is_some_and(|p| p.saved_acts().contains(&act_id)) {
                    Err(profile_conflict(&current, &latest))
                } else {
                    Err(DomainError::not_found(EntityKind::Act, act_id))
                }
            }
            Err(e) => Err(e),
        }
    }

    /// Acts a producer has saved, in the order they were saved.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the producer does not resolve.
    pub async fn saved_acts(&self, producer_id: ProfileId, deadline: Deadline) -> Result<Vec<Act>> {
        let producer = self
            .referenced_profile(producer_id, ProfileKind::Producer, "producer_id", deadline)
            .await?;
        let saved: Vec<ActId> = producer
            .as_producer()
            .map(|p| p.saved_acts().to_vec())
            .unwrap_or_default();

        let mut acts = Vec::with_capacity(saved.len());
        for id in saved {
            match deadline.run(self.agenda.get_act(id)).await {
                Ok(act) => acts.push(act),
                Err(DomainError::NotFound { .. }) => {
                    tracing::debug!(producer_id = %producer_id, act_id = %id, "Saved act no longer exists");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(acts)
    }

    /// Remove `act_id` from one profile's saved list. A lost race is retried
    /// once against a fresh read; a profile deleted meanwhile is skipped.
    async fn drop_saved_act(&self, profile: Profile, act_id: ActId, deadline: Deadline) -> Result<()> {
        let mut current = profile;
        for attempt in 0..2 {
            let mut next = current.clone();
            if !next.unsave_act(act_id) {
                return Ok(());
            }
            next.updated_at = self.now();
            match deadline.run(self.profiles.update_profile(&next, current.version)).await {
                Ok(_) => return Ok(()),
                Err(DomainError::Conflict { .. }) if attempt == 0 => {
                    tracing::debug!(profile_id = %current.id, act_id = %act_id, "Saved list changed, re-reading");
                    current = match deadline.run(self.profiles.get_profile(current.id)).await {
                        Ok(latest) => latest,
                        Err(DomainError::NotFound { .. }) => return Ok(()),
                        Err(e) => return Err(e),
                    };
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}

/// A conflict between the profile version a write was based on and the one
/// now stored.
fn profile_conflict(based_on: &Profile, latest: &Profile) -> DomainError {
    DomainError::Conflict {
        entity: EntityKind::Profile,
        id: based_on.id.to_string(),
        expected: based_on.version,
        actual: latest.version,
    }
}
