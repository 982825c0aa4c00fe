use super::{AgendaService, no_op};
use ocall_core::store::{AgendaStore, ProfileStore};
use ocall_core::{
    Application, ApplicationId, ApplicationStatus, ApplicationUpdate, Deadline, DomainError,
    EntityKind, EventId, NewApplication, ProfileId, ProfileKind, Result,
};
use std::fmt::Display;

impl<A: AgendaStore, P: ProfileStore> AgendaService<A, P> {
    /// Submit an application.
    ///
    /// The performer must be an existing performer profile and the event
    /// must exist. Status defaults to pending.
    ///
    /// # Errors
    ///
    /// Returns a validation error on `performer_id` or `event_id` when the
    /// reference is missing or does not resolve.
    #[tracing::instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_application(&self, input: NewApplication, deadline: Deadline) -> Result<Application> {
        let application = Application::new(ApplicationId::new(), input, self.now())?;

        self.referenced_profile(
            application.performer_id(),
            ProfileKind::Performer,
            "performer_id",
            deadline,
        )
        .await?;
        match deadline.run(self.agenda.get_event(application.event_id())).await {
            Ok(_) => {}
            Err(DomainError::NotFound { .. }) => {
                return Err(DomainError::validation(
                    "event_id",
                    format!("event {} does not exist", application.event_id()),
                ));
            }
            Err(e) => return Err(e),
        }

        deadline.run(self.agenda.insert_application(&application)).await?;
        tracing::info!(
            application_id = %application.id,
            event_id = %application.event_id(),
            performer_id = %application.performer_id(),
            "Application created"
        );
        Ok(application)
    }

    /// Get an application.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if absent.
    pub async fn get_application(&self, id: ApplicationId, deadline: Deadline) -> Result<Application> {
        deadline.run(self.agenda.get_application(id)).await
    }

    /// Update an application's name or form response.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if absent, a validation error for a blank name and
    /// `Conflict` if the application changed since it was read.
    #[tracing::instrument(skip(self, update))]
    pub async fn update_application(
        &self,
        id: ApplicationId,
        update: ApplicationUpdate,
        deadline: Deadline,
    ) -> Result<Application> {
        let current = deadline.run(self.agenda.get_application(id)).await?;
        let next = current.apply(update, self.now())?;
        deadline
            .run(self.agenda.update_application(&next, current.version))
            .await
    }

    /// Withdraw an application.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if absent.
    #[tracing::instrument(skip(self))]
    pub async fn delete_application(&self, id: ApplicationId, deadline: Deadline) -> Result<()> {
        deadline.run(self.agenda.delete_application(id)).await?;
        tracing::info!(application_id = %id, "Application deleted");
        Ok(())
    }

    /// Move an application to `status`.
    ///
    /// Any status may follow any other. Re-applying the current status fails.
    ///
    /// # Errors
    ///
    /// Returns `NoOp` if the application already has `status` (including when
    /// a concurrent identical change won), `NotFound` if absent and
    /// `Conflict` if a different concurrent change won.
    #[tracing::instrument(skip(self))]
    pub async fn update_application_status(
        &self,
        id: ApplicationId,
        status: ApplicationStatus,
        deadline: Deadline,
    ) -> Result<Application> {
        let current = deadline.run(self.agenda.get_application(id)).await?;
        self.transition_status(current, status, deadline).await
    }

    /// Move an application to `status`, checking it belongs to `event_id`.
    ///
    /// # Errors
    ///
    /// As [`Self::update_application_status`]; an application of another
    /// event is reported as `NotFound`.
    #[tracing::instrument(skip(self))]
    pub async fn update_event_application_status(
        &self,
        event_id: EventId,
        id: ApplicationId,
        status: ApplicationStatus,
        deadline: Deadline,
    ) -> Result<Application> {
        let current = deadline.run(self.agenda.get_application(id)).await?;
        if current.event_id() != event_id {
            return Err(DomainError::not_found(EntityKind::Application, id));
        }
        self.transition_status(current, status, deadline).await
    }

    /// Set the producer's bookmark on an application.
    ///
    /// # Errors
    ///
    /// Returns `NoOp` if the flag already has that value, `NotFound` if
    /// absent and `Conflict` if a different concurrent change won.
    #[tracing::instrument(skip(self))]
    pub async fn save_application(
        &self,
        id: ApplicationId,
        saved: bool,
        deadline: Deadline,
    ) -> Result<Application> {
        let current = deadline.run(self.agenda.get_application(id)).await?;
        if current.saved == saved {
            return Err(no_op(EntityKind::Application, id, "saved", saved));
        }
        let mut next = current.clone();
        next.saved = saved;
        next.updated_at = self.now();
        self.guarded_write(&current, &next, |app| app.saved == saved, "saved", saved, deadline)
            .await
    }

    /// Applications to an event.
    ///
    /// # Errors
    ///
    /// Returns error if the store fails.
    pub async fn applications_by_event(&self, event_id: EventId, deadline: Deadline) -> Result<Vec<Application>> {
        deadline.run(self.agenda.applications_by_event(event_id)).await
    }

    /// Applications submitted by a performer.
    ///
    /// # Errors
    ///
    /// Returns error if the store fails.
    pub async fn applications_by_performer(
        &self,
        performer_id: ProfileId,
        deadline: Deadline,
    ) -> Result<Vec<Application>> {
        deadline.run(self.agenda.applications_by_performer(performer_id)).await
    }

    async fn transition_status(
        &self,
        current: Application,
        status: ApplicationStatus,
        deadline: Deadline,
    ) -> Result<Application> {
        if current.status == status {
            return Err(no_op(EntityKind::Application, current.id, "status", status));
        }
        let mut next = current.clone();
        next.status = status;
        next.updated_at = self.now();

        let stored = self
            .guarded_write(&current, &next, |app| app.status == status, "status", status, deadline)
            .await?;
        tracing::info!(
            application_id = %current.id,
            from = %current.status,
            to = %status,
            "Application status changed"
        );
        Ok(stored)
    }

    /// Versioned write of `next` over `current`.
    ///
    /// On a version conflict the application is re-read once: if the
    /// competing writer already produced the requested value the caller gets
    /// `NoOp`, otherwise the conflict surfaces.
    async fn guarded_write<F>(
        &self,
        current: &Application,
        next: &Application,
        already: F,
        field: &'static str,
        value: impl Display + Send,
        deadline: Deadline,
    ) -> Result<Application>
    where
        F: Fn(&Application) -> bool + Send,
    {
        match deadline
            .run(self.agenda.update_application(next, current.version))
            .await
        {
            Err(DomainError::Conflict { .. }) => {
                let latest = deadline.run(self.agenda.get_application(current.id)).await?;
                if already(&latest) {
                    tracing::debug!(application_id = %current.id, field, "Concurrent identical change won");
                    Err(no_op(EntityKind::Application, current.id, field, value))
                } else {
                    Err(DomainError::Conflict {
                        entity: EntityKind::Application,
                        id: current.id.to_string(),
                        expected: current.version,
                        actual: latest.version,
                    })
                }
            }
            result => result,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crate::AgendaService;
    use ocall_core::store::{AgendaStore, ProfileStore};
    use ocall_core::{
        ApplicationStatus, ApplicationUpdate, Deadline, DomainError, Event, EventId,
        NewApplication, Profile, ProfileKind, Tag,
    };
    use ocall_testing::{InMemoryAgendaStore, InMemoryProfileStore, fixtures, test_clock};
    use std::sync::Arc;

    struct World {
        service: AgendaService<InMemoryAgendaStore, InMemoryProfileStore>,
        performer: Profile,
        event: Event,
    }

    async fn world() -> World {
        let agenda = InMemoryAgendaStore::new();
        let profiles = InMemoryProfileStore::new();
        agenda.insert_tag(&Tag::new("jazz").unwrap()).await.unwrap();
        let producer = fixtures::profile(ProfileKind::Producer, "Booker");
        let performer = fixtures::profile(ProfileKind::Performer, "Trio");
        profiles.insert_profile(&producer).await.unwrap();
        profiles.insert_profile(&performer).await.unwrap();
        let service = AgendaService::new(agenda, profiles, Arc::new(test_clock()));
        let event = service
            .create_event(fixtures::new_event(producer.id, &["jazz"]), Deadline::none())
            .await
            .unwrap();
        World {
            service,
            performer,
            event,
        }
    }

    fn apply(world: &World) -> NewApplication {
        NewApplication {
            name: "Trio at Late Set".into(),
            performer_id: Some(world.performer.id),
            event_id: Some(world.event.id),
            ..NewApplication::default()
        }
    }

    #[tokio::test]
    async fn performer_and_event_must_resolve() {
        let w = world().await;

        let mut wrong_kind = apply(&w);
        wrong_kind.performer_id = Some(w.event.producer_id());
        let err = w.service.create_application(wrong_kind, Deadline::none()).await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(ref v) if v.field == "performer_id"));

        let mut no_event = apply(&w);
        no_event.event_id = Some(EventId::new());
        let err = w.service.create_application(no_event, Deadline::none()).await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(ref v) if v.field == "event_id"));

        assert_eq!(w.service.agenda().application_count(), 0);
    }

    #[tokio::test]
    async fn same_status_is_a_no_op_and_leaves_state_unchanged() {
        let w = world().await;
        let app = w.service.create_application(apply(&w), Deadline::none()).await.unwrap();
        assert_eq!(app.status, ApplicationStatus::Pending);

        let err = w
            .service
            .update_application_status(app.id, ApplicationStatus::Pending, Deadline::none())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NoOp { field: "status", .. }));
        assert_eq!(w.service.get_application(app.id, Deadline::none()).await.unwrap(), app);
    }

    #[tokio::test]
    async fn any_status_may_follow_any_other() {
        let w = world().await;
        let app = w.service.create_application(apply(&w), Deadline::none()).await.unwrap();

        for status in [
            ApplicationStatus::Accepted,
            ApplicationStatus::Pending,
            ApplicationStatus::Rejected,
            ApplicationStatus::Offered,
        ] {
            let updated = w
                .service
                .update_application_status(app.id, status, Deadline::none())
                .await
                .unwrap();
            assert_eq!(updated.status, status);
        }
    }

    #[tokio::test]
    async fn event_scoped_transition_checks_the_event() {
        let w = world().await;
        let app = w.service.create_application(apply(&w), Deadline::none()).await.unwrap();

        let err = w
            .service
            .update_event_application_status(EventId::new(), app.id, ApplicationStatus::Offered, Deadline::none())
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        let offered = w
            .service
            .update_event_application_status(w.event.id, app.id, ApplicationStatus::Offered, Deadline::none())
            .await
            .unwrap();
        assert_eq!(offered.status, ApplicationStatus::Offered);
    }

    #[tokio::test]
    async fn save_flag_is_guarded() {
        let w = world().await;
        let app = w.service.create_application(apply(&w), Deadline::none()).await.unwrap();

        let saved = w.service.save_application(app.id, true, Deadline::none()).await.unwrap();
        assert!(saved.saved);
        let err = w.service.save_application(app.id, true, Deadline::none()).await.unwrap_err();
        assert!(matches!(err, DomainError::NoOp { field: "saved", .. }));
    }

    #[tokio::test]
    async fn update_keeps_references() {
        let w = world().await;
        let app = w.service.create_application(apply(&w), Deadline::none()).await.unwrap();
        let updated = w
            .service
            .update_application(
                app.id,
                ApplicationUpdate {
                    form_response_id: Some(Some("resp-1".into())),
                    ..ApplicationUpdate::default()
                },
                Deadline::none(),
            )
            .await
            .unwrap();
        assert_eq!(updated.form_response_id.as_deref(), Some("resp-1"));
        assert_eq!(updated.performer_id(), w.performer.id);
        assert_eq!(updated.event_id(), w.event.id);
    }
}
