//! End-to-end lifecycle and search scenarios over the in-memory stores.

#![allow(clippy::unwrap_used, clippy::panic)]

use chrono::Duration;
use futures::TryStreamExt;
use ocall_booking::{AgendaService, EventSearch, ProfileService, SearchConfig, SearchQuery, TimeWindow};
use ocall_core::store::ProfileStore;
use ocall_core::{
    ApplicationStatus, Deadline, DomainError, EntityKind, Event, GeoPoint, Identity, NewAct,
    NewApplication, NewEvent, NewProfile, Profile, ProfileKind,
};
use ocall_testing::{
    InMemoryAgendaStore, InMemoryProfileStore, fixtures, init_tracing, properties, test_clock,
};
use proptest::prelude::*;
use std::sync::Arc;

struct Harness {
    agenda: AgendaService<InMemoryAgendaStore, InMemoryProfileStore>,
    profiles: ProfileService<InMemoryProfileStore>,
    agenda_store: InMemoryAgendaStore,
    profile_store: InMemoryProfileStore,
}

impl Harness {
    async fn new() -> Self {
        init_tracing();
        let agenda_store = InMemoryAgendaStore::new();
        let profile_store = InMemoryProfileStore::new();
        let clock = Arc::new(test_clock());
        let agenda = AgendaService::new(agenda_store.clone(), profile_store.clone(), clock.clone());
        let profiles = ProfileService::new(profile_store.clone(), clock);
        agenda.create_tag("jazz", Deadline::none()).await.unwrap();
        Self {
            agenda,
            profiles,
            agenda_store,
            profile_store,
        }
    }

    fn search(&self, page_size: usize) -> EventSearch<InMemoryAgendaStore, InMemoryProfileStore> {
        EventSearch::new(
            self.agenda_store.clone(),
            self.profile_store.clone(),
            SearchConfig::new().with_page_size(page_size),
        )
        .unwrap()
    }

    async fn profile(&self, owner: &str, kind: ProfileKind, name: &str) -> Profile {
        self.profiles
            .create_profile(
                Some(&Identity::new(owner)),
                NewProfile {
                    kind,
                    name: name.to_string(),
                    location: None,
                },
                Deadline::none(),
            )
            .await
            .unwrap()
    }

    async fn collect(&self, search: &EventSearch<InMemoryAgendaStore, InMemoryProfileStore>, query: SearchQuery) -> Vec<Event> {
        search
            .search(query, Deadline::none())
            .unwrap()
            .try_collect()
            .await
            .unwrap()
    }
}

#[tokio::test]
async fn producer_performer_jazz_scenario_search() {
    let h = Harness::new().await;
    let producer = h.profile("uid-p", ProfileKind::Producer, "Booker").await;
    let performer = h.profile("uid-f", ProfileKind::Performer, "Trio").await;

    let here = fixtures::point(40.7128, -74.006);
    let t = fixtures::day(7);
    let event = h
        .agenda
        .create_event(
            NewEvent::new("Late Set", &["jazz"], producer.id, t).with_location(here),
            Deadline::none(),
        )
        .await
        .unwrap();
    h.agenda
        .create_application(
            NewApplication {
                name: "Trio at Late Set".into(),
                performer_id: Some(performer.id),
                event_id: Some(event.id),
                ..NewApplication::default()
            },
            Deadline::none(),
        )
        .await
        .unwrap();

    let found = h
        .collect(
            &h.search(100),
            SearchQuery::all()
                .within(TimeWindow::between(t - Duration::hours(1), t + Duration::hours(1)))
                .near(here, 1.0),
        )
        .await;
    assert_eq!(found, vec![event]);
}

#[tokio::test]
async fn search_pages_through_every_event_when_unfiltered() {
    let h = Harness::new().await;
    let producer = h.profile("uid-p", ProfileKind::Producer, "Booker").await;
    for _ in 0..7 {
        h.agenda
            .create_event(fixtures::new_event(producer.id, &["jazz"]), Deadline::none())
            .await
            .unwrap();
    }

    for page_size in [1, 3, 7, 100] {
        let all = h.collect(&h.search(page_size), SearchQuery::all()).await;
        assert_eq!(all.len(), 7, "page size {page_size}");
    }
}

#[tokio::test]
async fn venue_backed_events_use_the_venue_point() {
    let h = Harness::new().await;
    let producer = h.profile("uid-p", ProfileKind::Producer, "Booker").await;
    let venue_point = fixtures::point(51.5074, -0.1278);
    let venue = fixtures::venue("Jazz Cafe", venue_point);
    h.profile_store.insert_profile(&venue).await.unwrap();

    let event = h
        .agenda
        .create_event(
            NewEvent::new("London Set", &["jazz"], producer.id, fixtures::day(3)).with_venue(venue.id),
            Deadline::none(),
        )
        .await
        .unwrap();
    // An event elsewhere that must not match.
    h.agenda
        .create_event(fixtures::new_event(producer.id, &["jazz"]), Deadline::none())
        .await
        .unwrap();

    let near_venue = h.collect(&h.search(100), SearchQuery::all().near(venue_point, 2.0)).await;
    assert_eq!(near_venue, vec![event.clone()]);

    // Once the venue is gone the event has no point and drops out.
    h.profile_store.delete_profile(venue.id).await.unwrap();
    let after = h.collect(&h.search(100), SearchQuery::all().near(venue_point, 2.0)).await;
    assert!(after.is_empty());
    assert_eq!(h.collect(&h.search(100), SearchQuery::all()).await.len(), 2);
}

#[tokio::test]
async fn geo_boundary_is_inclusive() {
    let h = Harness::new().await;
    let producer = h.profile("uid-p", ProfileKind::Producer, "Booker").await;
    let center = fixtures::point(40.0, -74.0);
    let spot = fixtures::point(40.009, -74.0);
    h.agenda
        .create_event(
            NewEvent::new("Edge", &["jazz"], producer.id, fixtures::day(1)).with_location(spot),
            Deadline::none(),
        )
        .await
        .unwrap();

    let exact = center.distance_km(&spot);
    let search = h.search(100);
    assert_eq!(h.collect(&search, SearchQuery::all().near(center, exact)).await.len(), 1);
    assert!(h.collect(&search, SearchQuery::all().near(center, exact - 1e-6)).await.is_empty());
}

#[tokio::test]
async fn malformed_query_fails_before_streaming() {
    let h = Harness::new().await;
    let query = SearchQuery {
        center: Some(fixtures::point(0.0, 0.0)),
        ..SearchQuery::all()
    };
    let err = h.search(100).search(query, Deadline::none()).err().unwrap();
    assert!(matches!(err, DomainError::Validation(ref v) if v.field == "radius_km"));
}

#[tokio::test]
async fn slow_store_trips_the_deadline() {
    let h = Harness::new().await;
    let producer = h.profile("uid-p", ProfileKind::Producer, "Booker").await;
    h.agenda_store.faults().set_latency(std::time::Duration::from_millis(500));

    let result = h
        .agenda
        .create_event(
            fixtures::new_event(producer.id, &["jazz"]),
            Deadline::after(std::time::Duration::from_millis(20)),
        )
        .await;
    assert_eq!(result.unwrap_err(), DomainError::DeadlineExceeded);

    let streamed: Result<Vec<Event>, DomainError> = h
        .search(100)
        .search(SearchQuery::all(), Deadline::after(std::time::Duration::from_millis(20)))
        .unwrap()
        .try_collect()
        .await;
    assert_eq!(streamed.unwrap_err(), DomainError::DeadlineExceeded);
}

#[tokio::test]
async fn concurrent_identical_transitions_succeed_exactly_once() {
    let h = Harness::new().await;
    let producer = h.profile("uid-p", ProfileKind::Producer, "Booker").await;
    let performer = h.profile("uid-f", ProfileKind::Performer, "Trio").await;
    let event = h
        .agenda
        .create_event(fixtures::new_event(producer.id, &["jazz"]), Deadline::none())
        .await
        .unwrap();
    let application = h
        .agenda
        .create_application(
            NewApplication {
                name: "Trio".into(),
                performer_id: Some(performer.id),
                event_id: Some(event.id),
                ..NewApplication::default()
            },
            Deadline::none(),
        )
        .await
        .unwrap();

    // Latency makes both callers read version 0 before either writes.
    h.agenda_store.faults().set_latency(std::time::Duration::from_millis(20));
    let (first, second) = tokio::join!(
        h.agenda.update_application_status(application.id, ApplicationStatus::Accepted, Deadline::none()),
        h.agenda.update_application_status(application.id, ApplicationStatus::Accepted, Deadline::none()),
    );
    h.agenda_store.faults().set_latency(std::time::Duration::ZERO);

    let outcomes = [first, second];
    let successes = outcomes.iter().filter(|r| r.is_ok()).count();
    let no_ops = outcomes
        .iter()
        .filter(|r| matches!(r, Err(DomainError::NoOp { .. })))
        .count();
    assert_eq!((successes, no_ops), (1, 1));

    let stored = h.agenda.get_application(application.id, Deadline::none()).await.unwrap();
    assert_eq!(stored.status, ApplicationStatus::Accepted);
    assert_eq!(stored.version, 1);
}

#[tokio::test]
async fn concurrent_saves_of_different_acts_never_lose_one_silently() {
    let h = Harness::new().await;
    let producer = h.profile("uid-p", ProfileKind::Producer, "Booker").await;
    let performer = h.profile("uid-f", ProfileKind::Performer, "Trio").await;
    let mut acts = Vec::new();
    for name in ["Standards", "Ballads"] {
        let act = h
            .agenda
            .create_act(
                NewAct {
                    name: name.into(),
                    tags: vec!["jazz".into()],
                    performer_id: Some(performer.id),
                    ..NewAct::default()
                },
                Deadline::none(),
            )
            .await
            .unwrap();
        acts.push(act.id);
    }

    // Both callers read the producer at version 0 before either writes.
    h.profile_store.faults().set_latency(std::time::Duration::from_millis(20));
    let (first, second) = tokio::join!(
        h.agenda.save_act_for_producer(producer.id, acts[0], Deadline::none()),
        h.agenda.save_act_for_producer(producer.id, acts[1], Deadline::none()),
    );
    h.profile_store.faults().set_latency(std::time::Duration::ZERO);

    let outcomes = [first, second];
    let saved_by_success: Vec<_> = acts
        .iter()
        .zip(&outcomes)
        .filter(|(_, r)| r.is_ok())
        .map(|(id, _)| *id)
        .collect();
    let conflicts = outcomes
        .iter()
        .filter(|r| matches!(r, Err(DomainError::Conflict { entity: EntityKind::Profile, .. })))
        .count();
    assert_eq!((saved_by_success.len(), conflicts), (1, 1));

    let stored = h.profiles.get_profile(producer.id, Deadline::none()).await.unwrap();
    assert_eq!(stored.as_producer().unwrap().saved_acts(), saved_by_success.as_slice());
    assert_eq!(stored.version, 1);

    // The loser can simply retry against the fresh version.
    let loser = acts.iter().find(|id| !saved_by_success.contains(id)).copied().unwrap();
    h.agenda.save_act_for_producer(producer.id, loser, Deadline::none()).await.unwrap();
    let stored = h.profiles.get_profile(producer.id, Deadline::none()).await.unwrap();
    assert_eq!(stored.as_producer().unwrap().saved_acts().len(), 2);
}

#[tokio::test]
async fn referenced_profiles_cannot_be_deleted() {
    let h = Harness::new().await;
    let producer = h.profile("uid-p", ProfileKind::Producer, "Booker").await;
    let idle = h.profile("uid-v", ProfileKind::Venue, "Hall").await;
    let event = h
        .agenda
        .create_event(fixtures::new_event(producer.id, &["jazz"]), Deadline::none())
        .await
        .unwrap();

    let err = h.agenda.delete_profile(producer.id, Deadline::none()).await.unwrap_err();
    assert!(matches!(err, DomainError::Validation(ref v) if v.field == "id" && v.reason.contains("1 produced events")));
    assert!(h.profiles.get_profile(producer.id, Deadline::none()).await.is_ok());

    h.agenda.delete_profile(idle.id, Deadline::none()).await.unwrap();
    assert!(h.profiles.profiles_for_identity(&Identity::new("uid-v"), Deadline::none()).await.unwrap().is_empty());

    h.agenda.delete_event(event.id, Deadline::none()).await.unwrap();
    h.agenda.delete_profile(producer.id, Deadline::none()).await.unwrap();
    let gone = h.agenda.delete_profile(producer.id, Deadline::none()).await.unwrap_err();
    assert!(gone.is_not_found());
}

#[tokio::test]
async fn event_without_venue_or_location_is_rejected() {
    let h = Harness::new().await;
    let producer = h.profile("uid-p", ProfileKind::Producer, "Booker").await;
    let err = h
        .agenda
        .create_event(
            NewEvent::new("Nowhere", &["jazz"], producer.id, fixtures::day(1)),
            Deadline::none(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation(ref v) if v.field == "location"));
    assert_eq!(h.agenda_store.event_count(), 0);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn each_distinct_transition_succeeds_once(
        statuses in prop::collection::vec(properties::application_status(), 1..12)
    ) {
        tokio_test::block_on(async {
            let h = Harness::new().await;
            let producer = h.profile("uid-p", ProfileKind::Producer, "Booker").await;
            let performer = h.profile("uid-f", ProfileKind::Performer, "Trio").await;
            let event = h
                .agenda
                .create_event(fixtures::new_event(producer.id, &["jazz"]), Deadline::none())
                .await
                .unwrap();
            let app = h
                .agenda
                .create_application(
                    NewApplication {
                        name: "Trio".into(),
                        performer_id: Some(performer.id),
                        event_id: Some(event.id),
                        ..NewApplication::default()
                    },
                    Deadline::none(),
                )
                .await
                .unwrap();

            let mut current = ApplicationStatus::Pending;
            let mut version = 0;
            for status in statuses {
                let result = h
                    .agenda
                    .update_application_status(app.id, status, Deadline::none())
                    .await;
                if status == current {
                    assert!(matches!(result, Err(DomainError::NoOp { .. })));
                } else {
                    version += 1;
                    current = status;
                    assert_eq!(result.unwrap().version, version);
                }
                let stored = h.agenda.get_application(app.id, Deadline::none()).await.unwrap();
                assert_eq!((stored.status, stored.version), (current, version));
            }
        });
    }

    #[test]
    fn search_without_filters_returns_every_point(
        points in prop::collection::vec(properties::geo_point(), 0..6)
    ) {
        tokio_test::block_on(async {
            let h = Harness::new().await;
            let producer = h.profile("uid-p", ProfileKind::Producer, "Booker").await;
            for point in &points {
                h.agenda
                    .create_event(
                        NewEvent::new("Anywhere", &["jazz"], producer.id, fixtures::day(1))
                            .with_location(*point),
                        Deadline::none(),
                    )
                    .await
                    .unwrap();
            }
            let found = h.collect(&h.search(2), SearchQuery::all()).await;
            assert_eq!(found.len(), points.len());
            let located: Vec<GeoPoint> = found.iter().filter_map(Event::location).collect();
            assert_eq!(located.len(), points.len());
        });
    }
}
