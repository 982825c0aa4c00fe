//! Authorization scenarios over the in-memory stores.

#![allow(clippy::unwrap_used, clippy::panic)]

use ocall_auth::mocks::MockIdentityVerifier;
use ocall_auth::{
    AuthConfig, AuthError, Authenticator, Authorizer, Caller, Decision, DenyReason, Operation,
    ProfileDirectory, Resource,
};
use ocall_booking::{AgendaService, ProfileService};
use ocall_core::{
    ApplicationId, ApplicationStatus, Deadline, EventId, Identity, NewApplication, NewProfile,
    Permission, ProfileId, ProfileKind,
};
use ocall_testing::{InMemoryAgendaStore, InMemoryProfileStore, fixtures, init_tracing, properties, test_clock};
use proptest::prelude::*;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

type Agenda = AgendaService<InMemoryAgendaStore, InMemoryProfileStore>;

struct Stage {
    agenda: Agenda,
    profiles: ProfileService<InMemoryProfileStore>,
    agenda_store: InMemoryAgendaStore,
    profile_store: InMemoryProfileStore,
}

impl Stage {
    async fn new() -> Self {
        init_tracing();
        let agenda_store = InMemoryAgendaStore::new();
        let profile_store = InMemoryProfileStore::new();
        let clock = Arc::new(test_clock());
        let agenda = AgendaService::new(agenda_store.clone(), profile_store.clone(), clock.clone());
        agenda.create_tag("jazz", Deadline::none()).await.unwrap();
        Self {
            agenda,
            profiles: ProfileService::new(profile_store.clone(), clock),
            agenda_store,
            profile_store,
        }
    }

    fn directory(&self) -> ProfileDirectory<InMemoryAgendaStore, InMemoryProfileStore> {
        ProfileDirectory::new(self.agenda.clone())
    }

    fn authorizer(&self, config: &AuthConfig) -> Authorizer<InMemoryAgendaStore, InMemoryProfileStore> {
        Authorizer::new(self.directory(), config)
    }

    async fn profile(&self, owner: &str, kind: ProfileKind) -> ProfileId {
        self.profiles
            .create_profile(
                Some(&Identity::new(owner)),
                NewProfile {
                    kind,
                    name: format!("{owner} {kind}"),
                    location: None,
                },
                Deadline::none(),
            )
            .await
            .unwrap()
            .id
    }

    async fn event(&self, producer: ProfileId) -> EventId {
        self.agenda
            .create_event(fixtures::new_event(producer, &["jazz"]), Deadline::none())
            .await
            .unwrap()
            .id
    }

    async fn application(&self, performer: ProfileId, event: EventId) -> ApplicationId {
        self.agenda
            .create_application(
                NewApplication {
                    name: "Set".into(),
                    performer_id: Some(performer),
                    event_id: Some(event),
                    ..NewApplication::default()
                },
                Deadline::none(),
            )
            .await
            .unwrap()
            .id
    }
}

fn uid(s: &str) -> Caller {
    Caller::Identity(Identity::new(s))
}

#[tokio::test]
async fn jazz_scenario_end_to_end() {
    let stage = Stage::new().await;
    let producer = stage.profile("uid-p", ProfileKind::Producer).await;
    let performer = stage.profile("uid-f", ProfileKind::Performer).await;
    let event = stage.event(producer).await;
    let application = stage.application(performer, event).await;
    let authorizer = stage.authorizer(&AuthConfig::default());
    let d = Deadline::none();

    let p = uid("uid-p");
    let f = uid("uid-f");
    let app = Resource::Application(application);

    assert!(authorizer.authorize(&p, app, Operation::View, d).await.is_allowed());
    assert!(authorizer.authorize(&f, app, Operation::View, d).await.is_allowed());
    assert!(authorizer.authorize(&f, app, Operation::Modify, d).await.is_allowed());
    assert!(!authorizer.authorize(&p, app, Operation::Modify, d).await.is_allowed());
    assert!(authorizer.authorize(&p, Resource::Event(event), Operation::Modify, d).await.is_allowed());
    assert!(!authorizer.authorize(&f, Resource::Event(event), Operation::Modify, d).await.is_allowed());
}

#[tokio::test]
async fn accepted_performer_still_cannot_modify_the_event() {
    let stage = Stage::new().await;
    let producer = stage.profile("uid-p", ProfileKind::Producer).await;
    let performer = stage.profile("uid-f", ProfileKind::Performer).await;
    let event = stage.event(producer).await;
    let application = stage.application(performer, event).await;
    stage
        .agenda
        .update_application_status(application, ApplicationStatus::Accepted, Deadline::none())
        .await
        .unwrap();

    let authorizer = stage.authorizer(&AuthConfig::default());
    let decision = authorizer
        .authorize(&uid("uid-f"), Resource::Event(event), Operation::Modify, Deadline::none())
        .await;
    assert_eq!(decision, Decision::Deny(DenyReason::NotController));
}

#[tokio::test]
async fn deleting_the_event_removes_access_to_its_applications() {
    let stage = Stage::new().await;
    let producer = stage.profile("uid-p", ProfileKind::Producer).await;
    let performer = stage.profile("uid-f", ProfileKind::Performer).await;
    let event = stage.event(producer).await;
    let application = stage.application(performer, event).await;
    let authorizer = stage.authorizer(&AuthConfig::default());

    stage.agenda.delete_event(event, Deadline::none()).await.unwrap();
    let decision = authorizer
        .authorize(&uid("uid-p"), Resource::Application(application), Operation::View, Deadline::none())
        .await;
    assert_eq!(decision, Decision::Deny(DenyReason::NotFound));
    assert_eq!(decision.into_result().unwrap_err(), AuthError::Forbidden);
}

#[tokio::test]
async fn unknown_and_unowned_resources_look_the_same_to_the_caller() {
    let stage = Stage::new().await;
    let producer = stage.profile("uid-p", ProfileKind::Producer).await;
    let event = stage.event(producer).await;
    let authorizer = stage.authorizer(&AuthConfig::default());
    let stranger = uid("stranger");
    let d = Deadline::none();

    let unowned = authorizer.require(&stranger, Resource::Event(event), Operation::View, d).await;
    let missing = authorizer
        .require(&stranger, Resource::Event(EventId::new()), Operation::View, d)
        .await;
    assert_eq!(unowned, missing);
    assert_eq!(missing.unwrap_err(), AuthError::Forbidden);
}

#[tokio::test]
async fn service_caller_bypasses_lookups() {
    let stage = Stage::new().await;
    stage.profile_store.faults().set_unavailable(true);
    let authorizer = stage.authorizer(&AuthConfig::default());
    let decision = authorizer
        .authorize(&Caller::Service, Resource::Profile(ProfileId::new()), Operation::Modify, Deadline::none())
        .await;
    assert_eq!(decision, Decision::Allow);
}

#[tokio::test]
async fn slow_lookups_deny_with_deadline_exceeded() {
    let stage = Stage::new().await;
    let producer = stage.profile("uid-p", ProfileKind::Producer).await;
    stage.profile_store.faults().set_latency(Duration::from_millis(500));

    let config = AuthConfig::new().with_lookup_timeout(Duration::from_millis(20));
    let decision = stage
        .authorizer(&config)
        .authorize(&uid("uid-p"), Resource::Profile(producer), Operation::View, Deadline::none())
        .await;
    assert_eq!(decision, Decision::Deny(DenyReason::DeadlineExceeded));
}

#[tokio::test]
async fn store_outage_denies_with_lookup_failed() {
    let stage = Stage::new().await;
    let producer = stage.profile("uid-p", ProfileKind::Producer).await;
    let event = stage.event(producer).await;
    stage.agenda_store.faults().set_unavailable(true);

    let decision = stage
        .authorizer(&AuthConfig::default())
        .authorize(&uid("uid-p"), Resource::Event(event), Operation::View, Deadline::none())
        .await;
    assert_eq!(decision, Decision::Deny(DenyReason::LookupFailed));
}

#[tokio::test]
async fn authenticated_request_flows_into_authorization() {
    let stage = Stage::new().await;
    let producer = stage.profile("uid-p", ProfileKind::Producer).await;
    let event = stage.event(producer).await;

    let config = AuthConfig::new().with_service_credential("ops", "s3cret");
    let verifier = MockIdentityVerifier::new().with_token("token-p", Identity::new("uid-p"));
    let authenticator = Authenticator::new(config.clone(), verifier);
    let authorizer = stage.authorizer(&config);

    let caller = authenticator.authenticate(Some("Bearer token-p")).await.unwrap();
    authorizer
        .require(&caller, Resource::Event(event), Operation::Modify, Deadline::none())
        .await
        .unwrap();

    let service_header = format!("Basic {}", config.encoded_service_credential().unwrap());
    let service = authenticator.authenticate(Some(&service_header)).await.unwrap();
    assert_eq!(service, Caller::Service);

    assert_eq!(
        authenticator.authenticate(Some("Bearer stolen")).await.unwrap_err(),
        AuthError::Unauthenticated
    );
}

#[tokio::test]
async fn restricted_link_grants_control() {
    let stage = Stage::new().await;
    let producer = stage.profile("uid-p", ProfileKind::Producer).await;
    let event = stage.event(producer).await;
    stage
        .profiles
        .share_profile(producer, Identity::new("uid-helper"), Permission::Restricted, Deadline::none())
        .await
        .unwrap();

    let directory = stage.directory();
    assert_eq!(
        directory
            .permission_level(&Identity::new("uid-helper"), producer, Deadline::none())
            .await
            .unwrap(),
        Permission::Restricted
    );
    assert!(stage
        .authorizer(&AuthConfig::default())
        .authorize(&uid("uid-helper"), Resource::Event(event), Operation::Modify, Deadline::none())
        .await
        .is_allowed());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn directory_is_the_inverse_of_linking(
        shared in prop::collection::btree_set(properties::identity(), 0..6),
        revoke_mask in prop::collection::vec(any::<bool>(), 6),
    ) {
        tokio_test::block_on(async {
            let stage = Stage::new().await;
            let profile = stage.profile("owner-uid", ProfileKind::Venue).await;
            let directory = stage.directory();
            let d = Deadline::none();

            for identity in &shared {
                stage
                    .profiles
                    .share_profile(profile, identity.clone(), Permission::Restricted, d)
                    .await
                    .unwrap();
            }

            let mut expected: BTreeSet<Identity> = shared.clone();
            expected.insert(Identity::new("owner-uid"));
            assert_eq!(directory.controlling_identities(profile, d).await.unwrap(), expected);
            for identity in &expected {
                let controlled = directory.profiles_controlled_by(identity, d).await.unwrap();
                assert!(controlled.contains(&profile));
            }

            for (identity, revoke) in shared.iter().zip(&revoke_mask) {
                if *revoke {
                    stage.profiles.revoke_access(profile, identity, d).await.unwrap();
                    expected.remove(identity);
                    assert!(!directory
                        .profiles_controlled_by(identity, d)
                        .await
                        .unwrap()
                        .contains(&profile));
                }
            }
            assert_eq!(directory.controlling_identities(profile, d).await.unwrap(), expected);
        });
    }
}
