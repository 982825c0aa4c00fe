//! Persistence collaborator traits.
//!
//! The booking services never talk to a database directly. They go through
//! these two traits, which a relational backend or the in-memory stores in
//! `ocall-testing` implement.
//!
//! # Implementation Notes
//!
//! - A lookup of an absent record returns [`DomainError::NotFound`], never a
//!   generic storage error.
//! - Versioned updates (`update_event`, `update_application`) are
//!   compare-and-swap: when the stored version differs from the expected one
//!   the store writes nothing and fails with [`DomainError::Conflict`]. On
//!   success the stored version is `expected + 1`.
//! - Backend failures map to [`DomainError::Storage`].
//!
//! [`DomainError::NotFound`]: crate::error::DomainError::NotFound
//! [`DomainError::Conflict`]: crate::error::DomainError::Conflict
//! [`DomainError::Storage`]: crate::error::DomainError::Storage

use crate::act::Act;
use crate::application::Application;
use crate::error::Result;
use crate::event::Event;
use crate::ids::{ActId, ApplicationId, EventId, Identity, ProfileId, TagId};
use crate::profile::{Profile, UserLink};
use crate::tag::Tag;
use std::collections::BTreeSet;
use std::future::Future;

/// Profiles and the identity links that control them.
pub trait ProfileStore: Send + Sync {
    /// Insert a new profile. Links on the value are ignored; use [`Self::insert_link`].
    ///
    /// # Errors
    ///
    /// Returns error if the ID is taken or the backend fails.
    fn insert_profile(&self, profile: &Profile) -> impl Future<Output = Result<()>> + Send;

    /// Get a profile with its links populated.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if absent.
    fn get_profile(&self, id: ProfileId) -> impl Future<Output = Result<Profile>> + Send;

    /// Overwrite the stored fields of a profile if its version is still
    /// `expected_version`. Links are left untouched. Returns the stored
    /// profile with its links.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if absent, `Conflict` on a version mismatch.
    fn update_profile(
        &self,
        profile: &Profile,
        expected_version: u64,
    ) -> impl Future<Output = Result<Profile>> + Send;

    /// Delete a profile and every link to it.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if absent.
    fn delete_profile(&self, id: ProfileId) -> impl Future<Output = Result<()>> + Send;

    /// Create a link.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the profile is absent and a validation error if
    /// the identity is already linked to it.
    fn insert_link(&self, link: &UserLink) -> impl Future<Output = Result<()>> + Send;

    /// Remove the link between `identity` and `profile_id`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if there is no such link.
    fn delete_link(
        &self,
        identity: &Identity,
        profile_id: ProfileId,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Links on a profile.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the profile is absent.
    fn links_for_profile(
        &self,
        profile_id: ProfileId,
    ) -> impl Future<Output = Result<Vec<UserLink>>> + Send;

    /// Profiles linked to `identity`. Empty when there are none.
    ///
    /// # Errors
    ///
    /// Returns error if the backend fails.
    fn profiles_for_identity(
        &self,
        identity: &Identity,
    ) -> impl Future<Output = Result<Vec<Profile>>> + Send;

    /// All profiles.
    ///
    /// # Errors
    ///
    /// Returns error if the backend fails.
    fn list_profiles(&self) -> impl Future<Output = Result<Vec<Profile>>> + Send;
}

/// Tags, events, applications and acts.
pub trait AgendaStore: Send + Sync {
    /// Register a tag.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the name is taken.
    fn insert_tag(&self, tag: &Tag) -> impl Future<Output = Result<()>> + Send;

    /// Registered tags among `names`. Unknown names are simply absent from the result.
    ///
    /// # Errors
    ///
    /// Returns error if the backend fails.
    fn tags_by_name(
        &self,
        names: &BTreeSet<String>,
    ) -> impl Future<Output = Result<Vec<Tag>>> + Send;

    /// Every registered tag, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns error if the backend fails.
    fn list_tags(&self) -> impl Future<Output = Result<Vec<Tag>>> + Send;

    /// Unregister a tag.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if absent.
    fn delete_tag(&self, id: TagId) -> impl Future<Output = Result<()>> + Send;

    /// Insert a new event.
    ///
    /// # Errors
    ///
    /// Returns error if the ID is taken or the backend fails.
    fn insert_event(&self, event: &Event) -> impl Future<Output = Result<()>> + Send;

    /// Get an event.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if absent.
    fn get_event(&self, id: EventId) -> impl Future<Output = Result<Event>> + Send;

    /// Replace an event if its stored version is `expected_version`.
    ///
    /// # Returns
    ///
    /// The stored event, with its version bumped.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if absent, `Conflict` on a version mismatch.
    fn update_event(
        &self,
        event: &Event,
        expected_version: u64,
    ) -> impl Future<Output = Result<Event>> + Send;

    /// Delete an event.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if absent.
    fn delete_event(&self, id: EventId) -> impl Future<Output = Result<()>> + Send;

    /// Events owned by a producer.
    ///
    /// # Errors
    ///
    /// Returns error if the backend fails.
    fn events_by_producer(
        &self,
        producer_id: ProfileId,
    ) -> impl Future<Output = Result<Vec<Event>>> + Send;

    /// Events hosted at a venue.
    ///
    /// # Errors
    ///
    /// Returns error if the backend fails.
    fn events_by_venue(
        &self,
        venue_id: ProfileId,
    ) -> impl Future<Output = Result<Vec<Event>>> + Send;

    /// Up to `limit` events ordered by ID, starting strictly after `after`.
    ///
    /// An empty page means the collection is exhausted.
    ///
    /// # Errors
    ///
    /// Returns error if the backend fails.
    fn events_page(
        &self,
        after: Option<EventId>,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<Event>>> + Send;

    /// Insert a new application.
    ///
    /// # Errors
    ///
    /// Returns error if the ID is taken or the backend fails.
    fn insert_application(
        &self,
        application: &Application,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Get an application.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if absent.
    fn get_application(
        &self,
        id: ApplicationId,
    ) -> impl Future<Output = Result<Application>> + Send;

    /// Replace an application if its stored version is `expected_version`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if absent, `Conflict` on a version mismatch.
    fn update_application(
        &self,
        application: &Application,
        expected_version: u64,
    ) -> impl Future<Output = Result<Application>> + Send;

    /// Delete an application.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if absent.
    fn delete_application(&self, id: ApplicationId) -> impl Future<Output = Result<()>> + Send;

    /// Applications to an event.
    ///
    /// # Errors
    ///
    /// Returns error if the backend fails.
    fn applications_by_event(
        &self,
        event_id: EventId,
    ) -> impl Future<Output = Result<Vec<Application>>> + Send;

    /// Applications submitted by a performer.
    ///
    /// # Errors
    ///
    /// Returns error if the backend fails.
    fn applications_by_performer(
        &self,
        performer_id: ProfileId,
    ) -> impl Future<Output = Result<Vec<Application>>> + Send;

    /// Insert a new act.
    ///
    /// # Errors
    ///
    /// Returns error if the ID is taken or the backend fails.
    fn insert_act(&self, act: &Act) -> impl Future<Output = Result<()>> + Send;

    /// Get an act.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if absent.
    fn get_act(&self, id: ActId) -> impl Future<Output = Result<Act>> + Send;

    /// Overwrite an act if its version is still `expected_version`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if absent, `Conflict` on a version mismatch.
    fn update_act(&self, act: &Act, expected_version: u64) -> impl Future<Output = Result<Act>> + Send;

    /// Delete an act.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if absent.
    fn delete_act(&self, id: ActId) -> impl Future<Output = Result<()>> + Send;

    /// Acts owned by a performer.
    ///
    /// # Errors
    ///
    /// Returns error if the backend fails.
    fn acts_by_performer(
        &self,
        performer_id: ProfileId,
    ) -> impl Future<Output = Result<Vec<Act>>> + Send;

    /// Acts confirmed for an event.
    ///
    /// # Errors
    ///
    /// Returns error if the backend fails.
    fn acts_by_event(&self, event_id: EventId) -> impl Future<Output = Result<Vec<Act>>> + Send;
}
