//! Authorization Engine.
//!
//! Access is decided by ownership alone: a caller may act on a resource when
//! they control the profile that owns it. The rules, in order:
//!
//! 1. The service caller is allowed everything.
//! 2. A profile is accessible to the identities linked to it.
//! 3. An event is accessible to whoever controls its producer.
//! 4. An application can be viewed by whoever controls its performer or the
//!    producer of its event.
//! 5. An application can be modified only by whoever controls its performer.
//! 6. Any lookup that fails, times out or finds nothing denies.
//! 7. Everything else is denied.
//!
//! Decisions are computed per request and never cached. The reason behind a
//! denial is logged but never returned: every denial becomes the same
//! [`AuthError::Forbidden`].

use crate::config::AuthConfig;
use crate::directory::ProfileDirectory;
use crate::error::{AuthError, Result};
use ocall_core::store::{AgendaStore, ProfileStore};
use ocall_core::{ApplicationId, Deadline, DomainError, EventId, Identity, ProfileId};
use std::fmt;
use std::time::Duration;

/// Who is making a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Caller {
    /// The trusted service credential.
    Service,
    /// A verified end-user identity.
    Identity(Identity),
}

/// What a request touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    /// A profile.
    Profile(ProfileId),
    /// An event.
    Event(EventId),
    /// An application.
    Application(ApplicationId),
}

/// What a request does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Read.
    View,
    /// Create, change or delete.
    Modify,
}

/// Why access was denied. For logs only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// The caller controls none of the owning profiles.
    NotController,
    /// The resource, or something on the ownership path, does not exist.
    NotFound,
    /// The lookups did not finish in time.
    DeadlineExceeded,
    /// A lookup failed.
    LookupFailed,
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::NotController => "not a controller",
            Self::NotFound => "not found",
            Self::DeadlineExceeded => "deadline exceeded",
            Self::LookupFailed => "lookup failed",
        };
        f.write_str(reason)
    }
}

/// Outcome of an authorization check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Go ahead.
    Allow,
    /// Refuse.
    Deny(DenyReason),
}

impl Decision {
    /// Whether access is allowed.
    #[must_use]
    pub const fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }

    /// `Ok` on allow; every denial is the same [`AuthError::Forbidden`].
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Forbidden`] on deny.
    pub const fn into_result(self) -> Result<()> {
        match self {
            Self::Allow => Ok(()),
            Self::Deny(_) => Err(AuthError::Forbidden),
        }
    }
}

impl DenyReason {
    const fn from_lookup(error: &DomainError) -> Self {
        match error {
            DomainError::NotFound { .. } => Self::NotFound,
            DomainError::DeadlineExceeded => Self::DeadlineExceeded,
            _ => Self::LookupFailed,
        }
    }
}

/// Decides whether a caller may perform an operation on a resource.
#[derive(Clone)]
pub struct Authorizer<A, P> {
    directory: ProfileDirectory<A, P>,
    lookup_timeout: Duration,
}

impl<A: AgendaStore, P: ProfileStore> Authorizer<A, P> {
    /// Create an authorizer over `directory`.
    #[must_use]
    pub const fn new(directory: ProfileDirectory<A, P>, config: &AuthConfig) -> Self {
        Self {
            directory,
            lookup_timeout: config.lookup_timeout,
        }
    }

    /// The directory decisions are built on.
    pub const fn directory(&self) -> &ProfileDirectory<A, P> {
        &self.directory
    }

    /// Decide whether `caller` may perform `operation` on `resource`.
    ///
    /// Lookups run under `deadline`, capped at the configured lookup timeout.
    /// This never fails: lookup errors become denials.
    #[tracing::instrument(skip(self, deadline))]
    pub async fn authorize(
        &self,
        caller: &Caller,
        resource: Resource,
        operation: Operation,
        deadline: Deadline,
    ) -> Decision {
        let identity = match caller {
            Caller::Service => return Decision::Allow,
            Caller::Identity(identity) => identity,
        };
        let deadline = deadline.capped(self.lookup_timeout);

        let controls = match (resource, operation) {
            (Resource::Profile(id), _) => self.directory.controls(identity, id, deadline).await,
            (Resource::Event(id), _) => self.controls_producer_of_event(identity, id, deadline).await,
            (Resource::Application(id), Operation::View) => {
                self.controls_application_party(identity, id, deadline).await
            }
            (Resource::Application(id), Operation::Modify) => {
                self.controls_performer_of_application(identity, id, deadline).await
            }
        };

        match controls {
            Ok(true) => Decision::Allow,
            Ok(false) => {
                tracing::debug!(reason = %DenyReason::NotController, "Access denied");
                Decision::Deny(DenyReason::NotController)
            }
            Err(e) => {
                let reason = DenyReason::from_lookup(&e);
                if reason == DenyReason::NotFound {
                    tracing::debug!(%reason, error = %e, "Access denied");
                } else {
                    tracing::warn!(%reason, error = %e, "Access denied after failed lookup");
                }
                Decision::Deny(reason)
            }
        }
    }

    /// [`Self::authorize`] as a `Result`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Forbidden`] whenever access is denied.
    pub async fn require(
        &self,
        caller: &Caller,
        resource: Resource,
        operation: Operation,
        deadline: Deadline,
    ) -> Result<()> {
        self.authorize(caller, resource, operation, deadline)
            .await
            .into_result()
    }

    async fn controls_producer_of_event(
        &self,
        identity: &Identity,
        event_id: EventId,
        deadline: Deadline,
    ) -> ocall_core::Result<bool> {
        let producer = self.directory.producer_of_event(event_id, deadline).await?;
        self.directory.controls(identity, producer, deadline).await
    }

    async fn controls_performer_of_application(
        &self,
        identity: &Identity,
        application_id: ApplicationId,
        deadline: Deadline,
    ) -> ocall_core::Result<bool> {
        let performer = self
            .directory
            .performer_of_application(application_id, deadline)
            .await?;
        self.directory.controls(identity, performer, deadline).await
    }

    async fn controls_application_party(
        &self,
        identity: &Identity,
        application_id: ApplicationId,
        deadline: Deadline,
    ) -> ocall_core::Result<bool> {
        if self
            .controls_performer_of_application(identity, application_id, deadline)
            .await?
        {
            return Ok(true);
        }
        let producer = self
            .directory
            .producer_of_application(application_id, deadline)
            .await?;
        self.directory.controls(identity, producer, deadline).await
    }
}
