//! Authentication and authorization configuration.
//!
//! Values come from the application or the environment:
//!
//! | Variable                  | Meaning                                         |
//! |---------------------------|-------------------------------------------------|
//! | `OCALL_SUPERUSER`         | Service credential user                         |
//! | `OCALL_SUPERPW`           | Service credential password                     |
//! | `OCALL_LOOKUP_TIMEOUT_MS` | Budget for the lookups behind one authorization |
//! | `OCALL_DEV_IDENTITY`      | Identity used when no verifier is configured    |
//!
//! Without both service variables the service credential mode is disabled.

use crate::error::{AuthError, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use ocall_core::Identity;
use std::fmt;
use std::time::Duration;

/// Default lookup budget per authorization decision.
pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_millis(2_000);

/// Auth configuration.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthConfig {
    service_user: Option<String>,
    service_password: Option<String>,
    /// Upper bound on the directory lookups behind one decision.
    pub lookup_timeout: Duration,
    /// Identity injected when no verifier is configured. Development only.
    pub dev_identity: Option<Identity>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            service_user: None,
            service_password: None,
            lookup_timeout: DEFAULT_LOOKUP_TIMEOUT,
            dev_identity: None,
        }
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("service_user", &self.service_user)
            .field("service_password", &self.service_password.as_ref().map(|_| "<redacted>"))
            .field("lookup_timeout", &self.lookup_timeout)
            .field("dev_identity", &self.dev_identity)
            .finish()
    }
}

impl AuthConfig {
    /// Create a configuration with defaults: no service credential, no dev identity.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable the service credential.
    #[must_use]
    pub fn with_service_credential(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.service_user = Some(user.into());
        self.service_password = Some(password.into());
        self
    }

    /// Set the lookup budget per decision.
    #[must_use]
    pub const fn with_lookup_timeout(mut self, timeout: Duration) -> Self {
        self.lookup_timeout = timeout;
        self
    }

    /// Set the development identity.
    #[must_use]
    pub fn with_dev_identity(mut self, identity: Identity) -> Self {
        self.dev_identity = Some(identity);
        self
    }

    /// Load from the process environment.
    ///
    /// # Errors
    ///
    /// See [`Self::from_lookup`].
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Configuration`] if only one of user and password
    /// is set, either is empty, or the timeout is not a positive integer.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        match (lookup("OCALL_SUPERUSER"), lookup("OCALL_SUPERPW")) {
            (None, None) => {}
            (Some(user), Some(password)) => {
                if user.is_empty() || password.is_empty() {
                    return Err(AuthError::Configuration(
                        "OCALL_SUPERUSER and OCALL_SUPERPW must not be empty".to_string(),
                    ));
                }
                config = config.with_service_credential(user, password);
            }
            _ => {
                return Err(AuthError::Configuration(
                    "OCALL_SUPERUSER and OCALL_SUPERPW must be set together".to_string(),
                ));
            }
        }

        if let Some(raw) = lookup("OCALL_LOOKUP_TIMEOUT_MS") {
            let ms: u64 = raw.trim().parse().map_err(|e| {
                AuthError::Configuration(format!("OCALL_LOOKUP_TIMEOUT_MS: {e}"))
            })?;
            if ms == 0 {
                return Err(AuthError::Configuration(
                    "OCALL_LOOKUP_TIMEOUT_MS must be > 0".to_string(),
                ));
            }
            config.lookup_timeout = Duration::from_millis(ms);
        }

        if let Some(raw) = lookup("OCALL_DEV_IDENTITY") {
            let identity = raw.parse::<Identity>().map_err(|e| {
                AuthError::Configuration(format!("OCALL_DEV_IDENTITY: {e}"))
            })?;
            tracing::warn!(identity = %identity, "Development identity enabled");
            config.dev_identity = Some(identity);
        }

        Ok(config)
    }

    /// Whether the service credential mode is enabled.
    #[must_use]
    pub const fn service_credential_enabled(&self) -> bool {
        self.service_user.is_some() && self.service_password.is_some()
    }

    /// The base64 `user:password` a service caller must present, if enabled.
    #[must_use]
    pub fn encoded_service_credential(&self) -> Option<String> {
        match (&self.service_user, &self.service_password) {
            (Some(user), Some(password)) => Some(STANDARD.encode(format!("{user}:{password}"))),
            _ => None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_gives_defaults() {
        let config = AuthConfig::from_lookup(lookup(&[])).unwrap();
        assert!(!config.service_credential_enabled());
        assert_eq!(config.lookup_timeout, DEFAULT_LOOKUP_TIMEOUT);
        assert!(config.dev_identity.is_none());
    }

    #[test]
    fn service_credential_is_base64_user_colon_password() {
        let config = AuthConfig::from_lookup(lookup(&[
            ("OCALL_SUPERUSER", "admin"),
            ("OCALL_SUPERPW", "hunter2"),
        ]))
        .unwrap();
        assert_eq!(config.encoded_service_credential().unwrap(), "YWRtaW46aHVudGVyMg==");
    }

    #[test]
    fn half_a_credential_is_rejected() {
        let err = AuthConfig::from_lookup(lookup(&[("OCALL_SUPERUSER", "admin")])).unwrap_err();
        assert!(matches!(err, AuthError::Configuration(_)));
    }

    #[test]
    fn timeout_and_dev_identity_are_parsed() {
        let config = AuthConfig::from_lookup(lookup(&[
            ("OCALL_LOOKUP_TIMEOUT_MS", "250"),
            ("OCALL_DEV_IDENTITY", "test"),
        ]))
        .unwrap();
        assert_eq!(config.lookup_timeout, Duration::from_millis(250));
        assert_eq!(config.dev_identity, Some(Identity::new("test")));

        assert!(AuthConfig::from_lookup(lookup(&[("OCALL_LOOKUP_TIMEOUT_MS", "0")])).is_err());
        assert!(AuthConfig::from_lookup(lookup(&[("OCALL_LOOKUP_TIMEOUT_MS", "soon")])).is_err());
    }

    #[test]
    fn debug_redacts_the_password() {
        let config = AuthConfig::new().with_service_credential("admin", "hunter2");
        let debug = format!("{config:?}");
        assert!(debug.contains("admin"));
        assert!(!debug.contains("hunter2"));
    }
}
