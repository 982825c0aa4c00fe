//! In-memory persistence collaborators.
//!
//! Both stores are cheap `Clone` handles over shared state, so a test can
//! keep one handle for assertions while the services own another.

mod agenda;
mod profile;

pub use agenda::InMemoryAgendaStore;
pub use profile::InMemoryProfileStore;

use ocall_core::{DomainError, Result};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

/// Fault injection shared by every call on a store.
#[derive(Debug, Clone, Default)]
pub struct Faults {
    latency_ms: Arc<AtomicU64>,
    unavailable: Arc<AtomicBool>,
}

impl Faults {
    /// Delay every subsequent call by `latency`.
    pub fn set_latency(&self, latency: Duration) {
        let ms = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX);
        self.latency_ms.store(ms, Ordering::SeqCst);
    }

    /// Make every subsequent call fail with a storage error.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Apply the configured latency, then fail if the store is down.
    pub(crate) async fn enter(&self) -> Result<()> {
        let ms = self.latency_ms.load(Ordering::SeqCst);
        if ms > 0 {
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(DomainError::Storage("store unavailable".to_string()));
        }
        Ok(())
    }
}

pub(crate) fn poisoned<T>(_: T) -> DomainError {
    DomainError::Storage("store lock poisoned".to_string())
}
