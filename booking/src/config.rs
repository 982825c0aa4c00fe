//! Search configuration.

use ocall_core::ValidationError;
use serde::{Deserialize, Serialize};

/// Default number of events pulled from storage per page.
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Tuning for [`EventSearch`](crate::search::EventSearch).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Events fetched per round trip to the store.
    pub page_size: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl SearchConfig {
    /// Create a configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the page size.
    #[must_use]
    pub const fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] on `page_size` if it is zero.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.page_size == 0 {
            return Err(ValidationError::new("page_size", "page_size must be > 0"));
        }
        Ok(())
    }
}
