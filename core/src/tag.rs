//! Registered tags.
//!
//! Events and acts reference tags by name. A tag must be registered before
//! anything can use it.

use crate::error::ValidationError;
use crate::ids::TagId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A registered tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tag {
    /// Tag ID.
    pub id: TagId,
    /// Unique, trimmed, non-empty name.
    pub name: String,
}

impl Tag {
    /// Create a tag with a fresh ID.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] if the name is blank.
    pub fn new(name: &str) -> Result<Self, ValidationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::required("name"));
        }
        Ok(Self {
            id: TagId::new(),
            name: name.to_string(),
        })
    }
}

/// Normalise a list of tag names into a set.
///
/// Names are trimmed and deduplicated. At least one name is required.
///
/// # Errors
///
/// Returns [`ValidationError`] on `tags` if the list is empty or any name is blank.
///
/// # Examples
///
/// ```
/// use ocall_core::tag::normalize_tag_names;
///
/// let tags = normalize_tag_names(&["jazz", " jazz ", "blues"]).unwrap();
/// assert_eq!(tags.len(), 2);
/// assert!(normalize_tag_names::<&str>(&[]).is_err());
/// ```
pub fn normalize_tag_names<S: AsRef<str>>(names: &[S]) -> Result<BTreeSet<String>, ValidationError> {
    let mut tags = BTreeSet::new();
    for name in names {
        let trimmed = name.as_ref().trim();
        if trimmed.is_empty() {
            return Err(ValidationError::new("tags", "tag names must not be empty"));
        }
        tags.insert(trimmed.to_string());
    }
    if tags.is_empty() {
        return Err(ValidationError::new("tags", "at least one tag is required"));
    }
    Ok(tags)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn tag_name_is_trimmed() {
        assert_eq!(Tag::new("  jazz ").unwrap().name, "jazz");
        assert_eq!(Tag::new("").unwrap_err().field, "name");
    }

    #[test]
    fn blank_entries_are_rejected() {
        let err = normalize_tag_names(&["jazz", " "]).unwrap_err();
        assert_eq!(err.field, "tags");
    }
}
