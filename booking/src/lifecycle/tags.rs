use super::AgendaService;
use ocall_core::store::{AgendaStore, ProfileStore};
use ocall_core::{Deadline, Result, Tag, TagId};

impl<A: AgendaStore, P: ProfileStore> AgendaService<A, P> {
    /// Register a tag.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a blank or taken name.
    #[tracing::instrument(skip(self))]
    pub async fn create_tag(&self, name: &str, deadline: Deadline) -> Result<Tag> {
        let tag = Tag::new(name)?;
        deadline.run(self.agenda.insert_tag(&tag)).await?;
        tracing::info!(tag_id = %tag.id, name = %tag.name, "Tag registered");
        Ok(tag)
    }

    /// Unregister a tag. Events and acts already carrying it keep the name.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if absent.
    #[tracing::instrument(skip(self))]
    pub async fn delete_tag(&self, id: TagId, deadline: Deadline) -> Result<()> {
        deadline.run(self.agenda.delete_tag(id)).await
    }

    /// Every registered tag, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns error if the store fails.
    pub async fn list_tags(&self, deadline: Deadline) -> Result<Vec<Tag>> {
        deadline.run(self.agenda.list_tags()).await
    }
}
