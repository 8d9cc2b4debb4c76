use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::cache::FeedCache;
use crate::domain::forms::GroupForm;
use crate::domain::Group;
use crate::error::{AppError, Result};
use crate::repository::BlogStore;

/// Administrative management of thematic groups.
#[derive(Clone)]
pub struct GroupService {
    store: Arc<dyn BlogStore>,
    cache: Arc<FeedCache>,
}

impl GroupService {
    pub fn new(store: Arc<dyn BlogStore>, cache: Arc<FeedCache>) -> Self {
        Self { store, cache }
    }

    /// A taken slug is a `Conflict`.
    pub async fn create(&self, form: &GroupForm) -> Result<Group> {
        let new_group = form.clean()?;
        let group = self.store.create_group(new_group).await?;
        info!(group_id = %group.id, slug = %group.slug, "Group created");
        Ok(group)
    }

    pub async fn get_by_slug(&self, slug: &str) -> Result<Group> {
        self.store
            .find_group_by_slug(slug)
            .await?
            .ok_or_else(|| AppError::not_found(format!("group '{}'", slug)))
    }

    /// Ordered by title.
    pub async fn list(&self) -> Result<Vec<Group>> {
        self.store.list_groups().await
    }

    /// Posts in the group stay, with no group. Every cached feed that showed
    /// them carries stale group data, so the cache is cleared.
    pub async fn delete(&self, group_id: Uuid) -> Result<bool> {
        let deleted = self.store.delete_group(group_id).await?;
        if deleted {
            self.cache.clear();
            info!(%group_id, "Group deleted");
        }
        Ok(deleted)
    }
}
