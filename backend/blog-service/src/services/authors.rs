use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::cache::FeedCache;
use crate::domain::forms::SignupForm;
use crate::domain::Author;
use crate::error::{AppError, Result};
use crate::repository::BlogStore;

/// Author accounts: registration, lookup and removal.
#[derive(Clone)]
pub struct AuthorService {
    store: Arc<dyn BlogStore>,
    cache: Arc<FeedCache>,
}

impl AuthorService {
    pub fn new(store: Arc<dyn BlogStore>, cache: Arc<FeedCache>) -> Self {
        Self { store, cache }
    }

    /// Register a new author. A taken username is a `Conflict`.
    pub async fn signup(&self, form: &SignupForm) -> Result<Author> {
        let new_author = form.clean()?;
        let author = self.store.create_author(new_author).await?;
        info!(author_id = %author.id, username = %author.username, "Author signed up");
        Ok(author)
    }

    pub async fn get(&self, author_id: Uuid) -> Result<Author> {
        self.store.get_author(author_id).await
    }

    pub async fn get_by_username(&self, username: &str) -> Result<Author> {
        self.store
            .find_author_by_username(username)
            .await?
            .ok_or_else(|| AppError::not_found(format!("author '{}'", username)))
    }

    /// Remove an author with everything they wrote. Their posts may sit in
    /// any cached feed, so the whole cache goes.
    pub async fn delete_author(&self, author_id: Uuid) -> Result<bool> {
        let deleted = self.store.delete_author(author_id).await?;
        if deleted {
            self.cache.clear();
            info!(%author_id, "Author deleted");
        }
        Ok(deleted)
    }
}
