//! Fixtures shared by the unit tests.

use std::sync::Arc;

use crate::domain::{Author, Group, NewAuthor, NewGroup};
use crate::repository::{BlogStore, MemoryBlogStore};

pub fn memory_store() -> Arc<dyn BlogStore> {
    Arc::new(MemoryBlogStore::new())
}

pub async fn author(store: &Arc<dyn BlogStore>, username: &str) -> Author {
    store
        .create_author(NewAuthor {
            username: username.to_string(),
            first_name: String::new(),
            last_name: String::new(),
            email: String::new(),
        })
        .await
        .expect("create author")
}

pub async fn group(store: &Arc<dyn BlogStore>, slug: &str) -> Group {
    store
        .create_group(NewGroup {
            title: format!("Group {}", slug),
            slug: slug.to_string(),
            description: "Test group".to_string(),
        })
        .await
        .expect("create group")
}
