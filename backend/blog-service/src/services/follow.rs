use std::sync::Arc;
use tracing::info;

use crate::domain::{Author, Identity};
use crate::error::{AppError, Result};
use crate::metrics::FOLLOW_CHANGES_TOTAL;
use crate::repository::BlogStore;

/// Creates and removes follow edges between authors.
#[derive(Clone)]
pub struct FollowService {
    store: Arc<dyn BlogStore>,
}

impl FollowService {
    pub fn new(store: Arc<dyn BlogStore>) -> Self {
        Self { store }
    }

    /// Idempotent follow. Self-follow is a validation error; the pair
    /// uniqueness is left to the store so concurrent calls cannot race.
    pub async fn follow(&self, follower: &Author, target: &Author) -> Result<()> {
        if follower.id == target.id {
            return Err(AppError::validation("author", "You cannot follow yourself."));
        }

        let inserted = self.store.insert_follow(follower.id, target.id).await?;
        if inserted {
            FOLLOW_CHANGES_TOTAL.with_label_values(&["follow"]).inc();
            info!(
                follower = %follower.username,
                author = %target.username,
                "Follow created"
            );
        }
        Ok(())
    }

    /// Idempotent unfollow; a missing edge is not an error.
    pub async fn unfollow(&self, follower: &Author, target: &Author) -> Result<()> {
        let removed = self.store.delete_follow(follower.id, target.id).await?;
        if removed {
            FOLLOW_CHANGES_TOTAL.with_label_values(&["unfollow"]).inc();
            info!(
                follower = %follower.username,
                author = %target.username,
                "Follow removed"
            );
        }
        Ok(())
    }

    /// Anonymous viewers follow nobody.
    pub async fn is_following(&self, viewer: &Identity, target: &Author) -> Result<bool> {
        match viewer {
            Identity::Anonymous => Ok(false),
            Identity::Authenticated(follower) => {
                self.store.follow_exists(follower.id, target.id).await
            }
        }
    }

    pub async fn followers_count(&self, author: &Author) -> Result<i64> {
        self.store.count_followers(author.id).await
    }

    pub async fn following_count(&self, author: &Author) -> Result<i64> {
        self.store.count_following(author.id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{author, memory_store};

    async fn setup() -> (FollowService, Author, Author) {
        let store = memory_store();
        let leo = author(&store, "leo").await;
        let anna = author(&store, "anna").await;
        (FollowService::new(store), leo, anna)
    }

    #[tokio::test]
    async fn follow_is_idempotent() {
        let (service, leo, anna) = setup().await;
        let viewer = Identity::from(leo.clone());

        service.follow(&leo, &anna).await.unwrap();
        assert!(service.is_following(&viewer, &anna).await.unwrap());

        service.follow(&leo, &anna).await.unwrap();
        assert_eq!(service.followers_count(&anna).await.unwrap(), 1);
        assert_eq!(service.following_count(&leo).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn self_follow_is_rejected() {
        let (service, leo, _) = setup().await;
        let err = service.follow(&leo, &leo).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(service.following_count(&leo).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn unfollow_without_edge_is_fine() {
        let (service, leo, anna) = setup().await;
        service.unfollow(&leo, &anna).await.unwrap();
        assert!(!service
            .is_following(&Identity::from(leo.clone()), &anna)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn unfollow_removes_edge() {
        let (service, leo, anna) = setup().await;
        service.follow(&leo, &anna).await.unwrap();
        service.unfollow(&leo, &anna).await.unwrap();
        assert!(!service
            .is_following(&Identity::from(leo.clone()), &anna)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn anonymous_follows_nobody() {
        let (service, leo, anna) = setup().await;
        service.follow(&leo, &anna).await.unwrap();
        assert!(!service
            .is_following(&Identity::Anonymous, &anna)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn follow_is_directed() {
        let (service, leo, anna) = setup().await;
        service.follow(&leo, &anna).await.unwrap();
        assert!(!service
            .is_following(&Identity::from(anna.clone()), &leo)
            .await
            .unwrap());
    }
}
