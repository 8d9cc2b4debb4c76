/// Feed service - global, group, profile and followed feeds
///
/// Global, group and profile feeds are read through the feed cache. The
/// followed feed depends on the viewer and always comes from the store.
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

use crate::cache::{FeedCache, FeedKey};
use crate::domain::{Author, Group, Identity, PostView};
use crate::error::{AppError, Result};
use crate::repository::BlogStore;
use crate::services::FollowService;

/// Everything the profile page shows besides the paged posts.
#[derive(Debug, Clone)]
pub struct ProfileFeed {
    pub author: Author,
    pub posts: Arc<Vec<PostView>>,
    pub following: bool,
    pub followers_count: i64,
    pub following_count: i64,
}

impl ProfileFeed {
    pub fn posts_count(&self) -> usize {
        self.posts.len()
    }
}

/// Profile header rendered next to the paged posts.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileSummary {
    pub author: Author,
    pub full_name: String,
    pub following: bool,
    pub followers_count: i64,
    pub following_count: i64,
    pub posts_count: usize,
}

impl From<&ProfileFeed> for ProfileSummary {
    fn from(feed: &ProfileFeed) -> Self {
        Self {
            full_name: feed.author.full_name(),
            author: feed.author.clone(),
            following: feed.following,
            followers_count: feed.followers_count,
            following_count: feed.following_count,
            posts_count: feed.posts_count(),
        }
    }
}

#[derive(Clone)]
pub struct FeedService {
    store: Arc<dyn BlogStore>,
    cache: Arc<FeedCache>,
    follows: FollowService,
}

impl FeedService {
    pub fn new(store: Arc<dyn BlogStore>, cache: Arc<FeedCache>, follows: FollowService) -> Self {
        Self {
            store,
            cache,
            follows,
        }
    }

    /// All posts, newest first
    pub async fn global_feed(&self) -> Result<Arc<Vec<PostView>>> {
        let key = FeedKey::Global;
        if let Some(posts) = self.cache.get(&key) {
            return Ok(posts);
        }

        let generation = self.cache.generation();
        let posts = self.store.list_all_posts().await?;
        debug!(count = posts.len(), "Loaded global feed from store");
        Ok(self.cache.put(key, generation, posts))
    }

    /// Posts of the group identified by `slug`
    pub async fn group_feed(&self, slug: &str) -> Result<(Group, Arc<Vec<PostView>>)> {
        let group = self
            .store
            .find_group_by_slug(slug)
            .await?
            .ok_or_else(|| AppError::not_found(format!("group '{}'", slug)))?;

        let key = FeedKey::Group(group.slug.clone());
        if let Some(posts) = self.cache.get(&key) {
            return Ok((group, posts));
        }

        let generation = self.cache.generation();
        let posts = self.store.list_posts_by_group(group.id).await?;
        debug!(group = %group.slug, count = posts.len(), "Loaded group feed from store");
        let posts = self.cache.put(key, generation, posts);
        Ok((group, posts))
    }

    /// Posts by `username` with follow state as seen by `viewer`
    pub async fn profile_feed(&self, viewer: &Identity, username: &str) -> Result<ProfileFeed> {
        let author = self
            .store
            .find_author_by_username(username)
            .await?
            .ok_or_else(|| AppError::not_found(format!("author '{}'", username)))?;

        let key = FeedKey::Profile(author.username.clone());
        let posts = match self.cache.get(&key) {
            Some(posts) => posts,
            None => {
                let generation = self.cache.generation();
                let posts = self.store.list_posts_by_author(author.id).await?;
                self.cache.put(key, generation, posts)
            }
        };

        let following = self.follows.is_following(viewer, &author).await?;
        let followers_count = self.follows.followers_count(&author).await?;
        let following_count = self.follows.following_count(&author).await?;

        Ok(ProfileFeed {
            author,
            posts,
            following,
            followers_count,
            following_count,
        })
    }

    /// Posts by every author the viewer follows. Anonymous viewers are rejected.
    pub async fn followed_feed(&self, viewer: &Identity) -> Result<Vec<PostView>> {
        let follower = viewer.require_author()?;
        self.store.list_posts_by_followed(follower.id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::forms::PostForm;
    use crate::error::AuthorizationError;
    use crate::services::PostService;
    use crate::test_support::{author, group, memory_store};
    use std::time::Duration;

    struct Fixture {
        store: Arc<dyn BlogStore>,
        feeds: FeedService,
        posts: PostService,
        follows: FollowService,
    }

    fn fixture() -> Fixture {
        let store = memory_store();
        let cache = Arc::new(FeedCache::new(Duration::from_secs(300), true));
        let follows = FollowService::new(store.clone());
        Fixture {
            feeds: FeedService::new(store.clone(), cache.clone(), follows.clone()),
            posts: PostService::new(store.clone(), cache),
            follows,
            store,
        }
    }

    fn text(text: &str) -> PostForm {
        PostForm {
            text: text.to_string(),
            ..Default::default()
        }
    }

    fn texts(posts: &[PostView]) -> Vec<&str> {
        posts.iter().map(|p| p.text.as_str()).collect()
    }

    #[tokio::test]
    async fn global_feed_sees_new_posts_despite_cache() {
        let fx = fixture();
        let leo = author(&fx.store, "leo").await;

        fx.posts.create_post(&leo, &text("one")).await.unwrap();
        assert_eq!(texts(&fx.feeds.global_feed().await.unwrap()), vec!["one"]);

        fx.posts.create_post(&leo, &text("two")).await.unwrap();
        assert_eq!(
            texts(&fx.feeds.global_feed().await.unwrap()),
            vec!["two", "one"]
        );
    }

    #[tokio::test]
    async fn group_feed_reflects_moves_between_groups() {
        let fx = fixture();
        let leo = author(&fx.store, "leo").await;
        let cats = group(&fx.store, "cats").await;
        let dogs = group(&fx.store, "dogs").await;

        let post = fx
            .posts
            .create_post(
                &leo,
                &PostForm {
                    text: "whiskers".to_string(),
                    group_id: Some(cats.id),
                    image: None,
                },
            )
            .await
            .unwrap();

        let (_, in_cats) = fx.feeds.group_feed("cats").await.unwrap();
        assert_eq!(in_cats.len(), 1);
        let (_, in_dogs) = fx.feeds.group_feed("dogs").await.unwrap();
        assert!(in_dogs.is_empty());

        fx.posts
            .update_post(
                &leo,
                post.id,
                &crate::domain::forms::EditPostForm {
                    group_id: Some(Some(dogs.id)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let (_, in_cats) = fx.feeds.group_feed("cats").await.unwrap();
        assert!(in_cats.is_empty());
        let (group, in_dogs) = fx.feeds.group_feed("dogs").await.unwrap();
        assert_eq!(group.slug, "dogs");
        assert_eq!(texts(&in_dogs), vec!["whiskers"]);
    }

    #[tokio::test]
    async fn unknown_group_and_profile_are_not_found() {
        let fx = fixture();
        assert!(fx.feeds.group_feed("nope").await.unwrap_err().is_not_found());
        assert!(fx
            .feeds
            .profile_feed(&Identity::Anonymous, "nobody")
            .await
            .unwrap_err()
            .is_not_found());
    }

    #[tokio::test]
    async fn profile_feed_shows_follow_state() {
        let fx = fixture();
        let leo = author(&fx.store, "leo").await;
        let anna = author(&fx.store, "anna").await;
        fx.posts.create_post(&anna, &text("by anna")).await.unwrap();

        let viewer = Identity::from(leo.clone());
        let profile = fx.feeds.profile_feed(&viewer, "anna").await.unwrap();
        assert!(!profile.following);
        assert_eq!(profile.posts_count(), 1);

        fx.follows.follow(&leo, &anna).await.unwrap();
        let profile = fx.feeds.profile_feed(&viewer, "anna").await.unwrap();
        assert!(profile.following);
        assert_eq!(profile.followers_count, 1);
        assert_eq!(profile.following_count, 0);

        let anonymous = fx
            .feeds
            .profile_feed(&Identity::Anonymous, "anna")
            .await
            .unwrap();
        assert!(!anonymous.following);
    }

    #[tokio::test]
    async fn followed_feed_tracks_follow_changes() {
        let fx = fixture();
        let leo = author(&fx.store, "leo").await;
        let anna = author(&fx.store, "anna").await;
        let viewer = Identity::from(leo.clone());

        fx.follows.follow(&leo, &anna).await.unwrap();
        assert!(fx.feeds.followed_feed(&viewer).await.unwrap().is_empty());

        let post = fx.posts.create_post(&anna, &text("hello")).await.unwrap();
        let feed = fx.feeds.followed_feed(&viewer).await.unwrap();
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].id, post.id);

        fx.follows.unfollow(&leo, &anna).await.unwrap();
        assert!(fx.feeds.followed_feed(&viewer).await.unwrap().is_empty());

        fx.posts.create_post(&anna, &text("after")).await.unwrap();
        assert!(fx.feeds.followed_feed(&viewer).await.unwrap().is_empty());
        assert_eq!(texts(&fx.feeds.global_feed().await.unwrap())[0], "after");
    }

    #[tokio::test]
    async fn followed_feed_excludes_own_and_unfollowed_posts() {
        let fx = fixture();
        let leo = author(&fx.store, "leo").await;
        let anna = author(&fx.store, "anna").await;
        let max = author(&fx.store, "max").await;

        fx.follows.follow(&leo, &anna).await.unwrap();
        fx.posts.create_post(&leo, &text("mine")).await.unwrap();
        fx.posts.create_post(&max, &text("stranger")).await.unwrap();
        fx.posts.create_post(&anna, &text("first")).await.unwrap();
        fx.posts.create_post(&anna, &text("second")).await.unwrap();

        let feed = fx
            .feeds
            .followed_feed(&Identity::from(leo))
            .await
            .unwrap();
        assert_eq!(texts(&feed), vec!["second", "first"]);
    }

    #[tokio::test]
    async fn followed_feed_requires_identity() {
        let fx = fixture();
        let err = fx
            .feeds
            .followed_feed(&Identity::Anonymous)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::Authorization(AuthorizationError::Anonymous)
        ));
    }
}
