//! Entity store: authors, groups, posts, comments and follow edges.
//!
//! `PgBlogStore` is the production implementation; `MemoryBlogStore` keeps
//! the same integrity rules in process for tests and database-less runs.

mod memory_repository;
mod postgres_repository;

pub use memory_repository::MemoryBlogStore;
pub use postgres_repository::PgBlogStore;

use crate::domain::{
    Author, Comment, CommentView, Group, NewAuthor, NewComment, NewGroup, NewPost, Post,
    PostChanges, PostView,
};
use crate::error::Result;
use uuid::Uuid;

/// Persistence contract shared by every store implementation.
///
/// All post and comment listings are newest-first. Feed listings return
/// posts already joined with author and group.
#[async_trait::async_trait]
pub trait BlogStore: Send + Sync {
    // ---- authors --------------------------------------------------------

    /// Fails with `Conflict` when the username is taken.
    async fn create_author(&self, new: NewAuthor) -> Result<Author>;

    /// Fails with `NotFound` when absent.
    async fn get_author(&self, author_id: Uuid) -> Result<Author>;

    async fn find_author_by_username(&self, username: &str) -> Result<Option<Author>>;

    /// Removes the author with their posts, comments and follow edges.
    async fn delete_author(&self, author_id: Uuid) -> Result<bool>;

    // ---- groups ---------------------------------------------------------

    /// Fails with `Conflict` when the slug is taken.
    async fn create_group(&self, new: NewGroup) -> Result<Group>;

    async fn get_group(&self, group_id: Uuid) -> Result<Option<Group>>;

    async fn find_group_by_slug(&self, slug: &str) -> Result<Option<Group>>;

    /// Ordered by title.
    async fn list_groups(&self) -> Result<Vec<Group>>;

    /// Posts of the group survive with their group cleared.
    async fn delete_group(&self, group_id: Uuid) -> Result<bool>;

    // ---- posts ----------------------------------------------------------

    /// Stamps the creation time. Fails with `Validation` on blank text or an
    /// unknown group.
    async fn create_post(&self, new: NewPost) -> Result<Post>;

    /// Fails with `NotFound` when absent.
    async fn get_post(&self, post_id: Uuid) -> Result<Post>;

    /// Fails with `NotFound` when absent.
    async fn get_post_view(&self, post_id: Uuid) -> Result<PostView>;

    /// Re-reads the row and checks ownership in the same unit of work.
    /// Fails with `NotFound`, `Authorization(NotOwner)` or `Validation`.
    /// Creation time and owner never change.
    async fn update_post(&self, post_id: Uuid, editor_id: Uuid, changes: PostChanges)
        -> Result<Post>;

    /// Cascades to the post's comments.
    async fn delete_post(&self, post_id: Uuid) -> Result<bool>;

    async fn list_all_posts(&self) -> Result<Vec<PostView>>;

    async fn list_posts_by_group(&self, group_id: Uuid) -> Result<Vec<PostView>>;

    async fn list_posts_by_author(&self, author_id: Uuid) -> Result<Vec<PostView>>;

    /// Posts by every author `follower_id` follows.
    async fn list_posts_by_followed(&self, follower_id: Uuid) -> Result<Vec<PostView>>;

    async fn count_posts_by_author(&self, author_id: Uuid) -> Result<i64>;

    // ---- comments -------------------------------------------------------

    /// Fails with `NotFound` when the post is absent and `Validation` on
    /// blank text.
    async fn create_comment(&self, new: NewComment) -> Result<Comment>;

    async fn list_comments(&self, post_id: Uuid) -> Result<Vec<CommentView>>;

    // ---- follows --------------------------------------------------------

    /// Returns true if a new edge was inserted, false if it already existed.
    /// Fails with `Validation` on a self-follow.
    async fn insert_follow(&self, follower_id: Uuid, author_id: Uuid) -> Result<bool>;

    /// Returns true if an edge was removed.
    async fn delete_follow(&self, follower_id: Uuid, author_id: Uuid) -> Result<bool>;

    async fn follow_exists(&self, follower_id: Uuid, author_id: Uuid) -> Result<bool>;

    async fn count_followers(&self, author_id: Uuid) -> Result<i64>;

    async fn count_following(&self, follower_id: Uuid) -> Result<i64>;

    /// Health check (optional)
    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}
