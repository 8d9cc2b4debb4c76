/// Post service - handles post creation, editing, details and comments
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::cache::FeedCache;
use crate::domain::forms::{CommentForm, EditPostForm, PostForm, INVALID_CHOICE};
use crate::domain::{Author, Comment, CommentView, Post, PostView};
use crate::error::{AppError, AuthorizationError, Result};
use crate::metrics::POSTS_CREATED_TOTAL;
use crate::repository::BlogStore;

/// Everything the post page shows.
#[derive(Debug, Clone, Serialize)]
pub struct PostDetail {
    pub post: PostView,
    pub title: String,
    pub comments: Vec<CommentView>,
    pub author_posts_count: i64,
}

#[derive(Clone)]
pub struct PostService {
    store: Arc<dyn BlogStore>,
    cache: Arc<FeedCache>,
}

impl PostService {
    pub fn new(store: Arc<dyn BlogStore>, cache: Arc<FeedCache>) -> Self {
        Self { store, cache }
    }

    /// Slug of the chosen group; an unknown id is a form error on `group`.
    async fn chosen_group_slug(&self, group_id: Option<Uuid>) -> Result<Option<String>> {
        let Some(group_id) = group_id else {
            return Ok(None);
        };
        match self.store.get_group(group_id).await? {
            Some(group) => Ok(Some(group.slug)),
            None => Err(AppError::validation("group", INVALID_CHOICE)),
        }
    }

    async fn existing_group_slug(&self, group_id: Option<Uuid>) -> Result<Option<String>> {
        match group_id {
            Some(id) => Ok(self.store.get_group(id).await?.map(|g| g.slug)),
            None => Ok(None),
        }
    }

    /// Create a new post owned by `author`
    pub async fn create_post(&self, author: &Author, form: &PostForm) -> Result<Post> {
        let new_post = form.clean(author.id)?;
        let group_slug = self.chosen_group_slug(new_post.group_id).await?;

        let post = self.store.create_post(new_post).await?;

        self.cache.invalidate_post(&author.username, group_slug);
        POSTS_CREATED_TOTAL.inc();
        info!(
            post_id = %post.id,
            author = %author.username,
            title = %post.title(),
            "Post created"
        );

        Ok(post)
    }

    /// Edit a post. Only its author may do so; creation time and owner are
    /// never touched.
    pub async fn update_post(
        &self,
        editor: &Author,
        post_id: Uuid,
        form: &EditPostForm,
    ) -> Result<Post> {
        let changes = form.clean()?;

        let current = self.store.get_post(post_id).await?;
        if current.author_id != editor.id {
            return Err(AuthorizationError::NotOwner.into());
        }

        let new_slug = match changes.group_id {
            Some(group_id) => self.chosen_group_slug(group_id).await?,
            None => None,
        };
        let old_slug = self.existing_group_slug(current.group_id).await?;

        // The store re-reads the row and re-checks ownership atomically.
        let updated = self.store.update_post(post_id, editor.id, changes).await?;

        self.cache
            .invalidate_post(&editor.username, old_slug.into_iter().chain(new_slug));
        info!(post_id = %post_id, author = %editor.username, "Post updated");

        Ok(updated)
    }

    pub async fn get_post(&self, post_id: Uuid) -> Result<Post> {
        self.store.get_post(post_id).await
    }

    /// Post with its comments (newest first) and the author's post count.
    pub async fn post_detail(&self, post_id: Uuid) -> Result<PostDetail> {
        let post = self.store.get_post_view(post_id).await?;
        let comments = self.store.list_comments(post_id).await?;
        let author_posts_count = self.store.count_posts_by_author(post.author.id).await?;

        Ok(PostDetail {
            title: crate::domain::models::short_title(&post.text),
            post,
            comments,
            author_posts_count,
        })
    }

    /// Add a comment by `author` to an existing post
    pub async fn add_comment(
        &self,
        author: &Author,
        post_id: Uuid,
        form: &CommentForm,
    ) -> Result<Comment> {
        let new_comment = form.clean(post_id, author.id)?;
        let comment = self.store.create_comment(new_comment).await?;

        debug!(
            comment_id = %comment.id,
            %post_id,
            author = %author.username,
            "Comment added"
        );
        Ok(comment)
    }

    pub async fn list_comments(&self, post_id: Uuid) -> Result<Vec<CommentView>> {
        self.store.list_comments(post_id).await
    }

    /// Administrative removal; comments go with the post.
    pub async fn delete_post(&self, post_id: Uuid) -> Result<bool> {
        let post = match self.store.get_post_view(post_id).await {
            Ok(post) => post,
            Err(AppError::NotFound(_)) => return Ok(false),
            Err(e) => return Err(e),
        };

        let deleted = self.store.delete_post(post_id).await?;
        if deleted {
            self.cache.invalidate_post(
                &post.author.username,
                post.group.map(|g| g.slug),
            );
            info!(%post_id, "Post deleted");
        }
        Ok(deleted)
    }
}
