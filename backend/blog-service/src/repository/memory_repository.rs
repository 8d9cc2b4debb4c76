use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::BlogStore;
use crate::domain::forms::{ensure_text, INVALID_CHOICE};
use crate::domain::{
    Author, AuthorRef, Comment, CommentView, Follow, Group, GroupRef, NewAuthor, NewComment,
    NewGroup, NewPost, Post, PostChanges, PostView,
};
use crate::error::{AppError, AuthorizationError, Result};

/// Rows carry an insertion sequence so equal timestamps still order
/// deterministically (newest insert first).
#[derive(Debug, Clone)]
struct Row<T> {
    seq: u64,
    value: T,
}

#[derive(Default)]
struct State {
    seq: u64,
    authors: HashMap<Uuid, Author>,
    groups: HashMap<Uuid, Group>,
    posts: HashMap<Uuid, Row<Post>>,
    comments: HashMap<Uuid, Row<Comment>>,
    follows: HashMap<(Uuid, Uuid), Follow>,
}

impl State {
    fn next_seq(&mut self) -> u64 {
        self.seq += 1;
        self.seq
    }

    fn post_view(&self, post: &Post) -> Option<PostView> {
        let author = self.authors.get(&post.author_id)?;
        let group = post
            .group_id
            .and_then(|id| self.groups.get(&id))
            .map(GroupRef::from);

        Some(PostView {
            id: post.id,
            text: post.text.clone(),
            created_at: post.created_at,
            image: post.image.clone(),
            author: AuthorRef::from(author),
            group,
        })
    }

    fn post_views<F>(&self, filter: F) -> Vec<PostView>
    where
        F: Fn(&Post) -> bool,
    {
        let mut rows: Vec<&Row<Post>> = self.posts.values().filter(|r| filter(&r.value)).collect();
        rows.sort_by(|a, b| {
            b.value
                .created_at
                .cmp(&a.value.created_at)
                .then(b.seq.cmp(&a.seq))
        });
        rows.into_iter()
            .filter_map(|r| self.post_view(&r.value))
            .collect()
    }

    fn check_group(&self, group_id: Option<Uuid>) -> Result<()> {
        match group_id {
            Some(id) if !self.groups.contains_key(&id) => {
                Err(AppError::validation("group", INVALID_CHOICE))
            }
            _ => Ok(()),
        }
    }

    fn remove_posts_where<F>(&mut self, filter: F)
    where
        F: Fn(&Post) -> bool,
    {
        let removed: Vec<Uuid> = self
            .posts
            .values()
            .filter(|r| filter(&r.value))
            .map(|r| r.value.id)
            .collect();
        for post_id in &removed {
            self.posts.remove(post_id);
        }
        self.comments
            .retain(|_, c| !removed.contains(&c.value.post_id));
    }
}

/// In-process entity store with the same integrity rules as the schema:
/// unique usernames and slugs, one edge per follow pair, no self-follow,
/// cascading deletes and `SET NULL` on group removal. Every mutation runs
/// under a single write lock.
#[derive(Default)]
pub struct MemoryBlogStore {
    state: RwLock<State>,
}

impl MemoryBlogStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl BlogStore for MemoryBlogStore {
    async fn create_author(&self, new: NewAuthor) -> Result<Author> {
        let mut state = self.state.write().await;
        if state.authors.values().any(|a| a.username == new.username) {
            return Err(AppError::Conflict(
                "A user with that username already exists.".into(),
            ));
        }

        let author = Author {
            id: Uuid::new_v4(),
            username: new.username,
            first_name: new.first_name,
            last_name: new.last_name,
            email: new.email,
            date_joined: Utc::now(),
        };
        state.authors.insert(author.id, author.clone());
        Ok(author)
    }

    async fn get_author(&self, author_id: Uuid) -> Result<Author> {
        self.state
            .read()
            .await
            .authors
            .get(&author_id)
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("author {}", author_id)))
    }

    async fn find_author_by_username(&self, username: &str) -> Result<Option<Author>> {
        let state = self.state.read().await;
        Ok(state
            .authors
            .values()
            .find(|a| a.username == username)
            .cloned())
    }

    async fn delete_author(&self, author_id: Uuid) -> Result<bool> {
        let mut state = self.state.write().await;
        if state.authors.remove(&author_id).is_none() {
            return Ok(false);
        }

        state.remove_posts_where(|p| p.author_id == author_id);
        state.comments.retain(|_, c| c.value.author_id != author_id);
        state
            .follows
            .retain(|(follower, author), _| *follower != author_id && *author != author_id);
        Ok(true)
    }

    async fn create_group(&self, new: NewGroup) -> Result<Group> {
        let mut state = self.state.write().await;
        if state.groups.values().any(|g| g.slug == new.slug) {
            return Err(AppError::Conflict(
                "A group with that slug already exists.".into(),
            ));
        }

        let group = Group {
            id: Uuid::new_v4(),
            title: new.title,
            slug: new.slug,
            description: new.description,
        };
        state.groups.insert(group.id, group.clone());
        Ok(group)
    }

    async fn get_group(&self, group_id: Uuid) -> Result<Option<Group>> {
        Ok(self.state.read().await.groups.get(&group_id).cloned())
    }

    async fn find_group_by_slug(&self, slug: &str) -> Result<Option<Group>> {
        let state = self.state.read().await;
        Ok(state.groups.values().find(|g| g.slug == slug).cloned())
    }

    async fn list_groups(&self) -> Result<Vec<Group>> {
        let state = self.state.read().await;
        let mut groups: Vec<Group> = state.groups.values().cloned().collect();
        groups.sort_by(|a, b| a.title.cmp(&b.title).then_with(|| a.slug.cmp(&b.slug)));
        Ok(groups)
    }

    async fn delete_group(&self, group_id: Uuid) -> Result<bool> {
        let mut state = self.state.write().await;
        if state.groups.remove(&group_id).is_none() {
            return Ok(false);
        }

        for row in state.posts.values_mut() {
            if row.value.group_id == Some(group_id) {
                row.value.group_id = None;
            }
        }
        Ok(true)
    }

    async fn create_post(&self, new: NewPost) -> Result<Post> {
        ensure_text(&new.text)?;

        let mut state = self.state.write().await;
        if !state.authors.contains_key(&new.author_id) {
            return Err(AppError::not_found("author"));
        }
        state.check_group(new.group_id)?;

        let post = Post {
            id: Uuid::new_v4(),
            text: new.text,
            created_at: Utc::now(),
            author_id: new.author_id,
            group_id: new.group_id,
            image: new.image,
        };
        let seq = state.next_seq();
        state.posts.insert(
            post.id,
            Row {
                seq,
                value: post.clone(),
            },
        );
        Ok(post)
    }

    async fn get_post(&self, post_id: Uuid) -> Result<Post> {
        self.state
            .read()
            .await
            .posts
            .get(&post_id)
            .map(|r| r.value.clone())
            .ok_or_else(|| AppError::not_found(format!("post {}", post_id)))
    }

    async fn get_post_view(&self, post_id: Uuid) -> Result<PostView> {
        let state = self.state.read().await;
        state
            .posts
            .get(&post_id)
            .and_then(|r| state.post_view(&r.value))
            .ok_or_else(|| AppError::not_found(format!("post {}", post_id)))
    }

    async fn update_post(
        &self,
        post_id: Uuid,
        editor_id: Uuid,
        changes: PostChanges,
    ) -> Result<Post> {
        if let Some(text) = &changes.text {
            ensure_text(text)?;
        }

        let mut state = self.state.write().await;
        let current = state
            .posts
            .get(&post_id)
            .map(|r| r.value.clone())
            .ok_or_else(|| AppError::not_found(format!("post {}", post_id)))?;

        if current.author_id != editor_id {
            return Err(AuthorizationError::NotOwner.into());
        }
        if let Some(group_id) = changes.group_id {
            state.check_group(group_id)?;
        }

        let mut updated = current;
        changes.apply(&mut updated);
        if let Some(row) = state.posts.get_mut(&post_id) {
            row.value = updated.clone();
        }
        Ok(updated)
    }

    async fn delete_post(&self, post_id: Uuid) -> Result<bool> {
        let mut state = self.state.write().await;
        let existed = state.posts.contains_key(&post_id);
        state.remove_posts_where(|p| p.id == post_id);
        Ok(existed)
    }

    async fn list_all_posts(&self) -> Result<Vec<PostView>> {
        Ok(self.state.read().await.post_views(|_| true))
    }

    async fn list_posts_by_group(&self, group_id: Uuid) -> Result<Vec<PostView>> {
        Ok(self
            .state
            .read()
            .await
            .post_views(|p| p.group_id == Some(group_id)))
    }

    async fn list_posts_by_author(&self, author_id: Uuid) -> Result<Vec<PostView>> {
        Ok(self
            .state
            .read()
            .await
            .post_views(|p| p.author_id == author_id))
    }

    async fn list_posts_by_followed(&self, follower_id: Uuid) -> Result<Vec<PostView>> {
        let state = self.state.read().await;
        Ok(state.post_views(|p| state.follows.contains_key(&(follower_id, p.author_id))))
    }

    async fn count_posts_by_author(&self, author_id: Uuid) -> Result<i64> {
        let state = self.state.read().await;
        Ok(state
            .posts
            .values()
            .filter(|r| r.value.author_id == author_id)
            .count() as i64)
    }

    async fn create_comment(&self, new: NewComment) -> Result<Comment> {
        ensure_text(&new.text)?;

        let mut state = self.state.write().await;
        if !state.posts.contains_key(&new.post_id) {
            return Err(AppError::not_found("post"));
        }
        if !state.authors.contains_key(&new.author_id) {
            return Err(AppError::not_found("author"));
        }

        let comment = Comment {
            id: Uuid::new_v4(),
            post_id: new.post_id,
            author_id: new.author_id,
            text: new.text,
            created_at: Utc::now(),
        };
        let seq = state.next_seq();
        state.comments.insert(
            comment.id,
            Row {
                seq,
                value: comment.clone(),
            },
        );
        Ok(comment)
    }

    async fn list_comments(&self, post_id: Uuid) -> Result<Vec<CommentView>> {
        let state = self.state.read().await;
        let mut rows: Vec<&Row<Comment>> = state
            .comments
            .values()
            .filter(|r| r.value.post_id == post_id)
            .collect();
        rows.sort_by(|a, b| {
            b.value
                .created_at
                .cmp(&a.value.created_at)
                .then(b.seq.cmp(&a.seq))
        });

        Ok(rows
            .into_iter()
            .filter_map(|r| {
                let author = state.authors.get(&r.value.author_id)?;
                Some(CommentView {
                    id: r.value.id,
                    post_id: r.value.post_id,
                    text: r.value.text.clone(),
                    created_at: r.value.created_at,
                    author: AuthorRef::from(author),
                })
            })
            .collect())
    }

    async fn insert_follow(&self, follower_id: Uuid, author_id: Uuid) -> Result<bool> {
        if follower_id == author_id {
            return Err(AppError::validation("author", "You cannot follow yourself."));
        }

        let mut state = self.state.write().await;
        if !state.authors.contains_key(&follower_id) || !state.authors.contains_key(&author_id) {
            return Err(AppError::not_found("author"));
        }
        if state.follows.contains_key(&(follower_id, author_id)) {
            return Ok(false);
        }

        state.follows.insert(
            (follower_id, author_id),
            Follow {
                id: Uuid::new_v4(),
                follower_id,
                author_id,
                created_at: Utc::now(),
            },
        );
        Ok(true)
    }

    async fn delete_follow(&self, follower_id: Uuid, author_id: Uuid) -> Result<bool> {
        let mut state = self.state.write().await;
        Ok(state.follows.remove(&(follower_id, author_id)).is_some())
    }

    async fn follow_exists(&self, follower_id: Uuid, author_id: Uuid) -> Result<bool> {
        let state = self.state.read().await;
        Ok(state.follows.contains_key(&(follower_id, author_id)))
    }

    async fn count_followers(&self, author_id: Uuid) -> Result<i64> {
        let state = self.state.read().await;
        Ok(state.follows.keys().filter(|(_, a)| *a == author_id).count() as i64)
    }

    async fn count_following(&self, follower_id: Uuid) -> Result<i64> {
        let state = self.state.read().await;
        Ok(state.follows.keys().filter(|(f, _)| *f == follower_id).count() as i64)
    }
}
