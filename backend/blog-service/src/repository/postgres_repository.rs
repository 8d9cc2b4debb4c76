use chrono::Utc;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use super::BlogStore;
use crate::domain::forms::{ensure_text, INVALID_CHOICE, REQUIRED};
use crate::domain::models::{CommentRow, PostRow};
use crate::domain::{
    Author, Comment, CommentView, Group, NewAuthor, NewComment, NewGroup, NewPost, Post,
    PostChanges, PostView,
};
use crate::error::{AppError, AuthorizationError, Result};

/// Post joined with author and group in one statement.
const POST_VIEW_SELECT: &str = r#"
    SELECT p.id, p.text, p.created_at, p.image,
           a.id AS author_id, a.username AS author_username,
           g.id AS group_id, g.slug AS group_slug, g.title AS group_title
    FROM posts p
    JOIN authors a ON a.id = p.author_id
    LEFT JOIN post_groups g ON g.id = p.group_id
"#;

const NEWEST_FIRST: &str = "ORDER BY p.created_at DESC, p.id DESC";

const POST_COLUMNS: &str = "id, text, created_at, author_id, group_id, image";

/// Translate constraint violations into domain errors; anything else stays a
/// database error.
fn map_db_error(err: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &err {
        match db_err.constraint() {
            Some("authors_username_key") => {
                return AppError::Conflict("A user with that username already exists.".into())
            }
            Some("post_groups_slug_key") => {
                return AppError::Conflict("A group with that slug already exists.".into())
            }
            Some("posts_text_not_blank") | Some("comments_text_not_blank") => {
                return AppError::validation("text", REQUIRED)
            }
            Some("posts_group_id_fkey") => return AppError::validation("group", INVALID_CHOICE),
            Some("follows_no_self_follow") => {
                return AppError::validation("author", "You cannot follow yourself.")
            }
            Some("comments_post_id_fkey") => return AppError::not_found("post"),
            Some("posts_author_id_fkey")
            | Some("comments_author_id_fkey")
            | Some("follows_follower_id_fkey")
            | Some("follows_author_id_fkey") => return AppError::not_found("author"),
            _ => {}
        }
    }
    AppError::Database(err)
}

/// PostgreSQL entity store (source of truth)
#[derive(Clone)]
pub struct PgBlogStore {
    pool: PgPool,
}

impl PgBlogStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn fetch_post_views(&self, filter: &str, id: Option<Uuid>) -> Result<Vec<PostView>> {
        let sql = format!("{} {} {}", POST_VIEW_SELECT, filter, NEWEST_FIRST);
        let mut query = sqlx::query_as::<_, PostRow>(&sql);
        if let Some(id) = id {
            query = query.bind(id);
        }
        let rows = query.fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(PostView::from).collect())
    }
}

#[async_trait::async_trait]
impl BlogStore for PgBlogStore {
    async fn create_author(&self, new: NewAuthor) -> Result<Author> {
        let author = sqlx::query_as::<_, Author>(
            r#"
            INSERT INTO authors (id, username, first_name, last_name, email, date_joined)
            VALUES ($1, $2, $3, $4, $5, NOW())
            RETURNING id, username, first_name, last_name, email, date_joined
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new.username)
        .bind(&new.first_name)
        .bind(&new.last_name)
        .bind(&new.email)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;

        debug!(author_id = %author.id, username = %author.username, "Created author");
        Ok(author)
    }

    async fn get_author(&self, author_id: Uuid) -> Result<Author> {
        sqlx::query_as::<_, Author>(
            r#"
            SELECT id, username, first_name, last_name, email, date_joined
            FROM authors
            WHERE id = $1
            "#,
        )
        .bind(author_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::not_found(format!("author {}", author_id)))
    }

    async fn find_author_by_username(&self, username: &str) -> Result<Option<Author>> {
        let author = sqlx::query_as::<_, Author>(
            r#"
            SELECT id, username, first_name, last_name, email, date_joined
            FROM authors
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(author)
    }

    async fn delete_author(&self, author_id: Uuid) -> Result<bool> {
        let affected = sqlx::query("DELETE FROM authors WHERE id = $1")
            .bind(author_id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        debug!(%author_id, affected, "Deleted author");
        Ok(affected > 0)
    }

    async fn create_group(&self, new: NewGroup) -> Result<Group> {
        let group = sqlx::query_as::<_, Group>(
            r#"
            INSERT INTO post_groups (id, title, slug, description)
            VALUES ($1, $2, $3, $4)
            RETURNING id, title, slug, description
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new.title)
        .bind(&new.slug)
        .bind(&new.description)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(group)
    }

    async fn get_group(&self, group_id: Uuid) -> Result<Option<Group>> {
        let group = sqlx::query_as::<_, Group>(
            "SELECT id, title, slug, description FROM post_groups WHERE id = $1",
        )
        .bind(group_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(group)
    }

    async fn find_group_by_slug(&self, slug: &str) -> Result<Option<Group>> {
        let group = sqlx::query_as::<_, Group>(
            "SELECT id, title, slug, description FROM post_groups WHERE slug = $1",
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        Ok(group)
    }

    async fn list_groups(&self) -> Result<Vec<Group>> {
        let groups = sqlx::query_as::<_, Group>(
            "SELECT id, title, slug, description FROM post_groups ORDER BY title ASC, slug ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(groups)
    }

    async fn delete_group(&self, group_id: Uuid) -> Result<bool> {
        let affected = sqlx::query("DELETE FROM post_groups WHERE id = $1")
            .bind(group_id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(affected > 0)
    }

    async fn create_post(&self, new: NewPost) -> Result<Post> {
        ensure_text(&new.text)?;
        let sql = format!(
            r#"
            INSERT INTO posts (id, text, created_at, author_id, group_id, image)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            POST_COLUMNS
        );

        let post = sqlx::query_as::<_, Post>(&sql)
            .bind(Uuid::new_v4())
            .bind(&new.text)
            .bind(Utc::now())
            .bind(new.author_id)
            .bind(new.group_id)
            .bind(&new.image)
            .fetch_one(&self.pool)
            .await
            .map_err(map_db_error)?;

        Ok(post)
    }

    async fn get_post(&self, post_id: Uuid) -> Result<Post> {
        let sql = format!("SELECT {} FROM posts WHERE id = $1", POST_COLUMNS);
        sqlx::query_as::<_, Post>(&sql)
            .bind(post_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::not_found(format!("post {}", post_id)))
    }

    async fn get_post_view(&self, post_id: Uuid) -> Result<PostView> {
        let sql = format!("{} WHERE p.id = $1", POST_VIEW_SELECT);
        sqlx::query_as::<_, PostRow>(&sql)
            .bind(post_id)
            .fetch_optional(&self.pool)
            .await?
            .map(PostView::from)
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
        let mut tx = self.pool.begin().await?;

        let select = format!("SELECT {} FROM posts WHERE id = $1 FOR UPDATE", POST_COLUMNS);
        let mut post = sqlx::query_as::<_, Post>(&select)
            .bind(post_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::not_found(format!("post {}", post_id)))?;

        if post.author_id != editor_id {
            return Err(AuthorizationError::NotOwner.into());
        }

        changes.apply(&mut post);

        let update = format!(
            r#"
            UPDATE posts
            SET text = $2, group_id = $3, image = $4
            WHERE id = $1
            RETURNING {}
            "#,
            POST_COLUMNS
        );
        let updated = sqlx::query_as::<_, Post>(&update)
            .bind(post_id)
            .bind(&post.text)
            .bind(post.group_id)
            .bind(&post.image)
            .fetch_one(&mut *tx)
            .await
            .map_err(map_db_error)?;

        tx.commit().await?;
        Ok(updated)
    }

    async fn delete_post(&self, post_id: Uuid) -> Result<bool> {
        let affected = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(post_id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(affected > 0)
    }

    async fn list_all_posts(&self) -> Result<Vec<PostView>> {
        self.fetch_post_views("", None).await
    }

    async fn list_posts_by_group(&self, group_id: Uuid) -> Result<Vec<PostView>> {
        self.fetch_post_views("WHERE p.group_id = $1", Some(group_id))
            .await
    }

    async fn list_posts_by_author(&self, author_id: Uuid) -> Result<Vec<PostView>> {
        self.fetch_post_views("WHERE p.author_id = $1", Some(author_id))
            .await
    }

    async fn list_posts_by_followed(&self, follower_id: Uuid) -> Result<Vec<PostView>> {
        self.fetch_post_views(
            "WHERE p.author_id IN (SELECT f.author_id FROM follows f WHERE f.follower_id = $1)",
            Some(follower_id),
        )
        .await
    }

    async fn count_posts_by_author(&self, author_id: Uuid) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts WHERE author_id = $1")
            .bind(author_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn create_comment(&self, new: NewComment) -> Result<Comment> {
        ensure_text(&new.text)?;
        let comment = sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO comments (id, post_id, author_id, text, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, post_id, author_id, text, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(new.post_id)
        .bind(new.author_id)
        .bind(&new.text)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(comment)
    }

    async fn list_comments(&self, post_id: Uuid) -> Result<Vec<CommentView>> {
        let rows = sqlx::query_as::<_, CommentRow>(
            r#"
            SELECT c.id, c.post_id, c.text, c.created_at,
                   a.id AS author_id, a.username AS author_username
            FROM comments c
            JOIN authors a ON a.id = c.author_id
            WHERE c.post_id = $1
            ORDER BY c.created_at DESC, c.id DESC
            "#,
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(CommentView::from).collect())
    }

    async fn insert_follow(&self, follower_id: Uuid, author_id: Uuid) -> Result<bool> {
        let inserted = sqlx::query_as::<_, (Uuid,)>(
            r#"
            INSERT INTO follows (id, follower_id, author_id, created_at)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (follower_id, author_id) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(follower_id)
        .bind(author_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(inserted.is_some())
    }

    async fn delete_follow(&self, follower_id: Uuid, author_id: Uuid) -> Result<bool> {
        let affected = sqlx::query(
            r#"
            DELETE FROM follows
            WHERE follower_id = $1 AND author_id = $2
            "#,
        )
        .bind(follower_id)
        .bind(author_id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(affected > 0)
    }

    async fn follow_exists(&self, follower_id: Uuid, author_id: Uuid) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM follows WHERE follower_id = $1 AND author_id = $2)",
        )
        .bind(follower_id)
        .bind(author_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn count_followers(&self, author_id: Uuid) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM follows WHERE author_id = $1")
            .bind(author_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn count_following(&self, follower_id: Uuid) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM follows WHERE follower_id = $1")
                .bind(follower_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
