use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Number of characters of a post's text used as its short title.
pub const POST_TITLE_LEN: usize = 15;

/// Author entity - a registered user who owns posts, comments and follow edges
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Author {
    pub id: Uuid,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub date_joined: DateTime<Utc>,
}

impl Author {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// Group entity - a sluggable category posts may belong to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Group {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub description: String,
}

/// Post entity as persisted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    pub id: Uuid,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub author_id: Uuid,
    pub group_id: Option<Uuid>,
    pub image: Option<String>,
}

impl Post {
    /// Short title: the first characters of the text.
    pub fn title(&self) -> String {
        short_title(&self.text)
    }
}

/// Comment entity - a reply to a post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// Follow edge: `follower_id` receives `author_id`'s posts in the followed feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Follow {
    pub id: Uuid,
    pub follower_id: Uuid,
    pub author_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorRef {
    pub id: Uuid,
    pub username: String,
}

impl From<&Author> for AuthorRef {
    fn from(author: &Author) -> Self {
        Self {
            id: author.id,
            username: author.username.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRef {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
}

impl From<&Group> for GroupRef {
    fn from(group: &Group) -> Self {
        Self {
            id: group.id,
            slug: group.slug.clone(),
            title: group.title.clone(),
        }
    }
}

/// Post together with its author and group, as listed in feeds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostView {
    pub id: Uuid,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub image: Option<String>,
    pub author: AuthorRef,
    pub group: Option<GroupRef>,
}

/// Flat row produced by the feed queries (post joined with author and group).
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PostRow {
    pub id: Uuid,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub image: Option<String>,
    pub author_id: Uuid,
    pub author_username: String,
    pub group_id: Option<Uuid>,
    pub group_slug: Option<String>,
    pub group_title: Option<String>,
}

impl From<PostRow> for PostView {
    fn from(row: PostRow) -> Self {
        let group = match (row.group_id, row.group_slug, row.group_title) {
            (Some(id), Some(slug), Some(title)) => Some(GroupRef { id, slug, title }),
            _ => None,
        };

        Self {
            id: row.id,
            text: row.text,
            created_at: row.created_at,
            image: row.image,
            author: AuthorRef {
                id: row.author_id,
                username: row.author_username,
            },
            group,
        }
    }
}

/// Comment together with its author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentView {
    pub id: Uuid,
    pub post_id: Uuid,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub author: AuthorRef,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CommentRow {
    pub id: Uuid,
    pub post_id: Uuid,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub author_id: Uuid,
    pub author_username: String,
}

impl From<CommentRow> for CommentView {
    fn from(row: CommentRow) -> Self {
        Self {
            id: row.id,
            post_id: row.post_id,
            text: row.text,
            created_at: row.created_at,
            author: AuthorRef {
                id: row.author_id,
                username: row.author_username,
            },
        }
    }
}

// ============================================================================
// Store inputs
// ============================================================================

#[derive(Debug, Clone)]
pub struct NewAuthor {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

#[derive(Debug, Clone)]
pub struct NewGroup {
    pub title: String,
    pub slug: String,
    pub description: String,
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub author_id: Uuid,
    pub text: String,
    pub group_id: Option<Uuid>,
    pub image: Option<String>,
}

/// Partial update of a post. `None` keeps the current value; for the
/// nullable columns `Some(None)` clears it.
#[derive(Debug, Clone, Default)]
pub struct PostChanges {
    pub text: Option<String>,
    pub group_id: Option<Option<Uuid>>,
    pub image: Option<Option<String>>,
}

impl PostChanges {
    pub fn apply(&self, post: &mut Post) {
        if let Some(text) = &self.text {
            post.text = text.clone();
        }
        if let Some(group_id) = self.group_id {
            post.group_id = group_id;
        }
        if let Some(image) = &self.image {
            post.image = image.clone();
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewComment {
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub text: String,
}

pub fn short_title(text: &str) -> String {
    text.chars().take(POST_TITLE_LEN).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(text: &str) -> Post {
        Post {
            id: Uuid::new_v4(),
            text: text.to_string(),
            created_at: Utc::now(),
            author_id: Uuid::new_v4(),
            group_id: Some(Uuid::new_v4()),
            image: Some("posts/a.gif".to_string()),
        }
    }

    #[test]
    fn title_is_truncated_by_characters() {
        let long = format!("Тестовый пост{}", "!".repeat(20));
        assert_eq!(post(&long).title(), "Тестовый пост!!");
        assert_eq!(post("short").title(), "short");
    }

    #[test]
    fn changes_keep_untouched_fields() {
        let mut p = post("before");
        let original = p.clone();

        PostChanges {
            text: Some("after".to_string()),
            ..Default::default()
        }
        .apply(&mut p);

        assert_eq!(p.text, "after");
        assert_eq!(p.group_id, original.group_id);
        assert_eq!(p.image, original.image);
        assert_eq!(p.created_at, original.created_at);
        assert_eq!(p.author_id, original.author_id);
    }

    #[test]
    fn changes_can_clear_group_and_image() {
        let mut p = post("text");
        PostChanges {
            text: None,
            group_id: Some(None),
            image: Some(None),
        }
        .apply(&mut p);

        assert_eq!(p.text, "text");
        assert!(p.group_id.is_none());
        assert!(p.image.is_none());
    }

    #[test]
    fn row_without_group_maps_to_none() {
        let row = PostRow {
            id: Uuid::new_v4(),
            text: "hi".to_string(),
            created_at: Utc::now(),
            image: None,
            author_id: Uuid::new_v4(),
            author_username: "leo".to_string(),
            group_id: None,
            group_slug: None,
            group_title: None,
        };
        let view = PostView::from(row);
        assert!(view.group.is_none());
        assert_eq!(view.author.username, "leo");
    }
}
