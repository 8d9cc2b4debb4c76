//! Postgres store tests.
//!
//! Run with a disposable database:
//! `DATABASE_URL=postgres://... cargo test -p blog-service -- --ignored`

use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use blog_service::domain::{NewAuthor, NewComment, NewGroup, NewPost, PostChanges};
use blog_service::error::{AppError, AuthorizationError};
use blog_service::repository::{BlogStore, PgBlogStore};

async fn store() -> PgBlogStore {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for ignored tests");
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&url)
        .await
        .expect("connect to database");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("run migrations");
    PgBlogStore::new(pool)
}

fn unique(prefix: &str) -> String {
    format!("{}_{}", prefix, &Uuid::new_v4().simple().to_string()[..8])
}

fn new_author(username: &str) -> NewAuthor {
    NewAuthor {
        username: username.to_string(),
        first_name: String::new(),
        last_name: String::new(),
        email: String::new(),
    }
}

fn new_post(author_id: Uuid, text: &str, group_id: Option<Uuid>) -> NewPost {
    NewPost {
        author_id,
        text: text.to_string(),
        group_id,
        image: None,
    }
}

#[tokio::test]
#[ignore]
async fn test_username_is_unique() {
    let store = store().await;
    let username = unique("leo");
    store.create_author(new_author(&username)).await.unwrap();

    let err = store.create_author(new_author(&username)).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
#[ignore]
async fn test_feed_order_and_group_clearing() {
    let store = store().await;
    let author = store.create_author(new_author(&unique("leo"))).await.unwrap();
    let slug = unique("cats");
    let group = store
        .create_group(NewGroup {
            title: "Cats".to_string(),
            slug: slug.clone(),
            description: "Cats".to_string(),
        })
        .await
        .unwrap();

    let first = store
        .create_post(new_post(author.id, "first", Some(group.id)))
        .await
        .unwrap();
    let second = store
        .create_post(new_post(author.id, "second", Some(group.id)))
        .await
        .unwrap();

    let feed = store.list_posts_by_group(group.id).await.unwrap();
    let ids: Vec<Uuid> = feed.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![second.id, first.id]);
    assert_eq!(feed[0].group.as_ref().unwrap().slug, slug);

    assert!(store.delete_group(group.id).await.unwrap());
    assert_eq!(store.get_post(first.id).await.unwrap().group_id, None);
}

#[tokio::test]
#[ignore]
async fn test_edit_checks_owner_atomically() {
    let store = store().await;
    let leo = store.create_author(new_author(&unique("leo"))).await.unwrap();
    let anna = store.create_author(new_author(&unique("anna"))).await.unwrap();
    let post = store
        .create_post(new_post(leo.id, "mine", None))
        .await
        .unwrap();

    let changes = PostChanges {
        text: Some("stolen".to_string()),
        ..Default::default()
    };
    let err = store
        .update_post(post.id, anna.id, changes.clone())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::Authorization(AuthorizationError::NotOwner)
    ));

    let updated = store.update_post(post.id, leo.id, changes).await.unwrap();
    assert_eq!(updated.text, "stolen");
    assert_eq!(updated.created_at, post.created_at);
}

#[tokio::test]
#[ignore]
async fn test_follow_constraints() {
    let store = store().await;
    let leo = store.create_author(new_author(&unique("leo"))).await.unwrap();
    let anna = store.create_author(new_author(&unique("anna"))).await.unwrap();

    assert!(store.insert_follow(leo.id, anna.id).await.unwrap());
    assert!(!store.insert_follow(leo.id, anna.id).await.unwrap());
    assert_eq!(store.count_followers(anna.id).await.unwrap(), 1);

    let err = store.insert_follow(leo.id, leo.id).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let post = store
        .create_post(new_post(anna.id, "followed", None))
        .await
        .unwrap();
    let feed = store.list_posts_by_followed(leo.id).await.unwrap();
    assert_eq!(feed.len(), 1);
    assert_eq!(feed[0].id, post.id);

    assert!(store.delete_follow(leo.id, anna.id).await.unwrap());
    assert!(store.list_posts_by_followed(leo.id).await.unwrap().is_empty());
}

#[tokio::test]
#[ignore]
async fn test_comment_requires_post_and_cascades() {
    let store = store().await;
    let leo = store.create_author(new_author(&unique("leo"))).await.unwrap();

    let err = store
        .create_comment(NewComment {
            post_id: Uuid::new_v4(),
            author_id: leo.id,
            text: "hello".to_string(),
        })
        .await
        .unwrap_err();
    assert!(err.is_not_found());

    let post = store
        .create_post(new_post(leo.id, "commented", None))
        .await
        .unwrap();
    store
        .create_comment(NewComment {
            post_id: post.id,
            author_id: leo.id,
            text: "first".to_string(),
        })
        .await
        .unwrap();

    assert!(store.delete_author(leo.id).await.unwrap());
    assert!(store.list_comments(post.id).await.unwrap().is_empty());
    assert!(store.get_post(post.id).await.unwrap_err().is_not_found());
}

#[tokio::test]
#[ignore]
async fn test_whitespace_only_text_is_rejected() {
    let store = store().await;
    let leo = store.create_author(new_author(&unique("leo"))).await.unwrap();

    let err = store
        .create_post(new_post(leo.id, "\n\t", None))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(ref e) if e.has_field("text")));

    let post = store
        .create_post(new_post(leo.id, "kept", None))
        .await
        .unwrap();
    let changes = PostChanges {
        text: Some(" \t\r\n".to_string()),
        ..Default::default()
    };
    let err = store.update_post(post.id, leo.id, changes).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(ref e) if e.has_field("text")));
    assert_eq!(store.get_post(post.id).await.unwrap().text, "kept");

    let err = store
        .create_comment(NewComment {
            post_id: post.id,
            author_id: leo.id,
            text: "\t".to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(ref e) if e.has_field("text")));
}

#[tokio::test]
#[ignore]
async fn test_schema_rejects_whitespace_only_text() {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for ignored tests");
    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&url)
        .await
        .expect("connect to database");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("run migrations");
    let leo = PgBlogStore::new(pool.clone())
        .create_author(new_author(&unique("leo")))
        .await
        .unwrap();

    let result = sqlx::query(
        "INSERT INTO posts (id, text, created_at, author_id) VALUES ($1, $2, now(), $3)",
    )
    .bind(Uuid::new_v4())
    .bind("\n\t")
    .bind(leo.id)
    .execute(&pool)
    .await;
    assert!(result.is_err());
}
