//! Shared application state and route table.

use actix_web::web;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::FeedCache;
use crate::config::Config;
use crate::handlers;
use crate::metrics::serve_metrics;
use crate::repository::BlogStore;
use crate::services::{AuthorService, FeedService, FollowService, GroupService, PostService};
use crate::storage::ImageStore;

/// State handed to every handler through `web::Data`.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn BlogStore>,
    pub cache: Arc<FeedCache>,
    pub authors: AuthorService,
    pub groups: GroupService,
    pub posts: PostService,
    pub feeds: FeedService,
    pub follows: FollowService,
    pub images: Arc<dyn ImageStore>,
    pub posts_per_page: usize,
    pub max_upload_bytes: usize,
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
}

impl AppState {
    pub fn new(store: Arc<dyn BlogStore>, images: Arc<dyn ImageStore>, config: &Config) -> Self {
        let cache = Arc::new(FeedCache::new(
            Duration::from_secs(config.feed.cache_ttl_secs),
            config.feed.cache_enabled,
        ));
        let follows = FollowService::new(store.clone());

        Self {
            authors: AuthorService::new(store.clone(), cache.clone()),
            groups: GroupService::new(store.clone(), cache.clone()),
            posts: PostService::new(store.clone(), cache.clone()),
            feeds: FeedService::new(store.clone(), cache.clone(), follows.clone()),
            follows,
            store,
            cache,
            images,
            posts_per_page: config.feed.posts_per_page,
            max_upload_bytes: config.media.max_upload_bytes,
            jwt_secret: config.auth.jwt_secret.clone(),
            token_ttl_hours: config.auth.token_ttl_hours,
        }
    }
}

/// Register every route. Shared by `main` and the HTTP tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(handlers::feed::index))
        .route("/group/{slug}/", web::get().to(handlers::feed::group_posts))
        .route("/profile/{username}/", web::get().to(handlers::feed::profile))
        .route(
            "/profile/{username}/follow/",
            web::post().to(handlers::follow::profile_follow),
        )
        .route(
            "/profile/{username}/unfollow/",
            web::post().to(handlers::follow::profile_unfollow),
        )
        .route("/follow/", web::get().to(handlers::feed::follow_index))
        .route("/create/", web::post().to(handlers::posts::create_post))
        .route("/posts/{post_id}/", web::get().to(handlers::posts::post_detail))
        .route("/posts/{post_id}/edit/", web::post().to(handlers::posts::edit_post))
        .route(
            "/posts/{post_id}/comment/",
            web::post().to(handlers::posts::add_comment),
        )
        .route("/auth/signup/", web::post().to(handlers::auth::signup))
        .route("/media/", web::post().to(handlers::media::upload_image))
        .route("/health", web::get().to(handlers::health::health))
        .route("/metrics", web::get().to(serve_metrics));
}
