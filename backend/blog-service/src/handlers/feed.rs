/// Feed handlers - paged post lists
use actix_web::{web, HttpResponse};
use serde::Serialize;

use crate::app::AppState;
use crate::domain::{Group, Identity, PostView};
use crate::error::Result;
use crate::pagination::{paginate, Page, PageQuery};
use crate::services::ProfileSummary;

#[derive(Debug, Serialize)]
pub struct GroupFeedResponse {
    pub group: Group,
    pub page: Page<PostView>,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub profile: ProfileSummary,
    pub page: Page<PostView>,
}

/// All posts, newest first
pub async fn index(
    state: web::Data<AppState>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    let posts = state.feeds.global_feed().await?;
    let page = paginate(&posts, state.posts_per_page, query.index());
    Ok(HttpResponse::Ok().json(page))
}

/// Posts of one group
pub async fn group_posts(
    state: web::Data<AppState>,
    slug: web::Path<String>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    let (group, posts) = state.feeds.group_feed(&slug).await?;
    let page = paginate(&posts, state.posts_per_page, query.index());
    Ok(HttpResponse::Ok().json(GroupFeedResponse { group, page }))
}

/// Posts of one author plus follow state
pub async fn profile(
    state: web::Data<AppState>,
    identity: Identity,
    username: web::Path<String>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    let feed = state.feeds.profile_feed(&identity, &username).await?;
    let page = paginate(&feed.posts, state.posts_per_page, query.index());
    Ok(HttpResponse::Ok().json(ProfileResponse {
        profile: ProfileSummary::from(&feed),
        page,
    }))
}

/// Posts by authors the viewer follows
pub async fn follow_index(
    state: web::Data<AppState>,
    identity: Identity,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    let posts = state.feeds.followed_feed(&identity).await?;
    let page = paginate(&posts, state.posts_per_page, query.index());
    Ok(HttpResponse::Ok().json(page))
}
