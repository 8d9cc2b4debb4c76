/// Follow handlers - follow and unfollow authors by username
use actix_web::{web, HttpResponse};
use serde::Serialize;

use crate::app::AppState;
use crate::domain::Identity;
use crate::error::Result;

#[derive(Debug, Serialize)]
pub struct FollowResponse {
    pub author: String,
    pub following: bool,
}

pub async fn profile_follow(
    state: web::Data<AppState>,
    identity: Identity,
    username: web::Path<String>,
) -> Result<HttpResponse> {
    let follower = identity.require_author()?;
    let target = state.authors.get_by_username(&username).await?;

    state.follows.follow(follower, &target).await?;

    Ok(HttpResponse::Ok().json(FollowResponse {
        author: target.username,
        following: true,
    }))
}

pub async fn profile_unfollow(
    state: web::Data<AppState>,
    identity: Identity,
    username: web::Path<String>,
) -> Result<HttpResponse> {
    let follower = identity.require_author()?;
    let target = state.authors.get_by_username(&username).await?;

    state.follows.unfollow(follower, &target).await?;

    Ok(HttpResponse::Ok().json(FollowResponse {
        author: target.username,
        following: false,
    }))
}
