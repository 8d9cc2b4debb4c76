/// Post handlers - HTTP endpoints for post operations
use actix_web::{web, HttpResponse};
use uuid::Uuid;

use crate::app::AppState;
use crate::domain::forms::{CommentForm, EditPostForm, PostForm};
use crate::domain::Identity;
use crate::error::Result;

/// Get a post with its comments
pub async fn post_detail(
    state: web::Data<AppState>,
    post_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let detail = state.posts.post_detail(*post_id).await?;
    Ok(HttpResponse::Ok().json(detail))
}

/// Create a new post
pub async fn create_post(
    state: web::Data<AppState>,
    identity: Identity,
    form: web::Json<PostForm>,
) -> Result<HttpResponse> {
    let author = identity.require_author()?;
    let post = state.posts.create_post(author, &form).await?;
    Ok(HttpResponse::Created().json(post))
}

/// Edit a post owned by the caller
pub async fn edit_post(
    state: web::Data<AppState>,
    identity: Identity,
    post_id: web::Path<Uuid>,
    form: web::Json<EditPostForm>,
) -> Result<HttpResponse> {
    let author = identity.require_author()?;
    let post = state.posts.update_post(author, *post_id, &form).await?;
    Ok(HttpResponse::Ok().json(post))
}

/// Comment on a post
pub async fn add_comment(
    state: web::Data<AppState>,
    identity: Identity,
    post_id: web::Path<Uuid>,
    form: web::Json<CommentForm>,
) -> Result<HttpResponse> {
    let author = identity.require_author()?;
    let comment = state.posts.add_comment(author, *post_id, &form).await?;
    Ok(HttpResponse::Created().json(comment))
}
