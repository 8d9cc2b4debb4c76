/// Signup handler - registers an author and issues a token
use actix_web::{web, HttpResponse};
use serde::Serialize;

use crate::app::AppState;
use crate::domain::forms::SignupForm;
use crate::domain::Author;
use crate::error::Result;
use crate::middleware::jwt::issue_token;

#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub author: Author,
    pub token: String,
}

pub async fn signup(
    state: web::Data<AppState>,
    form: web::Json<SignupForm>,
) -> Result<HttpResponse> {
    let author = state.authors.signup(&form).await?;
    let token = issue_token(&author, &state.jwt_secret, state.token_ttl_hours)?;
    Ok(HttpResponse::Created().json(SignupResponse { author, token }))
}
