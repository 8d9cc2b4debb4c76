use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::app::AppState;
use crate::error::Result;

/// Liveness plus a store round trip.
pub async fn health(state: web::Data<AppState>) -> Result<HttpResponse> {
    state.store.health_check().await?;
    Ok(HttpResponse::Ok().json(json!({ "status": "ok" })))
}
