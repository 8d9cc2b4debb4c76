/// Media handler - multipart image upload for posts
use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use futures_util::stream::StreamExt;
use serde::Serialize;
use tracing::{info, warn};

use crate::app::AppState;
use crate::domain::Identity;
use crate::error::{AppError, Result};

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    /// Reference to put in a post's `image` field
    pub image: String,
}

/// Stores the first file part of the request. The returned reference is
/// then attached to a post on create or edit.
pub async fn upload_image(
    state: web::Data<AppState>,
    identity: Identity,
    mut payload: Multipart,
) -> Result<HttpResponse> {
    let author = identity.require_author()?;
    // One byte past the limit is enough for the store to reject the upload.
    let limit = state.max_upload_bytes.saturating_add(1);

    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|e| {
            warn!(error = %e, "Malformed multipart upload");
            AppError::validation("image", "Malformed upload.")
        })?;

        // Plain form fields carry no content type.
        let Some(content_type) = field.content_type().cloned() else {
            while let Some(chunk) = field.next().await {
                chunk.map_err(|_| AppError::validation("image", "Malformed upload."))?;
            }
            continue;
        };

        let mut bytes = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(|e| {
                warn!(error = %e, "Error reading upload field");
                AppError::validation("image", "Malformed upload.")
            })?;
            if bytes.len() + chunk.len() > limit {
                bytes.extend_from_slice(&chunk[..limit - bytes.len()]);
                break;
            }
            bytes.extend_from_slice(&chunk);
        }

        let image = state.images.save(&content_type, &bytes).await?;
        info!(author = %author.username, image = %image, "Image uploaded");
        return Ok(HttpResponse::Created().json(UploadResponse { image }));
    }

    Err(AppError::validation("image", "No file was submitted."))
}
