// src/handlers/upload.rs

use axum::{
    Json,
    extract::{Multipart, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{config::Config, error::AppError};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UploadResponse {
    /// Site-relative URL the file is served from.
    pub url: String,
}

/// Stores an image sent as the multipart field `file`.
pub async fn upload_image(
    State(config): State<Config>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let content_type = field.content_type().unwrap_or_default().to_string();
        let extension = image_extension(&content_type).ok_or(AppError::BadRequest(
            "Only image uploads are accepted".to_string(),
        ))?;

        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        if bytes.is_empty() {
            return Err(AppError::BadRequest("The uploaded file is empty".to_string()));
        }
        if bytes.len() > config.max_upload_bytes {
            return Err(AppError::BadRequest(format!(
                "Files may not exceed {} bytes",
                config.max_upload_bytes
            )));
        }

        let file_name = format!("{}.{}", Uuid::new_v4(), extension);
        tokio::fs::create_dir_all(&config.upload_dir)
            .await
            .map_err(|e| AppError::InternalServerError(e.to_string()))?;
        tokio::fs::write(config.upload_dir.join(&file_name), &bytes)
            .await
            .map_err(|e| AppError::InternalServerError(e.to_string()))?;

        tracing::info!(file = %file_name, size = bytes.len(), "image uploaded");
        return Ok((
            StatusCode::CREATED,
            Json(UploadResponse {
                url: format!("/uploads/{}", file_name),
            }),
        ));
    }

    Err(AppError::BadRequest("Missing multipart field 'file'".to_string()))
}

fn image_extension(content_type: &str) -> Option<&'static str> {
    match content_type {
        "image/png" => Some("png"),
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        "image/avif" => Some("avif"),
        _ => None,
    }
}
