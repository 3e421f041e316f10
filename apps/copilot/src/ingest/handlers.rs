//! Axum route handler for document upload.

use axum::extract::Multipart;
use axum::Json;
use serde::Serialize;
use tracing::info;

use crate::errors::AppError;
use crate::ingest::{extract_text, IngestError};

#[derive(Debug, Serialize)]
pub struct ExtractResponse {
    pub filename: String,
    pub text: String,
}

/// POST /api/v1/extract
///
/// Multipart upload with a `file` field. Returns the extracted plain text.
pub async fn handle_extract(mut multipart: Multipart) -> Result<Json<ExtractResponse>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("invalid multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("failed to read upload: {e}")))?;

        let name = filename.clone();
        let text = tokio::task::spawn_blocking(move || extract_text(&name, &bytes))
            .await
            .map_err(|e| IngestError::Worker(e.to_string()))??;

        info!(
            "Extracted {} chars from '{}'",
            text.chars().count(),
            filename
        );

        return Ok(Json(ExtractResponse { filename, text }));
    }

    Err(AppError::Validation("multipart field 'file' is required".to_string()))
}
