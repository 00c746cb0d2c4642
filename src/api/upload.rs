//! Upload API endpoint
//!
//! POST /api/v1/upload?kind= accepts multipart/form-data with a single
//! field named "file". Files are stored as `{uuid}.{ext}` under the
//! configured upload directory, in a sub-directory per kind, and served
//! from `/uploads/`.

use axum::{
    extract::{Multipart, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;
use uuid::Uuid;

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::config::UploadConfig;

/// Response for successful upload
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    /// Public URL of the stored file
    pub url: String,
    /// Path relative to the upload directory, as stored on models
    pub path: String,
    pub size: u64,
    pub content_type: String,
}

/// What the file is for; decides the sub-directory and accepted types
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadKind {
    ProfilePicture,
    Project,
    Gallery,
    Blog,
    Resume,
    #[default]
    Other,
}

impl UploadKind {
    pub fn directory(&self) -> &'static str {
        match self {
            UploadKind::ProfilePicture => "profile_pics",
            UploadKind::Project => "projects",
            UploadKind::Gallery => "project_gallery",
            UploadKind::Blog => "blog",
            UploadKind::Resume => "resumes",
            UploadKind::Other => "files",
        }
    }

    fn accepts(&self, content_type: &str) -> bool {
        match self {
            UploadKind::Resume => content_type == "application/pdf",
            UploadKind::Other => true,
            _ => content_type.starts_with("image/"),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UploadQuery {
    #[serde(default)]
    pub kind: UploadKind,
}

/// Build the upload router
pub fn router() -> Router<AppState> {
    Router::new().route("/upload", post(upload_file))
}

/// POST /api/v1/upload?kind=profile_picture|project|gallery|blog|resume
async fn upload_file(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Query(query): Query<UploadQuery>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation_error(format!("Failed to read multipart: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let content_type = field
            .content_type()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "application/octet-stream".to_string());

        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::validation_error(format!("Failed to read file: {}", e)))?;

        let response = store_upload(&state.upload_config, query.kind, &content_type, &data).await?;
        tracing::info!(
            user_id = user.id,
            path = %response.path,
            size = response.size,
            "File uploaded"
        );
        return Ok((StatusCode::CREATED, Json(response)));
    }

    Err(ApiError::validation_error("No file provided"))
}

/// Validate and write one uploaded file
pub async fn store_upload(
    config: &UploadConfig,
    kind: UploadKind,
    content_type: &str,
    data: &[u8],
) -> Result<UploadResponse, ApiError> {
    if !config.is_type_allowed(content_type) || !kind.accepts(content_type) {
        return Err(ApiError::validation_error(format!(
            "Invalid file type: {}. Allowed types: {}",
            content_type,
            config.allowed_types.join(", ")
        )));
    }

    if data.len() as u64 > config.max_file_size {
        return Err(ApiError::validation_error(format!(
            "File too large. Maximum size: {} bytes ({} MB)",
            config.max_file_size,
            config.max_file_size / 1024 / 1024
        )));
    }

    let directory = config.path.join(kind.directory());
    ensure_upload_dir(&directory).await?;

    let filename = format!("{}.{}", Uuid::new_v4(), config.get_extension(content_type));
    fs::write(directory.join(&filename), data)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to save file: {}", e)))?;

    let path = format!("{}/{}", kind.directory(), filename);
    Ok(UploadResponse {
        url: format!("/uploads/{}", path),
        path,
        size: data.len() as u64,
        content_type: content_type.to_string(),
    })
}

/// Ensure upload directory exists
async fn ensure_upload_dir(path: &Path) -> Result<(), ApiError> {
    fs::create_dir_all(path)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to create upload dir: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config(dir: &TempDir) -> UploadConfig {
        UploadConfig {
            path: dir.path().to_path_buf(),
            max_file_size: 16,
            ..UploadConfig::default()
        }
    }

    #[tokio::test]
    async fn test_store_upload_writes_uuid_file() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir);

        let response = store_upload(&config, UploadKind::ProfilePicture, "image/png", b"png-bytes")
            .await
            .unwrap();

        assert!(response.path.starts_with("profile_pics/"));
        assert!(response.path.ends_with(".png"));
        assert_eq!(response.url, format!("/uploads/{}", response.path));
        assert_eq!(response.size, 9);

        let stored = std::fs::read(dir.path().join(&response.path)).unwrap();
        assert_eq!(stored, b"png-bytes");
    }

    #[tokio::test]
    async fn test_store_upload_rejects_type_and_size() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir);

        let err = store_upload(&config, UploadKind::Other, "text/html", b"<p>")
            .await
            .unwrap_err();
        assert_eq!(err.error.code, "VALIDATION_ERROR");

        // allowed globally, but a resume must be a PDF
        let err = store_upload(&config, UploadKind::Resume, "image/png", b"png")
            .await
            .unwrap_err();
        assert!(err.error.message.contains("Invalid file type"));

        let err = store_upload(&config, UploadKind::Blog, "image/jpeg", &[0u8; 17])
            .await
            .unwrap_err();
        assert!(err.error.message.contains("too large"));
    }

    #[test]
    fn test_upload_kind_query() {
        let query: UploadQuery = serde_json::from_str(r#"{"kind": "resume"}"#).unwrap();
        assert_eq!(query.kind, UploadKind::Resume);
        assert_eq!(query.kind.directory(), "resumes");

        let query: UploadQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(query.kind, UploadKind::Other);
    }
}
