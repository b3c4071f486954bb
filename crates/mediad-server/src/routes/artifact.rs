//! `GET /api/download/file/{id}` — stream a finished artifact.

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::Response;
use tokio_util::io::ReaderStream;
use uuid::Uuid;

use mediad_core::jobs::ArtifactError;

use crate::app::AppState;
use crate::error::ApiError;

pub async fn artifact(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let artifact = state.orchestrator.artifact(id).map_err(|err| match err {
        ArtifactError::UnknownJob => ApiError::not_found("No such job"),
        ArtifactError::NotReady | ArtifactError::Failed(_) => {
            ApiError::bad_request("File not ready")
        }
        ArtifactError::Missing => ApiError::not_found("File not found"),
    })?;

    // The store says the file exists, but it can vanish between the check
    // and the open.
    let file = tokio::fs::File::open(&artifact.path)
        .await
        .map_err(|_| ApiError::not_found("File not found"))?;

    let filename = artifact
        .path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("download");

    let body = Body::from_stream(ReaderStream::new(file));
    Response::builder()
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{filename}\""),
        )
        .body(body)
        .map_err(|_| ApiError::not_found("File not found"))
}
