//! `GET /api/download/status/{id}` — poll a job's state.

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;
use uuid::Uuid;

use mediad_core::jobs::JobState;

use crate::app::AppState;
use crate::error::ApiError;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    download_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

pub async fn status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<StatusResponse>, ApiError> {
    let job = state
        .orchestrator
        .status(id)
        .ok_or_else(|| ApiError::not_found("No such job"))?;

    let response = match &job.state {
        JobState::Succeeded(_) => StatusResponse {
            status: job.state.name(),
            download_url: Some(format!("/api/download/file/{id}")),
            error: None,
        },
        JobState::Failed(failure) => StatusResponse {
            status: job.state.name(),
            download_url: None,
            error: Some(failure.message.clone()),
        },
        JobState::Pending | JobState::Running => StatusResponse {
            status: job.state.name(),
            download_url: None,
            error: None,
        },
    };
    Ok(Json(response))
}
