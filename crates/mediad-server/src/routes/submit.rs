//! `POST /api/download` — validate and submit a job.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use mediad_core::extract::MediaKind;

use crate::app::AppState;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest {
    url: Option<String>,
    media_kind: Option<String>,
}

pub async fn submit(
    State(state): State<AppState>,
    Json(req): Json<SubmitRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let url = req
        .url
        .filter(|u| !u.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("Missing url or mediaKind"))?;
    let kind = req
        .media_kind
        .ok_or_else(|| ApiError::bad_request("Missing url or mediaKind"))?;

    let kind = match kind.as_str() {
        "video" => MediaKind::Video,
        "audio" => MediaKind::Audio,
        other => {
            return Err(ApiError::bad_request(format!(
                "mediaKind must be \"video\" or \"audio\", got \"{other}\""
            )))
        }
    };

    // Classification tolerates malformed URLs, but there is no point
    // dispatching something the extractor cannot even fetch.
    let parsed = url::Url::parse(&url).map_err(|_| ApiError::bad_request("Invalid url"))?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(ApiError::bad_request("url must be http or https"));
    }

    let id = state
        .orchestrator
        .submit(&url, kind)
        .map_err(|rejection| ApiError::too_many_requests(rejection.to_string()))?;

    Ok((StatusCode::ACCEPTED, Json(json!({ "jobId": id }))))
}
