//! Job handlers: enqueue and poll.

use crate::api::AppState;
use crate::error::{ApiError, ToHttpStatus};
use crate::types::{EnqueueRequest, EnqueueResponse, JobId, PollResponse};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// POST /jobs - Enqueue a chapter download
///
/// Registers the job and returns immediately; no resolution or download work
/// happens until the first poll.
#[utoipa::path(
    post,
    path = "/jobs",
    tag = "jobs",
    request_body = EnqueueRequest,
    responses(
        (status = 202, description = "Job accepted", body = EnqueueResponse),
        (status = 400, description = "Invalid request", body = ApiError)
    )
)]
pub async fn enqueue_job(
    State(state): State<AppState>,
    Json(request): Json<EnqueueRequest>,
) -> Response {
    match state
        .downloader
        .enqueue(&request.source_id, &request.manga_id, &request.chapter_id)
        .await
    {
        Ok(job_id) => (StatusCode::ACCEPTED, Json(EnqueueResponse { job_id })).into_response(),
        Err(e) => {
            let status = StatusCode::from_u16(e.status_code())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (status, Json(ApiError::from(e))).into_response()
        }
    }
}

/// GET /jobs/:job_id - Poll a job
///
/// Drives one unit of work and reports the job's state. Always answers 200
/// with a well-formed status body: unknown or malformed ids get a `FAILED`
/// body so callers polling past eviction still see a terminal response.
#[utoipa::path(
    get,
    path = "/jobs/{job_id}",
    tag = "jobs",
    params(
        ("job_id" = String, Path, description = "Job id returned by enqueue")
    ),
    responses(
        (status = 200, description = "Current job state", body = PollResponse)
    )
)]
pub async fn poll_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> impl IntoResponse {
    let response = match job_id.parse::<JobId>() {
        Ok(id) => state.downloader.poll(&id).await,
        Err(_) => PollResponse::Failed {
            message: format!("unknown job: {job_id}"),
        },
    };

    (StatusCode::OK, Json(response))
}
