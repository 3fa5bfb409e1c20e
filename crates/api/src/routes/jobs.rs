use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use jobs::JobStatus;
use types::SolveResult;

#[utoipa::path(
        get,
        path = "/v1/jobs/{id}",
        params(("id" = String, Path, description = "Job ID")),
        responses(
            (status = 200, description = "Job status", body = jobs::JobStatus),
            (status = 404, description = "Unknown job", body = crate::error::ErrorBody)
        )
    )]
pub async fn status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<JobStatus>, ApiError> {
    state
        .jobs
        .get(&id)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("job {id}")))
}

#[utoipa::path(
        get,
        path = "/v1/jobs/{id}/result",
        params(("id" = String, Path, description = "Job ID")),
        responses(
            (status = 200, description = "Solve result", body = SolveResult),
            (status = 202, description = "Not finished yet", body = jobs::JobStatus),
            (status = 404, description = "Unknown job", body = crate::error::ErrorBody)
        )
    )]
pub async fn result(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    match state.jobs.get(&id) {
        Some(JobStatus::Solved { result }) => Ok(Json(result).into_response()),
        Some(other) => Ok((StatusCode::ACCEPTED, Json(other)).into_response()),
        None => Err(ApiError::NotFound(format!("job {id}"))),
    }
}
