use crate::cache::ResultCache;
use crate::error::ApiError;
use crate::state::AppState;
use axum::{extract::State, Json};
use crew_core::{validate_params, Instance};
use serde::Serialize;
use tracing::debug;
use types::{SolveEnvelope, SolveStatus};
use utoipa::ToSchema;

#[derive(Serialize, serde::Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JobCreated {
    pub job_id: String,
    pub status: String,
    /// The result was served from the cache; the job is already solved.
    pub cached: bool,
}

#[utoipa::path(
        post,
        path = "/v1/solve",
        request_body = SolveEnvelope,
        responses(
            (status = 200, description = "Job enqueued", body = JobCreated),
            (status = 400, description = "Invalid instance or params", body = crate::error::ErrorBody)
        )
    )]
pub async fn solve(
    State(state): State<AppState>,
    Json(env): Json<SolveEnvelope>,
) -> Result<Json<JobCreated>, ApiError> {
    let instance = Instance::from_input(&env.instance)?;
    validate_params(&env.params)?;

    let key = ResultCache::key(&env);
    if let Some(hit) = key.and_then(|k| state.cache.get(k)) {
        debug!(?key, entries = state.cache.len(), "serving cached result");
        let id = state.jobs.complete(hit);
        return Ok(Json(JobCreated {
            job_id: id.0,
            status: "Solved".into(),
            cached: true,
        }));
    }

    let cache = state.cache.clone();
    let id = state.jobs.enqueue_then(instance, env.params, move |result| {
        // Only proven outcomes are worth replaying.
        if let (Some(k), SolveStatus::Optimal | SolveStatus::Infeasible) = (key, result.status) {
            cache.insert(k, result.clone());
        }
    });
    Ok(Json(JobCreated {
        job_id: id.0,
        status: "Queued".into(),
        cached: false,
    }))
}
