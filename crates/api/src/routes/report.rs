use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::ApiError;
use crew_core::{Instance, ScheduleMetrics};
use types::{Assignment, InstanceInput, SolveResult, WorkerId};

#[derive(Deserialize, ToSchema)]
pub struct ReportIn {
    pub instance: InstanceInput,
    pub result: SolveResult,
}

#[derive(Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportOut {
    pub status: types::SolveStatus,
    pub objective: i64,
    pub total_duty_hours: f64,
    pub average_utilization: f64,
    pub workers: Vec<WorkerLine>,
    pub idle_workers: Vec<WorkerId>,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct WorkerLine {
    pub worker: WorkerId,
    pub hours: f64,
    pub utilization: f64,
    pub tasks: Vec<Assignment>,
}

#[utoipa::path(
    post,
    path = "/v1/report",
    request_body = ReportIn,
    responses(
    (status = 200, description = "Per-worker breakdown of a finished schedule", body = ReportOut),
    (status = 400, description = "Invalid instance", body = crate::error::ErrorBody)
    )
)]
pub async fn report(Json(input): Json<ReportIn>) -> Result<Json<ReportOut>, ApiError> {
    let inst = Instance::from_input(&input.instance)?;
    let m = ScheduleMetrics::calculate(&input.result, &inst);
    Ok(Json(ReportOut {
        status: input.result.status,
        objective: input.result.objective,
        total_duty_hours: m.total_duty_hours,
        average_utilization: m.average_utilization,
        workers: m
            .workers
            .into_iter()
            .map(|w| WorkerLine {
                worker: w.worker,
                hours: w.hours,
                utilization: w.utilization,
                tasks: w.tasks,
            })
            .collect(),
        idle_workers: m.idle_workers,
    }))
}
