use axum::Json;
use crew_core::validate;
use serde::{Deserialize, Serialize};
use types::InstanceInput;

use crate::error::IssueOut;

#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct ValidationReport {
    pub ok: bool,
    #[serde(default)]
    pub issues: Vec<IssueOut>,
}

#[utoipa::path(
    post,
    path = "/v1/validate",
    request_body = InstanceInput,
    responses(
    (status = 200, description = "Validation result", body = ValidationReport)
    )
)]
pub async fn validate_handler(Json(input): Json<InstanceInput>) -> Json<ValidationReport> {
    match validate(&input) {
        Ok(()) => Json(ValidationReport {
            ok: true,
            issues: vec![],
        }),
        Err(e) => Json(ValidationReport {
            ok: false,
            issues: e.issues().iter().map(IssueOut::from).collect(),
        }),
    }
}
