use axum::{
    response::{IntoResponse, Response},
    Json,
};
use crew_core::{Issue, ValidationError};
use http::StatusCode;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug)]
pub enum ApiError {
    Invalid(ValidationError),
    NotFound(String),
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        ApiError::Invalid(e)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, serde::Deserialize, ToSchema)]
pub struct IssueOut {
    pub field: String,
    pub reason: String,
}

impl From<&Issue> for IssueOut {
    fn from(i: &Issue) -> Self {
        Self {
            field: i.field.clone(),
            reason: i.reason.clone(),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<IssueOut>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (code, body) = match self {
            ApiError::Invalid(e) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    error: e.to_string(),
                    issues: e.issues().iter().map(IssueOut::from).collect(),
                },
            ),
            ApiError::NotFound(what) => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    error: format!("{what} not found"),
                    issues: vec![],
                },
            ),
        };
        (code, Json(body)).into_response()
    }
}
