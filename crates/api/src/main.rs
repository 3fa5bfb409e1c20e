mod cache;
mod config;
mod error;
mod state;
mod telemetry;
pub mod routes {
    pub mod health;
    pub mod jobs;
    pub mod report;
    pub mod solve;
    pub mod validate;
}

use anyhow::Context;
use axum::{
    routing::{get, post},
    Router,
};

use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
        paths(
            routes::health::health,
            routes::solve::solve,
            routes::jobs::status,
            routes::jobs::result,
            routes::validate::validate_handler,
            routes::report::report,
        ),
        components(schemas(
            types::InstanceInput, types::Task, types::ConstraintParams,
            types::SolveParams, types::SolverKind, types::ObjectiveWeights,
            types::SolveEnvelope, types::SolveResult, types::SolveStatus,
            types::Assignment, types::Violation, types::TaskId, types::WorkerId,
            jobs::JobId, jobs::JobStatus,
            error::ErrorBody, error::IssueOut,
            routes::health::Health,
            routes::validate::ValidationReport,
            routes::solve::JobCreated,
            routes::report::ReportIn,
            routes::report::ReportOut,
            routes::report::WorkerLine
        )),
        tags(
            (name = "crewsched", description = "Crew assignment API")
        )
    )]
struct ApiDoc;

fn app(state: state::AppState, body_limit_bytes: usize) -> Router {
    let router = Router::new()
        .route("/v1/health", get(routes::health::health))
        .route("/v1/solve", post(routes::solve::solve))
        .route("/v1/validate", post(routes::validate::validate_handler))
        .route("/v1/report", post(routes::report::report))
        .route("/v1/jobs/:id", get(routes::jobs::status))
        .route("/v1/jobs/:id/result", get(routes::jobs::result))
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
        .with_state(state);
    telemetry::with_http_stack(router, body_limit_bytes)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    telemetry::init_tracing();

    let cfg = config::Config::from_env().context("reading CREWSCHED__ configuration")?;
    let app_state = state::AppState::new(&cfg);
    let app = app(app_state, cfg.body_limit_bytes);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], cfg.port));
    tracing::info!(%addr, cache = cfg.cache_capacity, "listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
