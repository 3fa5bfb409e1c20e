use axum::{extract::DefaultBodyLimit, Router};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// JSON log lines, filtered by `RUST_LOG`.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().json())
        .init();
}

/// Request tracing, permissive CORS and the configured body cap.
pub fn with_http_stack(router: Router, body_limit_bytes: usize) -> Router {
    router.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
            .map_response(|res: axum::response::Response<_>| res.map(axum::body::Body::new))
            .layer(DefaultBodyLimit::max(body_limit_bytes))
            .layer(RequestBodyLimitLayer::new(body_limit_bytes)),
    )
}
