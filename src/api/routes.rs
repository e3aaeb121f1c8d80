use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::request_id::{make_span_with_request_id, request_id_middleware};

use super::{handlers, AppState};

/// Creates the main API router with all routes.
///
/// CORS is permissive so a local front end can call the API directly; the
/// request-id middleware runs outermost so the trace span sees the id.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/search", post(handlers::search))
        .layer(
            ServiceBuilder::new()
                .layer(axum_middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
