use axum::extract::DefaultBodyLimit;
use axum::routing::{get, patch};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::handler;
use crate::state::AppState;

/// Build the axum router with all provenance endpoints.
pub fn build_router(state: AppState, config: &ServerConfig) -> Router {
    let cors = if config.allow_any_origin {
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
    };

    Router::new()
        .route("/", get(handler::welcome_handler))
        .route("/v1/health", get(handler::health_handler))
        .route(
            "/api/products",
            get(handler::list_products).post(handler::create_product),
        )
        .route("/api/products/:product_id", get(handler::get_product))
        .route(
            "/api/products/:product_id/transfer",
            patch(handler::transfer_product),
        )
        .layer(DefaultBodyLimit::max(config.max_body_bytes))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
