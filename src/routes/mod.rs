//! Rutas HTTP
//!
//! Cada grupo de endpoints tiene su router; `create_router` los monta con
//! CORS, compresión y trazas de requests.

pub mod config_routes;
pub mod delivery_routes;
pub mod order_routes;

use axum::{response::Json, routing::get, Router};
use serde_json::json;
use tower_http::{compression::CompressionLayer, trace::TraceLayer};

use crate::middleware::cors::cors_middleware;
use crate::state::AppState;

pub fn create_router(state: AppState) -> Router {
    let cors = cors_middleware(&state.config);

    Router::new()
        .route("/health", get(health))
        .nest("/api/delivery", delivery_routes::create_delivery_router())
        .nest("/api/orders", order_routes::create_order_router())
        .nest("/api/config", config_routes::create_config_router())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "service": "restaurant_delivery",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
