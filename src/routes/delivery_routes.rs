use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};

use crate::controllers::delivery_controller::DeliveryController;
use crate::dto::delivery_dto::{
    CacheCleanupRequest, QuoteByAddressRequest, QuoteByCoordinatesRequest, ReverseGeocodeQuery,
    ReverseGeocodeResponse,
};
use crate::dto::ApiResponse;
use crate::models::auth::AuthenticatedUser;
use crate::services::delivery_quote_service::CacheCleanup;
use crate::services::DeliveryQuote;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_delivery_router() -> Router<AppState> {
    Router::new()
        .route("/quote", post(quote_by_address))
        .route("/quote/coordinates", post(quote_by_coordinates))
        .route("/reverse", get(reverse_geocode))
        .route("/cache/cleanup", post(cleanup_caches))
}

async fn quote_by_address(
    State(state): State<AppState>,
    Json(request): Json<QuoteByAddressRequest>,
) -> Result<Json<ApiResponse<DeliveryQuote>>, AppError> {
    let controller = DeliveryController::new(state.quotes.clone());
    let response = controller.quote_by_address(request).await?;
    Ok(Json(response))
}

async fn quote_by_coordinates(
    State(state): State<AppState>,
    Json(request): Json<QuoteByCoordinatesRequest>,
) -> Result<Json<ApiResponse<DeliveryQuote>>, AppError> {
    let controller = DeliveryController::new(state.quotes.clone());
    let response = controller.quote_by_coordinates(request).await?;
    Ok(Json(response))
}

async fn reverse_geocode(
    State(state): State<AppState>,
    Query(query): Query<ReverseGeocodeQuery>,
) -> Result<Json<ApiResponse<ReverseGeocodeResponse>>, AppError> {
    let controller = DeliveryController::new(state.quotes.clone());
    let response = controller.reverse_geocode(query).await?;
    Ok(Json(response))
}

async fn cleanup_caches(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    request: Option<Json<CacheCleanupRequest>>,
) -> Result<Json<ApiResponse<CacheCleanup>>, AppError> {
    let request = request.map(|Json(body)| body).unwrap_or_default();
    let controller = DeliveryController::new(state.quotes.clone());
    let response = controller.cleanup_caches(&user, request).await?;
    Ok(Json(response))
}
