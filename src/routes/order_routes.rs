use axum::{
    extract::{Path, State},
    routing::{get, post, put},
    Json, Router,
};
use uuid::Uuid;

use crate::controllers::order_controller::OrderController;
use crate::dto::order_dto::{
    AdvanceStatusRequest, CancelOrderRequest, CreateOrderRequest, CreateOrderResponse,
    OrderLookupResponse, SettleOrderRequest, SettlementResponse,
};
use crate::dto::ApiResponse;
use crate::models::auth::AuthenticatedUser;
use crate::models::order::{HistorialEntry, Order};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_order_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_order))
        .route("/by-phone/:phone", get(find_by_phone))
        .route("/:id/cancel", post(cancel_order))
        .route("/:id/status", put(advance_status))
        .route("/:id/settle", post(settle_order))
        .route("/:id/print", post(register_print))
}

fn controller(state: &AppState) -> OrderController {
    OrderController::new(state.orders.clone(), state.status.clone(), state.checkout.clone())
}

async fn create_order(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<CreateOrderRequest>,
) -> Result<Json<ApiResponse<CreateOrderResponse>>, AppError> {
    let response = controller(&state).create(&user, request).await?;
    Ok(Json(response))
}

async fn find_by_phone(
    State(state): State<AppState>,
    Path(phone): Path<String>,
) -> Result<Json<ApiResponse<OrderLookupResponse>>, AppError> {
    let response = controller(&state).find_by_phone(&phone).await?;
    Ok(Json(response))
}

async fn cancel_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    request: Option<Json<CancelOrderRequest>>,
) -> Result<Json<ApiResponse<Order>>, AppError> {
    let request = request.map(|Json(body)| body).unwrap_or_default();
    let response = controller(&state).cancel(id, request).await?;
    Ok(Json(response))
}

async fn advance_status(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(request): Json<AdvanceStatusRequest>,
) -> Result<Json<ApiResponse<Order>>, AppError> {
    let response = controller(&state).advance_status(&user, id, request).await?;
    Ok(Json(response))
}

async fn settle_order(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(request): Json<SettleOrderRequest>,
) -> Result<Json<ApiResponse<SettlementResponse>>, AppError> {
    let response = controller(&state).settle(&user, id, request).await?;
    Ok(Json(response))
}

async fn register_print(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<HistorialEntry>>, AppError> {
    let response = controller(&state).register_print(&user, id).await?;
    Ok(Json(response))
}
