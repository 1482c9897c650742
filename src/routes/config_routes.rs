use axum::{
    extract::State,
    routing::get,
    Json, Router,
};

use crate::controllers::config_controller::ConfigController;
use crate::dto::config_dto::UpdateConfigRequest;
use crate::dto::ApiResponse;
use crate::models::auth::AuthenticatedUser;
use crate::models::config::RestaurantConfig;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_config_router() -> Router<AppState> {
    Router::new().route("/", get(get_config).put(update_config))
}

async fn get_config(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
) -> Result<Json<ApiResponse<RestaurantConfig>>, AppError> {
    let controller = ConfigController::new(state.config_store.clone());
    let response = controller.get_active().await?;
    Ok(Json(response))
}

async fn update_config(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<UpdateConfigRequest>,
) -> Result<Json<ApiResponse<RestaurantConfig>>, AppError> {
    let controller = ConfigController::new(state.config_store.clone());
    let response = controller.update(&user, request).await?;
    Ok(Json(response))
}
