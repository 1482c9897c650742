use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::dto::config_dto::UpdateConfigRequest;
use crate::dto::ApiResponse;
use crate::middleware::auth::require_config_permission;
use crate::models::auth::AuthenticatedUser;
use crate::models::config::RestaurantConfig;
use crate::repositories::ConfigStore;
use crate::services::delivery_quote_service::require_config;
use crate::utils::errors::AppError;

pub struct ConfigController {
    store: Arc<dyn ConfigStore>,
}

impl ConfigController {
    pub fn new(store: Arc<dyn ConfigStore>) -> Self {
        Self { store }
    }

    pub async fn get_active(&self) -> Result<ApiResponse<RestaurantConfig>, AppError> {
        let config = require_config(self.store.as_ref()).await?;
        Ok(ApiResponse::success(config))
    }

    pub async fn update(
        &self,
        user: &AuthenticatedUser,
        request: UpdateConfigRequest,
    ) -> Result<ApiResponse<RestaurantConfig>, AppError> {
        require_config_permission(user)?;
        request.validate()?;

        let id = self
            .store
            .get_active_config()
            .await?
            .map(|actual| actual.id)
            .unwrap_or_else(Uuid::new_v4);

        let config = RestaurantConfig {
            id,
            domicilio_activo: request.domicilio_activo,
            latitud: request.latitud,
            longitud: request.longitud,
            distancia_maxima_km: request.distancia_maxima_km,
            distancia_base_km: request.distancia_base_km,
            costo_base_domicilio: request.costo_base_domicilio,
            costo_por_km: request.costo_por_km,
            tiempo_preparacion_min: request.tiempo_preparacion_min,
            hora_apertura: request.hora_apertura,
            hora_cierre: request.hora_cierre,
            updated_at: Utc::now(),
        };
        config.check_consistency().map_err(AppError::ValidationError)?;

        let saved = self.store.save_active_config(&config).await?;
        log::info!(
            "⚙️ Configuración actualizada por {} (domicilios {})",
            user.usuario_id,
            if saved.domicilio_activo { "activos" } else { "inactivos" }
        );

        Ok(ApiResponse::success_with_message(saved, "Configuración actualizada"))
    }
}
