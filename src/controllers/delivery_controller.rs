use chrono::Duration;
use std::sync::Arc;
use validator::Validate;

use crate::dto::delivery_dto::{
    CacheCleanupRequest, QuoteByAddressRequest, QuoteByCoordinatesRequest, ReverseGeocodeQuery,
    ReverseGeocodeResponse,
};
use crate::dto::ApiResponse;
use crate::middleware::auth::require_config_permission;
use crate::models::address::Coordinates;
use crate::models::auth::AuthenticatedUser;
use crate::services::delivery_quote_service::{CacheCleanup, RETENCION_CACHE_DIAS};
use crate::services::{DeliveryQuote, DeliveryQuoteService};
use crate::utils::errors::AppError;

pub struct DeliveryController {
    quotes: Arc<DeliveryQuoteService>,
}

impl DeliveryController {
    pub fn new(quotes: Arc<DeliveryQuoteService>) -> Self {
        Self { quotes }
    }

    pub async fn quote_by_address(
        &self,
        request: QuoteByAddressRequest,
    ) -> Result<ApiResponse<DeliveryQuote>, AppError> {
        request.validate()?;

        let quote = self.quotes.quote_by_address(&request.direccion).await?;
        let message = quote_message(&quote);
        Ok(ApiResponse::success_with_message(quote, message))
    }

    pub async fn quote_by_coordinates(
        &self,
        request: QuoteByCoordinatesRequest,
    ) -> Result<ApiResponse<DeliveryQuote>, AppError> {
        request.validate()?;

        let quote = self.quotes.quote_by_coordinates(request.coordinates()).await?;
        let message = quote_message(&quote);
        Ok(ApiResponse::success_with_message(quote, message))
    }

    pub async fn reverse_geocode(
        &self,
        query: ReverseGeocodeQuery,
    ) -> Result<ApiResponse<ReverseGeocodeResponse>, AppError> {
        query.validate()?;

        let punto = Coordinates::new(query.lat, query.lng);
        let direccion = self.quotes.reverse_geocode(punto).await;
        Ok(ApiResponse::success(ReverseGeocodeResponse { direccion }))
    }

    pub async fn cleanup_caches(
        &self,
        user: &AuthenticatedUser,
        request: CacheCleanupRequest,
    ) -> Result<ApiResponse<CacheCleanup>, AppError> {
        require_config_permission(user)?;
        request.validate()?;

        let dias = request.dias.unwrap_or(RETENCION_CACHE_DIAS);
        let cleanup = self.quotes.evict_caches(Duration::days(dias)).await?;

        log::info!(
            "🧹 Cachés limpiadas por {}: {} direcciones, {} rutas",
            user.usuario_id,
            cleanup.direcciones,
            cleanup.rutas
        );

        Ok(ApiResponse::success_with_message(
            cleanup,
            format!("Entradas con más de {} días eliminadas", dias),
        ))
    }
}

fn quote_message(quote: &DeliveryQuote) -> String {
    if quote.ruta.fuera_de_cobertura {
        return format!(
            "La dirección está a {:.2} km, fuera del radio de cobertura",
            quote.ruta.distancia_km
        );
    }
    if !quote.restaurante_abierto {
        return "Cotización calculada. El restaurante está cerrado en este momento".to_string();
    }
    "Cotización calculada".to_string()
}
