//! Cotización de domicilios
//!
//! Composición secuencial: configuración, servicio activo, dirección o
//! zona de servicio, y ruta. El primer paso que falla corta la cotización
//! con su propio código.

use chrono::{Duration, Local, NaiveTime};
use serde::Serialize;
use std::sync::Arc;

use crate::models::address::{Coordinates, GeocodedAddress, ServiceArea};
use crate::models::config::RestaurantConfig;
use crate::models::route::RouteQuote;
use crate::repositories::ConfigProvider;
use crate::services::address_cache_service::AddressCacheService;
use crate::services::route_engine::RouteEngine;
use crate::utils::errors::{codes, AppError, AppResult};
use crate::utils::validation::validate_coordinates;

/// Retención de las cachés de direcciones y rutas
pub const RETENCION_CACHE_DIAS: i64 = 30;

#[derive(Debug, Clone, Serialize)]
pub struct DeliveryQuote {
    pub direccion: GeocodedAddress,
    pub ruta: RouteQuote,
    /// Informativo: el horario no bloquea la cotización
    pub restaurante_abierto: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheCleanup {
    pub direcciones: u64,
    pub rutas: u64,
}

/// Configuración activa o `CONFIGURACION_FALTANTE`
pub async fn require_config<P: ConfigProvider + ?Sized>(provider: &P) -> AppResult<RestaurantConfig> {
    provider.get_active_config().await?.ok_or_else(|| {
        AppError::business(
            codes::CONFIGURACION_FALTANTE,
            "No hay configuración del restaurante",
        )
    })
}

/// Falla con `SERVICIO_DESHABILITADO` si los domicilios están apagados
pub fn require_delivery_enabled(config: &RestaurantConfig) -> AppResult<()> {
    if !config.domicilio_activo {
        return Err(AppError::business(
            codes::SERVICIO_DESHABILITADO,
            "El servicio de domicilios está deshabilitado",
        ));
    }
    Ok(())
}

pub struct DeliveryQuoteService {
    config: Arc<dyn ConfigProvider>,
    geocoder: Arc<AddressCacheService>,
    engine: Arc<RouteEngine>,
    area: ServiceArea,
}

impl DeliveryQuoteService {
    pub fn new(
        config: Arc<dyn ConfigProvider>,
        geocoder: Arc<AddressCacheService>,
        engine: Arc<RouteEngine>,
        area: ServiceArea,
    ) -> Self {
        Self {
            config,
            geocoder,
            engine,
            area,
        }
    }

    pub async fn quote_by_address(&self, direccion: &str) -> AppResult<DeliveryQuote> {
        self.quote_by_address_at(direccion, Local::now().time()).await
    }

    pub async fn quote_by_address_at(&self, direccion: &str, hora: NaiveTime) -> AppResult<DeliveryQuote> {
        let config = self.enabled_config().await?;

        if direccion.trim().is_empty() {
            return Err(AppError::ValidationError("La dirección es requerida".to_string()));
        }

        let geocoded = self.geocoder.geocode(direccion).await.ok_or_else(|| {
            AppError::business(
                codes::DIRECCION_NO_ENCONTRADA,
                format!("No se encontró la dirección '{}'", direccion.trim()),
            )
        })?;

        let ruta = self.route(&config, geocoded.coordinates()).await?;
        Ok(DeliveryQuote {
            direccion: geocoded,
            ruta,
            restaurante_abierto: config.esta_abierto(hora),
        })
    }

    pub async fn quote_by_coordinates(&self, punto: Coordinates) -> AppResult<DeliveryQuote> {
        self.quote_by_coordinates_at(punto, Local::now().time()).await
    }

    pub async fn quote_by_coordinates_at(&self, punto: Coordinates, hora: NaiveTime) -> AppResult<DeliveryQuote> {
        let config = self.enabled_config().await?;

        validate_coordinates(punto.latitud, punto.longitud)
            .map_err(|_| AppError::ValidationError("Coordenadas inválidas".to_string()))?;

        if !self.area.contains(punto) {
            return Err(AppError::business(
                codes::FUERA_DE_ZONA,
                "La ubicación está fuera de la zona de servicio",
            ));
        }

        let ruta = self.route(&config, punto).await?;
        let direccion = GeocodedAddress {
            direccion_formateada: self.geocoder.reverse_geocode(punto).await,
            latitud: punto.latitud,
            longitud: punto.longitud,
            ciudad: None,
            barrio: None,
        };

        Ok(DeliveryQuote {
            direccion,
            ruta,
            restaurante_abierto: config.esta_abierto(hora),
        })
    }

    pub async fn reverse_geocode(&self, punto: Coordinates) -> String {
        self.geocoder.reverse_geocode(punto).await
    }

    /// Limpieza de cachés; la programa un cron externo
    pub async fn evict_caches(&self, antiguedad: Duration) -> AppResult<CacheCleanup> {
        let direcciones = self.geocoder.evict_older_than(antiguedad).await?;
        let rutas = self.engine.evict_older_than(antiguedad).await?;
        Ok(CacheCleanup { direcciones, rutas })
    }

    async fn enabled_config(&self) -> AppResult<RestaurantConfig> {
        let config = require_config(self.config.as_ref()).await?;
        require_delivery_enabled(&config)?;
        Ok(config)
    }

    async fn route(&self, config: &RestaurantConfig, destino: Coordinates) -> AppResult<RouteQuote> {
        self.engine
            .compute_route(config.origen(), destino, config)
            .await
            .ok_or_else(|| AppError::business(codes::RUTA_FALLIDA, "No se pudo calcular la ruta"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::config::fixtures::restaurant_config;
    use crate::models::route::RouteSource;
    use crate::repositories::InMemoryStore;
    use crate::testing::{FakeGeocoder, FakeRouting};
    use rust_decimal::Decimal;

    const DIRECCION: &str = "Carrera 7 # 72-41";

    struct Harness {
        service: DeliveryQuoteService,
        routing: Arc<FakeRouting>,
        geocoder: Arc<FakeGeocoder>,
    }

    fn harness(config: Option<RestaurantConfig>, routing: FakeRouting) -> Harness {
        let store = Arc::new(match config {
            Some(config) => InMemoryStore::with_config(config),
            None => InMemoryStore::new(),
        });
        let geocoder = Arc::new(FakeGeocoder::new().with_address(DIRECCION, 4.6550, -74.0560));
        let routing = Arc::new(routing);
        let service = DeliveryQuoteService::new(
            store.clone(),
            Arc::new(AddressCacheService::new(geocoder.clone(), store.clone())),
            Arc::new(RouteEngine::new(routing.clone(), store)),
            ServiceArea::default(),
        );
        Harness {
            service,
            routing,
            geocoder,
        }
    }

    fn mediodia() -> NaiveTime {
        NaiveTime::from_hms_opt(12, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_quote_by_address_happy_path() {
        let h = harness(Some(restaurant_config()), FakeRouting::returning(5.2, 12.0));
        let quote = h.service.quote_by_address_at(DIRECCION, mediodia()).await.unwrap();

        assert_eq!(quote.ruta.costo_domicilio, Decimal::from(5800));
        assert_eq!(quote.ruta.fuente, RouteSource::Proveedor);
        assert_eq!(quote.ruta.duracion_minutos, 32);
        assert!(quote.restaurante_abierto);
        assert_eq!(h.geocoder.search_calls(), 1);
    }

    #[tokio::test]
    async fn test_missing_config_is_checked_first() {
        let h = harness(None, FakeRouting::returning(5.2, 12.0));
        let error = h.service.quote_by_address_at("", mediodia()).await.unwrap_err();
        assert_eq!(error.code(), codes::CONFIGURACION_FALTANTE);
    }

    #[tokio::test]
    async fn test_disabled_service() {
        let mut config = restaurant_config();
        config.domicilio_activo = false;
        let h = harness(Some(config), FakeRouting::returning(5.2, 12.0));

        let error = h
            .service
            .quote_by_coordinates_at(Coordinates::new(4.65, -74.05), mediodia())
            .await
            .unwrap_err();
        assert_eq!(error.code(), codes::SERVICIO_DESHABILITADO);
        assert_eq!(h.routing.calls(), 0);
    }

    #[tokio::test]
    async fn test_address_not_found() {
        let h = harness(Some(restaurant_config()), FakeRouting::returning(5.2, 12.0));
        let error = h
            .service
            .quote_by_address_at("Calle que no existe", mediodia())
            .await
            .unwrap_err();
        assert_eq!(error.code(), codes::DIRECCION_NO_ENCONTRADA);
    }

    #[tokio::test]
    async fn test_coordinates_outside_service_area() {
        let h = harness(Some(restaurant_config()), FakeRouting::returning(5.2, 12.0));
        let error = h
            .service
            .quote_by_coordinates_at(Coordinates::new(6.2442, -75.5812), mediodia())
            .await
            .unwrap_err();
        assert_eq!(error.code(), codes::FUERA_DE_ZONA);
        assert_eq!(h.routing.calls(), 0);
    }

    #[tokio::test]
    async fn test_route_failure_when_config_is_malformed() {
        let mut config = restaurant_config();
        config.distancia_maxima_km = f64::NAN;
        let h = harness(Some(config), FakeRouting::returning(5.2, 12.0));

        let error = h
            .service
            .quote_by_coordinates_at(Coordinates::new(4.65, -74.05), mediodia())
            .await
            .unwrap_err();
        assert_eq!(error.code(), codes::RUTA_FALLIDA);
    }

    #[tokio::test]
    async fn test_quote_by_coordinates_uses_fallback_label() {
        let h = harness(Some(restaurant_config()), FakeRouting::failing());
        let quote = h
            .service
            .quote_by_coordinates_at(Coordinates::new(4.63, -74.07), NaiveTime::from_hms_opt(23, 0, 0).unwrap())
            .await
            .unwrap();

        assert_eq!(quote.direccion.direccion_formateada, "4.630000, -74.070000");
        assert_eq!(quote.ruta.fuente, RouteSource::Estimacion);
        assert!(!quote.restaurante_abierto);
        assert_eq!(quote.ruta.costo_domicilio % Decimal::ONE_HUNDRED, Decimal::ZERO);
    }
}
