//! Motor de distancia y ruta
//!
//! Línea recta (Haversine) para decidir cobertura; proveedor de rutas para
//! la distancia real, con caché y con una estimación corregida cuando el
//! proveedor no responde.

use chrono::{Duration, Utc};
use std::sync::Arc;

use crate::models::address::Coordinates;
use crate::models::config::RestaurantConfig;
use crate::models::route::{RouteCacheEntry, RouteQuote, RouteSource};
use crate::repositories::RouteCacheRepository;
use crate::services::pricing::{price_delivery, round2};
use crate::services::routing_service::{RouteSummary, RoutingProvider};
use crate::utils::errors::AppResult;

pub const RADIO_TIERRA_KM: f64 = 6371.0;

/// Factor de corrección de línea recta a red vial
pub const FACTOR_RED_VIAL: f64 = 1.3;

/// Minutos estimados por kilómetro cuando no hay datos del proveedor
pub const MINUTOS_POR_KM: f64 = 3.0;

/// Distancia de gran círculo en kilómetros
pub fn haversine_km(origen: Coordinates, destino: Coordinates) -> f64 {
    let lat1 = origen.latitud.to_radians();
    let lat2 = destino.latitud.to_radians();
    let d_lat = (destino.latitud - origen.latitud).to_radians();
    let d_lng = (destino.longitud - origen.longitud).to_radians();

    let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    RADIO_TIERRA_KM * c
}

fn route_cache_key(origen: Coordinates, destino: Coordinates) -> String {
    format!("{}|{}", origen.cache_key(), destino.cache_key())
}

pub struct RouteEngine {
    routing: Arc<dyn RoutingProvider>,
    cache: Arc<dyn RouteCacheRepository>,
}

impl RouteEngine {
    pub fn new(routing: Arc<dyn RoutingProvider>, cache: Arc<dyn RouteCacheRepository>) -> Self {
        Self { routing, cache }
    }

    /// Cotiza la ruta entre el restaurante y el destino.
    ///
    /// Las fallas del proveedor nunca llegan al llamador: se usa la
    /// estimación. `None` solo cuando la configuración no permite tarifar.
    pub async fn compute_route(
        &self,
        origen: Coordinates,
        destino: Coordinates,
        config: &RestaurantConfig,
    ) -> Option<RouteQuote> {
        if let Err(e) = config.check_consistency() {
            log::error!("❌ Configuración inválida para calcular ruta: {}", e);
            return None;
        }
        if !destino.is_finite() {
            log::error!("❌ Coordenadas de destino inválidas: {:?}", destino);
            return None;
        }

        let directa = haversine_km(origen, destino);

        if directa > config.distancia_maxima_km {
            log::info!(
                "📍 Destino fuera de cobertura: {:.2} km (máximo {:.2} km)",
                directa,
                config.distancia_maxima_km
            );
            let duracion = (directa * MINUTOS_POR_KM).round() as i64;
            return Some(RouteQuote::out_of_coverage(
                round2(directa),
                duracion,
                config.distancia_base_km,
            ));
        }

        let (summary, fuente) = self.driving_summary(origen, destino, directa).await;

        let distancia_km = round2(summary.distancia_km);
        let duracion_minutos = summary.duracion_minutos.round() as i64 + i64::from(config.tiempo_preparacion_min);

        match price_delivery(distancia_km, config) {
            Ok(tarifa) => {
                log::info!(
                    "🛵 Ruta {:?}: {:.2} km, {} min, ${}",
                    fuente,
                    distancia_km,
                    duracion_minutos,
                    tarifa.costo_total
                );
                Some(RouteQuote::with_pricing(distancia_km, duracion_minutos, tarifa, fuente))
            }
            Err(e) => {
                log::error!("❌ No se pudo calcular la tarifa: {}", e);
                None
            }
        }
    }

    /// Distancia y duración de manejo: caché, proveedor o estimación
    async fn driving_summary(
        &self,
        origen: Coordinates,
        destino: Coordinates,
        directa: f64,
    ) -> (RouteSummary, RouteSource) {
        let clave = route_cache_key(origen, destino);

        match self.cache.find_by_key(&clave).await {
            Ok(Some(entry)) => {
                log::debug!("✅ Ruta encontrada en caché: {}", clave);
                let summary = RouteSummary {
                    distancia_km: entry.distancia_km,
                    duracion_minutos: entry.duracion_minutos,
                };
                return (summary, RouteSource::Cache);
            }
            Ok(None) => {}
            Err(e) => log::warn!("⚠️ No se pudo leer la caché de rutas: {}", e),
        }

        match self.routing.driving_route(origen, destino).await {
            Ok(summary) if summary.distancia_km.is_finite() && summary.duracion_minutos.is_finite() => {
                let entry = RouteCacheEntry::new(clave, summary.distancia_km, summary.duracion_minutos);
                if let Err(e) = self.cache.insert(&entry).await {
                    log::warn!("⚠️ No se pudo guardar la ruta en caché: {}", e);
                }
                (summary, RouteSource::Proveedor)
            }
            Ok(summary) => {
                log::warn!("⚠️ Proveedor de rutas devolvió valores inválidos: {:?}", summary);
                (Self::estimate(directa), RouteSource::Estimacion)
            }
            Err(e) => {
                log::warn!("⚠️ Proveedor de rutas no disponible, usando estimación: {}", e);
                (Self::estimate(directa), RouteSource::Estimacion)
            }
        }
    }

    /// Borra rutas cacheadas más viejas que `antiguedad`
    pub async fn evict_older_than(&self, antiguedad: Duration) -> AppResult<u64> {
        let borradas = self.cache.delete_older_than(Utc::now() - antiguedad).await?;
        log::info!("🧹 Caché de rutas: {} entradas eliminadas", borradas);
        Ok(borradas)
    }

    fn estimate(directa: f64) -> RouteSummary {
        let distancia_km = directa * FACTOR_RED_VIAL;
        RouteSummary {
            distancia_km,
            duracion_minutos: distancia_km * MINUTOS_POR_KM,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::config::fixtures::restaurant_config;
    use crate::repositories::InMemoryStore;
    use crate::testing::FakeRouting;
    use rust_decimal::Decimal;

    fn engine(routing: Arc<FakeRouting>, store: Arc<InMemoryStore>) -> RouteEngine {
        RouteEngine::new(routing, store)
    }

    /// Punto a `km` kilómetros al norte del restaurante de prueba
    fn north_of(config: &RestaurantConfig, km: f64) -> Coordinates {
        let grados = km / (RADIO_TIERRA_KM * std::f64::consts::PI / 180.0);
        Coordinates::new(config.latitud + grados, config.longitud)
    }

    #[test]
    fn test_haversine_known_distance() {
        // Plaza de Bolívar -> Parque de la 93, ~9.3 km
        let d = haversine_km(Coordinates::new(4.5981, -74.0760), Coordinates::new(4.6767, -74.0483));
        assert!((d - 9.27).abs() < 0.1, "distancia {}", d);
        assert_eq!(haversine_km(Coordinates::new(4.6, -74.0), Coordinates::new(4.6, -74.0)), 0.0);
    }

    #[tokio::test]
    async fn test_out_of_coverage_skips_provider() {
        let config = restaurant_config();
        let routing = Arc::new(FakeRouting::returning(15.0, 30.0));
        let engine = engine(routing.clone(), Arc::new(InMemoryStore::new()));

        let quote = engine
            .compute_route(config.origen(), north_of(&config, 12.0), &config)
            .await
            .unwrap();

        assert!(quote.fuera_de_cobertura);
        assert_eq!(quote.costo_domicilio, Decimal::ZERO);
        assert_eq!(quote.duracion_minutos, 36);
        assert_eq!(routing.calls(), 0);
    }

    #[tokio::test]
    async fn test_provider_result_is_priced_and_cached() {
        let config = restaurant_config();
        let routing = Arc::new(FakeRouting::returning(5.2, 14.6));
        let store = Arc::new(InMemoryStore::new());
        let engine = engine(routing.clone(), store.clone());
        let destino = north_of(&config, 4.0);

        let quote = engine.compute_route(config.origen(), destino, &config).await.unwrap();
        assert_eq!(quote.fuente, RouteSource::Proveedor);
        assert_eq!(quote.distancia_km, 5.2);
        assert_eq!(quote.costo_domicilio, Decimal::from(5800));
        assert_eq!(quote.costo_exceso, Decimal::from(1800));
        assert_eq!(quote.duracion_minutos, 15 + 20);

        let again = engine.compute_route(config.origen(), destino, &config).await.unwrap();
        assert_eq!(again.fuente, RouteSource::Cache);
        assert_eq!(again.costo_domicilio, quote.costo_domicilio);
        assert_eq!(routing.calls(), 1);
        assert_eq!(store.route_cache_len().await, 1);
    }

    #[tokio::test]
    async fn test_provider_failure_falls_back_to_estimate() {
        let config = restaurant_config();
        let routing = Arc::new(FakeRouting::failing());
        let store = Arc::new(InMemoryStore::new());
        let engine = engine(routing.clone(), store.clone());

        let quote = engine
            .compute_route(config.origen(), north_of(&config, 4.0), &config)
            .await
            .unwrap();

        // 4 km * 1.3 = 5.2 km; 15.6 min de viaje + 20 de preparación
        assert_eq!(quote.fuente, RouteSource::Estimacion);
        assert_eq!(quote.distancia_km, 5.2);
        assert_eq!(quote.costo_domicilio, Decimal::from(5800));
        assert_eq!(quote.duracion_minutos, 16 + 20);
        assert!(!quote.fuera_de_cobertura);
        assert_eq!(store.route_cache_len().await, 0);
    }

    #[tokio::test]
    async fn test_malformed_config_returns_none() {
        let mut config = restaurant_config();
        config.distancia_base_km = f64::NAN;
        let engine = engine(Arc::new(FakeRouting::returning(1.0, 1.0)), Arc::new(InMemoryStore::new()));

        assert!(engine
            .compute_route(config.origen(), north_of(&config, 1.0), &config)
            .await
            .is_none());
    }
}
