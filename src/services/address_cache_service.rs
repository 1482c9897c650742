use chrono::{Duration, Utc};
use std::sync::Arc;

use crate::models::address::{AddressCacheEntry, Coordinates, GeocodedAddress};
use crate::repositories::AddressCacheRepository;
use crate::services::geocoding_service::GeocodingProvider;
use crate::utils::errors::AppResult;
use crate::utils::validation::normalize_address_key;

/// Geocodificador con caché persistente
///
/// Cada dirección distinta (según su clave normalizada) llega al proveedor
/// una sola vez; después se sirve desde `cache_direcciones`.
pub struct AddressCacheService {
    provider: Arc<dyn GeocodingProvider>,
    cache: Arc<dyn AddressCacheRepository>,
}

impl AddressCacheService {
    pub fn new(provider: Arc<dyn GeocodingProvider>, cache: Arc<dyn AddressCacheRepository>) -> Self {
        Self { provider, cache }
    }

    /// Resuelve una dirección libre. `None` significa "dirección no encontrada",
    /// tanto si el proveedor no tuvo resultados como si falló.
    pub async fn geocode(&self, direccion: &str) -> Option<GeocodedAddress> {
        let clave = normalize_address_key(direccion);
        if clave.is_empty() {
            return None;
        }

        log::info!("🔍 Buscando dirección en caché: '{}'", clave);
        match self.cache.find_by_key(&clave).await {
            Ok(Some(entry)) => {
                log::info!("✅ Dirección encontrada en caché: {}", clave);
                return Some(entry.into());
            }
            Ok(None) => {}
            Err(e) => log::warn!("⚠️ No se pudo leer la caché de direcciones: {}", e),
        }

        let geocoded = match self.provider.search(direccion).await {
            Ok(Some(geocoded)) => geocoded,
            Ok(None) => {
                log::warn!("⚠️ Sin resultados de geocodificación para: {}", direccion);
                return None;
            }
            Err(e) => {
                log::error!("❌ Error en geocodificación: {}", e);
                return None;
            }
        };

        log::info!(
            "✅ Geocodificación exitosa: {} -> ({}, {})",
            direccion,
            geocoded.latitud,
            geocoded.longitud
        );

        let entry = AddressCacheEntry::new(clave, direccion, &geocoded);
        if let Err(e) = self.cache.insert(&entry).await {
            log::warn!("⚠️ No se pudo guardar la dirección en caché: {}", e);
        }

        Some(geocoded)
    }

    /// Dirección legible para unas coordenadas; nunca falla.
    /// Sin respuesta del proveedor devuelve `"lat, lng"`.
    pub async fn reverse_geocode(&self, punto: Coordinates) -> String {
        match self.provider.reverse(punto).await {
            Ok(Some(direccion)) => direccion,
            Ok(None) => fallback_label(punto),
            Err(e) => {
                log::warn!("⚠️ Geocodificación inversa falló: {}", e);
                fallback_label(punto)
            }
        }
    }

    /// Borra entradas más viejas que `antiguedad`
    pub async fn evict_older_than(&self, antiguedad: Duration) -> AppResult<u64> {
        let borradas = self.cache.delete_older_than(Utc::now() - antiguedad).await?;
        log::info!("🧹 Caché de direcciones: {} entradas eliminadas", borradas);
        Ok(borradas)
    }
}

fn fallback_label(punto: Coordinates) -> String {
    format!("{:.6}, {:.6}", punto.latitud, punto.longitud)
}
