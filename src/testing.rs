//! Proveedores externos simulados para pruebas
//!
//! Junto con `repositories::memory::InMemoryStore` permiten levantar todos
//! los servicios sin red ni base de datos.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::models::address::{Coordinates, GeocodedAddress};
use crate::services::geocoding_service::GeocodingProvider;
use crate::services::routing_service::{RouteSummary, RoutingProvider};

/// Proveedor de rutas con respuesta fija
pub struct FakeRouting {
    respuesta: Option<RouteSummary>,
    llamadas: AtomicUsize,
}

impl FakeRouting {
    pub fn returning(distancia_km: f64, duracion_minutos: f64) -> Self {
        Self {
            respuesta: Some(RouteSummary {
                distancia_km,
                duracion_minutos,
            }),
            llamadas: AtomicUsize::new(0),
        }
    }

    /// Simula proveedor caído o sin API key
    pub fn failing() -> Self {
        Self {
            respuesta: None,
            llamadas: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.llamadas.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RoutingProvider for FakeRouting {
    async fn driving_route(&self, _origen: Coordinates, _destino: Coordinates) -> Result<RouteSummary> {
        self.llamadas.fetch_add(1, Ordering::SeqCst);
        self.respuesta.ok_or_else(|| anyhow!("proveedor de rutas no disponible"))
    }
}

/// Geocodificador con direcciones conocidas de antemano
#[derive(Default)]
pub struct FakeGeocoder {
    direcciones: HashMap<String, GeocodedAddress>,
    falla: bool,
    busquedas: AtomicUsize,
}

impl FakeGeocoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registra el resultado para el texto exacto que llegará al proveedor
    pub fn with_address(mut self, consulta: &str, latitud: f64, longitud: f64) -> Self {
        self.direcciones.insert(
            consulta.to_string(),
            GeocodedAddress {
                direccion_formateada: format!("{}, Bogotá, Colombia", consulta.trim()),
                latitud,
                longitud,
                ciudad: Some("Bogotá".to_string()),
                barrio: None,
            },
        );
        self
    }

    /// Todas las llamadas fallan como si el proveedor no respondiera
    pub fn failing() -> Self {
        Self {
            falla: true,
            ..Self::default()
        }
    }

    pub fn search_calls(&self) -> usize {
        self.busquedas.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GeocodingProvider for FakeGeocoder {
    async fn search(&self, direccion: &str) -> Result<Option<GeocodedAddress>> {
        self.busquedas.fetch_add(1, Ordering::SeqCst);
        if self.falla {
            return Err(anyhow!("geocodificador no disponible"));
        }
        Ok(self.direcciones.get(direccion.trim()).cloned())
    }

    async fn reverse(&self, punto: Coordinates) -> Result<Option<String>> {
        if self.falla {
            return Err(anyhow!("geocodificador no disponible"));
        }
        let encontrada = self
            .direcciones
            .values()
            .find(|d| d.coordinates().cache_key() == punto.cache_key())
            .map(|d| d.direccion_formateada.clone());
        Ok(encontrada)
    }
}
