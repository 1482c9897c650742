use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::address::Coordinates;

#[derive(Debug, Deserialize, Validate)]
pub struct QuoteByAddressRequest {
    #[validate(length(min = 1, max = 300, message = "La dirección es requerida"))]
    pub direccion: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct QuoteByCoordinatesRequest {
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitud: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitud: f64,
}

impl QuoteByCoordinatesRequest {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitud, self.longitud)
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct ReverseGeocodeQuery {
    #[validate(range(min = -90.0, max = 90.0))]
    pub lat: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    pub lng: f64,
}

#[derive(Debug, Serialize)]
pub struct ReverseGeocodeResponse {
    pub direccion: String,
}

/// Parámetros de la limpieza de cachés (por defecto 30 días)
#[derive(Debug, Default, Deserialize, Validate)]
pub struct CacheCleanupRequest {
    #[validate(range(min = 1, max = 3650))]
    pub dias: Option<i64>,
}
