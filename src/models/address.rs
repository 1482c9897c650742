use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Punto geográfico en grados decimales
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitud: f64,
    pub longitud: f64,
}

impl Coordinates {
    pub fn new(latitud: f64, longitud: f64) -> Self {
        Self { latitud, longitud }
    }

    /// Clave estable para cachés: 5 decimales (~1 m)
    pub fn cache_key(&self) -> String {
        format!("{:.5},{:.5}", self.latitud, self.longitud)
    }

    pub fn is_finite(&self) -> bool {
        self.latitud.is_finite() && self.longitud.is_finite()
    }
}

/// Rectángulo que delimita la ciudad atendida
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ServiceArea {
    pub min: Coordinates,
    pub max: Coordinates,
}

impl Default for ServiceArea {
    /// Bogotá D.C. y municipios vecinos
    fn default() -> Self {
        Self {
            min: Coordinates::new(4.45, -74.25),
            max: Coordinates::new(4.85, -73.95),
        }
    }
}

impl ServiceArea {
    pub fn contains(&self, punto: Coordinates) -> bool {
        (self.min.latitud..=self.max.latitud).contains(&punto.latitud)
            && (self.min.longitud..=self.max.longitud).contains(&punto.longitud)
    }
}

/// Resultado de geocodificar una dirección
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodedAddress {
    pub direccion_formateada: String,
    pub latitud: f64,
    pub longitud: f64,
    pub ciudad: Option<String>,
    pub barrio: Option<String>,
}

impl GeocodedAddress {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitud, self.longitud)
    }
}

/// Fila de `cache_direcciones`. Nunca se modifica; solo la limpieza la borra.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AddressCacheEntry {
    pub id: Uuid,
    /// Dirección normalizada usada para buscar
    pub clave: String,
    pub direccion_original: String,
    pub direccion_formateada: String,
    pub latitud: f64,
    pub longitud: f64,
    pub ciudad: Option<String>,
    pub barrio: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl AddressCacheEntry {
    pub fn new(clave: String, direccion_original: &str, geocoded: &GeocodedAddress) -> Self {
        Self {
            id: Uuid::new_v4(),
            clave,
            direccion_original: direccion_original.to_string(),
            direccion_formateada: geocoded.direccion_formateada.clone(),
            latitud: geocoded.latitud,
            longitud: geocoded.longitud,
            ciudad: geocoded.ciudad.clone(),
            barrio: geocoded.barrio.clone(),
            created_at: Utc::now(),
        }
    }
}

impl From<AddressCacheEntry> for GeocodedAddress {
    fn from(entry: AddressCacheEntry) -> Self {
        Self {
            direccion_formateada: entry.direccion_formateada,
            latitud: entry.latitud,
            longitud: entry.longitud,
            ciudad: entry.ciudad,
            barrio: entry.barrio,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_rounds_to_five_decimals() {
        let punto = Coordinates::new(4.6097102, -74.081749);
        assert_eq!(punto.cache_key(), "4.60971,-74.08175");
    }

    #[test]
    fn test_service_area_contains() {
        let area = ServiceArea::default();
        assert!(area.contains(Coordinates::new(4.65, -74.05)));
        assert!(!area.contains(Coordinates::new(6.24, -75.58))); // Medellín
    }
}
