//! Configuración de variables de entorno
//!
//! Este módulo maneja la configuración del entorno y variables de configuración.

use std::env;

use crate::models::address::{Coordinates, ServiceArea};

/// Almacenamiento usado por los repositorios
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    /// Solo para desarrollo local y pruebas: los datos se pierden al reiniciar
    Memory,
}

/// Configuración del entorno
#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    pub environment: String,
    pub port: u16,
    pub host: String,
    pub jwt_secret: String,
    pub jwt_expiration: u64,
    pub cors_origins: Vec<String>,
    pub storage: StorageBackend,
    pub http_timeout_secs: u64,
    // Geocodificación (Nominatim)
    pub geocoder_base_url: String,
    pub geocoder_user_agent: String,
    pub geocoder_city: String,
    pub geocoder_country: String,
    // Rutas (OpenRouteService)
    pub routing_base_url: String,
    pub routing_api_key: Option<String>,
    // Zona de servicio para cotizar por coordenadas
    pub service_area: ServiceArea,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            port: 3000,
            host: "0.0.0.0".to_string(),
            jwt_secret: "development-secret".to_string(),
            jwt_expiration: 12 * 3600,
            cors_origins: Vec::new(),
            storage: StorageBackend::Postgres,
            http_timeout_secs: 10,
            geocoder_base_url: "https://nominatim.openstreetmap.org".to_string(),
            geocoder_user_agent: "RestaurantDelivery/1.0".to_string(),
            geocoder_city: "Bogotá".to_string(),
            geocoder_country: "Colombia".to_string(),
            routing_base_url: "https://api.openrouteservice.org".to_string(),
            routing_api_key: None,
            service_area: ServiceArea::default(),
        }
    }
}

impl EnvironmentConfig {
    /// Leer la configuración desde variables de entorno, con valores por
    /// defecto para todo lo opcional.
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();

        let port = match env::var("PORT") {
            Ok(value) => value
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            Err(_) => defaults.port,
        };

        let jwt_expiration = match env::var("JWT_EXPIRATION") {
            Ok(value) => value
                .parse()
                .map_err(|_| anyhow::anyhow!("JWT_EXPIRATION must be a valid number"))?,
            Err(_) => defaults.jwt_expiration,
        };

        let http_timeout_secs = match env::var("HTTP_TIMEOUT_SECS") {
            Ok(value) => value
                .parse()
                .map_err(|_| anyhow::anyhow!("HTTP_TIMEOUT_SECS must be a valid number"))?,
            Err(_) => defaults.http_timeout_secs,
        };

        let storage = match env::var("STORAGE_BACKEND").as_deref() {
            Ok("memory") => StorageBackend::Memory,
            Ok("postgres") | Err(_) => StorageBackend::Postgres,
            Ok(other) => anyhow::bail!("STORAGE_BACKEND desconocido: {}", other),
        };

        let environment = env::var("ENVIRONMENT").unwrap_or(defaults.environment);
        let jwt_secret = match env::var("JWT_SECRET") {
            Ok(secret) => secret,
            Err(_) if environment == "production" => {
                anyhow::bail!("JWT_SECRET must be set in production")
            }
            Err(_) => defaults.jwt_secret,
        };

        Ok(Self {
            environment,
            port,
            host: env::var("HOST").unwrap_or(defaults.host),
            jwt_secret,
            jwt_expiration,
            cors_origins: env::var("CORS_ORIGINS")
                .map(|origins| {
                    origins
                        .split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            storage,
            http_timeout_secs,
            geocoder_base_url: env::var("GEOCODER_BASE_URL").unwrap_or(defaults.geocoder_base_url),
            geocoder_user_agent: env::var("GEOCODER_USER_AGENT").unwrap_or(defaults.geocoder_user_agent),
            geocoder_city: env::var("GEOCODER_CITY").unwrap_or(defaults.geocoder_city),
            geocoder_country: env::var("GEOCODER_COUNTRY").unwrap_or(defaults.geocoder_country),
            routing_base_url: env::var("ROUTING_BASE_URL").unwrap_or(defaults.routing_base_url),
            routing_api_key: env::var("ROUTING_API_KEY").ok().filter(|key| !key.trim().is_empty()),
            service_area: service_area_from_env(defaults.service_area)?,
        })
    }

    /// Verificar si estamos en modo desarrollo
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// Verificar si estamos en modo producción
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Obtener la URL del servidor
    pub fn server_url(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn service_area_from_env(default: ServiceArea) -> anyhow::Result<ServiceArea> {
    let read = |name: &str, fallback: f64| -> anyhow::Result<f64> {
        match env::var(name) {
            Ok(value) => value
                .parse()
                .map_err(|_| anyhow::anyhow!("{} must be a valid number", name)),
            Err(_) => Ok(fallback),
        }
    };

    let area = ServiceArea {
        min: Coordinates::new(
            read("SERVICE_AREA_LAT_MIN", default.min.latitud)?,
            read("SERVICE_AREA_LNG_MIN", default.min.longitud)?,
        ),
        max: Coordinates::new(
            read("SERVICE_AREA_LAT_MAX", default.max.latitud)?,
            read("SERVICE_AREA_LNG_MAX", default.max.longitud)?,
        ),
    };

    if area.min.latitud >= area.max.latitud || area.min.longitud >= area.max.longitud {
        anyhow::bail!("SERVICE_AREA_* define una zona vacía");
    }

    Ok(area)
}
