//! Modelo de ruta y tarifa de domicilio
//!
//! `RouteQuote` es transitorio: se calcula en cada cotización. Lo único
//! que se persiste es la respuesta del proveedor de rutas en `cache_rutas`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Desglose de la tarifa de domicilio
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingBreakdown {
    pub costo_total: Decimal,
    pub distancia_base_km: f64,
    pub costo_base: Decimal,
    pub distancia_exceso_km: f64,
    /// Incluye el redondeo a la centena, así que `costo_base + costo_exceso == costo_total`
    pub costo_exceso: Decimal,
}

/// De dónde salió la distancia de la ruta
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteSource {
    Proveedor,
    Cache,
    /// Línea recta corregida porque el proveedor no respondió
    Estimacion,
    FueraDeCobertura,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteQuote {
    pub distancia_km: f64,
    pub duracion_minutos: i64,
    pub costo_domicilio: Decimal,
    pub fuera_de_cobertura: bool,
    pub distancia_base_km: f64,
    pub costo_base: Decimal,
    pub distancia_exceso_km: f64,
    pub costo_exceso: Decimal,
    pub fuente: RouteSource,
}

impl RouteQuote {
    pub fn with_pricing(
        distancia_km: f64,
        duracion_minutos: i64,
        pricing: PricingBreakdown,
        fuente: RouteSource,
    ) -> Self {
        Self {
            distancia_km,
            duracion_minutos,
            costo_domicilio: pricing.costo_total,
            fuera_de_cobertura: false,
            distancia_base_km: pricing.distancia_base_km,
            costo_base: pricing.costo_base,
            distancia_exceso_km: pricing.distancia_exceso_km,
            costo_exceso: pricing.costo_exceso,
            fuente,
        }
    }

    /// Cotización fuera del radio de cobertura: sin costo
    pub fn out_of_coverage(distancia_km: f64, duracion_minutos: i64, distancia_base_km: f64) -> Self {
        Self {
            distancia_km,
            duracion_minutos,
            costo_domicilio: Decimal::ZERO,
            fuera_de_cobertura: true,
            distancia_base_km,
            costo_base: Decimal::ZERO,
            distancia_exceso_km: 0.0,
            costo_exceso: Decimal::ZERO,
            fuente: RouteSource::FueraDeCobertura,
        }
    }
}

/// Fila de `cache_rutas`: respuesta del proveedor sin tiempo de preparación
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RouteCacheEntry {
    pub id: Uuid,
    pub clave: String,
    pub distancia_km: f64,
    pub duracion_minutos: f64,
    pub created_at: DateTime<Utc>,
}

impl RouteCacheEntry {
    pub fn new(clave: String, distancia_km: f64, duracion_minutos: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            clave,
            distancia_km,
            duracion_minutos,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_coverage_has_no_cost() {
        let quote = RouteQuote::out_of_coverage(12.0, 36, 3.0);
        assert!(quote.fuera_de_cobertura);
        assert_eq!(quote.costo_domicilio, Decimal::ZERO);
        assert_eq!(quote.fuente, RouteSource::FueraDeCobertura);
    }

    #[test]
    fn test_route_source_serializes_snake_case() {
        let json = serde_json::to_string(&RouteSource::FueraDeCobertura).unwrap();
        assert_eq!(json, "\"fuera_de_cobertura\"");
    }
}
