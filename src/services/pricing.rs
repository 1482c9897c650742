//! Tarifa de domicilio
//!
//! Todo valor cobrado es múltiplo de 100. El redondeo se suma al tramo de
//! exceso, de modo que `costo_base + costo_exceso == costo_total`.

use num_traits::FromPrimitive;
use rust_decimal::Decimal;

use crate::models::config::RestaurantConfig;
use crate::models::route::PricingBreakdown;
use crate::utils::errors::{AppError, AppResult};

/// `ceil(x / 100) * 100`
pub fn round_up_100(valor: Decimal) -> Decimal {
    let cien = Decimal::ONE_HUNDRED;
    (valor / cien).ceil() * cien
}

/// Redondeo a 2 decimales para distancias reportadas
pub fn round2(valor: f64) -> f64 {
    (valor * 100.0).round() / 100.0
}

/// Calcula la tarifa para la distancia final de la ruta
///
/// El exceso se tarifa en `Decimal` sin redondeos intermedios; solo la
/// distancia de exceso reportada va a 2 decimales.
pub fn price_delivery(distancia_km: f64, config: &RestaurantConfig) -> AppResult<PricingBreakdown> {
    if !distancia_km.is_finite() || distancia_km < 0.0 {
        return Err(AppError::Internal(format!("Distancia inválida para tarifar: {}", distancia_km)));
    }

    let costo_base = config.costo_base_domicilio;
    let distancia_base_km = config.distancia_base_km;

    if distancia_km <= distancia_base_km {
        let costo_total = round_up_100(costo_base);
        return Ok(PricingBreakdown {
            costo_total,
            distancia_base_km,
            costo_base,
            distancia_exceso_km: 0.0,
            costo_exceso: costo_total - costo_base,
        });
    }

    let exceso = to_decimal(distancia_km)? - to_decimal(distancia_base_km)?;
    let bruto = costo_base + exceso * config.costo_por_km;
    let costo_total = round_up_100(bruto);

    Ok(PricingBreakdown {
        costo_total,
        distancia_base_km,
        costo_base,
        distancia_exceso_km: round2(distancia_km - distancia_base_km),
        costo_exceso: costo_total - costo_base,
    })
}

fn to_decimal(km: f64) -> AppResult<Decimal> {
    Decimal::from_f64(km).ok_or_else(|| AppError::Internal(format!("Distancia no representable: {}", km)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::config::fixtures::restaurant_config;

    #[test]
    fn test_round_up_100() {
        assert_eq!(round_up_100(Decimal::from(5760)), Decimal::from(5800));
        assert_eq!(round_up_100(Decimal::from(5800)), Decimal::from(5800));
        assert_eq!(round_up_100(Decimal::new(400001, 2)), Decimal::from(4100));
        assert_eq!(round_up_100(Decimal::ZERO), Decimal::ZERO);
    }

    #[test]
    fn test_happy_path_delivery_scenario() {
        let config = restaurant_config();
        let tarifa = price_delivery(5.2, &config).unwrap();

        assert_eq!(tarifa.distancia_exceso_km, 2.2);
        assert_eq!(tarifa.costo_total, Decimal::from(5800));
        assert_eq!(tarifa.costo_base, Decimal::from(4000));
        assert_eq!(tarifa.costo_exceso, Decimal::from(1800));
    }

    #[test]
    fn test_within_base_distance_charges_base() {
        let mut config = restaurant_config();
        config.costo_base_domicilio = Decimal::from(3950);
        let tarifa = price_delivery(2.4, &config).unwrap();

        assert_eq!(tarifa.costo_total, Decimal::from(4000));
        assert_eq!(tarifa.distancia_exceso_km, 0.0);
        assert_eq!(tarifa.costo_exceso, Decimal::from(50));
    }

    #[test]
    fn test_exact_base_distance_has_no_excess() {
        let tarifa = price_delivery(3.0, &restaurant_config()).unwrap();
        assert_eq!(tarifa.costo_total, Decimal::from(4000));
        assert_eq!(tarifa.costo_exceso, Decimal::ZERO);
    }

    #[test]
    fn test_small_excess_is_not_inflated_by_float_error() {
        // 3.1 - 3.0 en f64 da 0.10000000000000009
        let tarifa = price_delivery(3.1, &restaurant_config()).unwrap();
        assert_eq!(tarifa.distancia_exceso_km, 0.1);
        assert_eq!(tarifa.costo_total, Decimal::from(4100));
    }

    #[test]
    fn test_fraction_of_meter_over_base_rounds_up_to_next_hundred() {
        // 0,004 km * 800 = 3,2 -> 4003,2 -> 4100
        let tarifa = price_delivery(3.004, &restaurant_config()).unwrap();
        assert_eq!(tarifa.costo_total, Decimal::from(4100));
        assert_eq!(tarifa.costo_exceso, Decimal::from(100));
        assert_eq!(tarifa.distancia_exceso_km, 0.0);
    }

    #[test]
    fn test_excess_landing_on_hundred_is_not_rounded_further() {
        // 0,125 km * 800 = 100 exactos
        let tarifa = price_delivery(3.125, &restaurant_config()).unwrap();
        assert_eq!(tarifa.costo_total, Decimal::from(4100));
        assert_eq!(tarifa.distancia_exceso_km, 0.13);
    }

    #[test]
    fn test_fee_is_multiple_of_100_and_parts_add_up() {
        let config = restaurant_config();
        let mut distancia = 0.0;
        while distancia <= 10.0 {
            let d = round2(distancia);
            let tarifa = price_delivery(d, &config).unwrap();
            assert_eq!(tarifa.costo_total % Decimal::ONE_HUNDRED, Decimal::ZERO, "distancia {}", d);
            assert_eq!(tarifa.costo_base + tarifa.costo_exceso, tarifa.costo_total, "distancia {}", d);
            distancia += 0.37;
        }
    }

    #[test]
    fn test_rejects_invalid_distance() {
        assert!(price_delivery(f64::NAN, &restaurant_config()).is_err());
        assert!(price_delivery(-1.0, &restaurant_config()).is_err());
    }
}
