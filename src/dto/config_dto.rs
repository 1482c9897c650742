use chrono::NaiveTime;
use rust_decimal::Decimal;
use serde::Deserialize;
use validator::Validate;

use crate::utils::validation::validate_non_negative_amount;

/// Reemplazo completo de la configuración activa
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateConfigRequest {
    pub domicilio_activo: bool,
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitud: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitud: f64,
    #[validate(range(min = 0.0))]
    pub distancia_maxima_km: f64,
    #[validate(range(min = 0.0))]
    pub distancia_base_km: f64,
    #[validate(custom = "validate_non_negative_amount")]
    pub costo_base_domicilio: Decimal,
    #[validate(custom = "validate_non_negative_amount")]
    pub costo_por_km: Decimal,
    #[validate(range(min = 0, max = 600))]
    pub tiempo_preparacion_min: i32,
    pub hora_apertura: NaiveTime,
    pub hora_cierre: NaiveTime,
}
