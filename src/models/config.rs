//! Configuración del restaurante
//!
//! Una sola fila activa por restaurante. La leen todas las cotizaciones
//! y la creación de órdenes; solo el dueño o un administrador la modifica.

use chrono::{DateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::address::Coordinates;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RestaurantConfig {
    pub id: Uuid,
    pub domicilio_activo: bool,
    pub latitud: f64,
    pub longitud: f64,
    pub distancia_maxima_km: f64,
    pub distancia_base_km: f64,
    pub costo_base_domicilio: Decimal,
    pub costo_por_km: Decimal,
    pub tiempo_preparacion_min: i32,
    pub hora_apertura: NaiveTime,
    pub hora_cierre: NaiveTime,
    pub updated_at: DateTime<Utc>,
}

impl RestaurantConfig {
    pub fn origen(&self) -> Coordinates {
        Coordinates::new(self.latitud, self.longitud)
    }

    /// Horario de atención; soporta horarios que cruzan la medianoche
    /// (por ejemplo 18:00 a 02:00).
    pub fn esta_abierto(&self, hora: NaiveTime) -> bool {
        if self.hora_apertura == self.hora_cierre {
            return true;
        }
        if self.hora_apertura < self.hora_cierre {
            hora >= self.hora_apertura && hora < self.hora_cierre
        } else {
            hora >= self.hora_apertura || hora < self.hora_cierre
        }
    }

    /// Comprueba que distancias y montos sean utilizables para cotizar
    pub fn check_consistency(&self) -> Result<(), String> {
        if !self.origen().is_finite() {
            return Err("coordenadas del restaurante inválidas".to_string());
        }
        let distancias = [
            ("distancia_maxima_km", self.distancia_maxima_km),
            ("distancia_base_km", self.distancia_base_km),
        ];
        for (campo, valor) in distancias {
            if !valor.is_finite() || valor < 0.0 {
                return Err(format!("{} debe ser un número no negativo", campo));
            }
        }
        if self.costo_base_domicilio.is_sign_negative() || self.costo_por_km.is_sign_negative() {
            return Err("los costos de domicilio no pueden ser negativos".to_string());
        }
        if self.tiempo_preparacion_min < 0 {
            return Err("tiempo_preparacion_min no puede ser negativo".to_string());
        }
        Ok(())
    }
}
