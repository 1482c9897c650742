use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;

use crate::models::config::RestaurantConfig;
use crate::utils::errors::AppError;

/// Acceso de lectura a la configuración activa del restaurante
#[async_trait]
pub trait ConfigProvider: Send + Sync {
    async fn get_active_config(&self) -> Result<Option<RestaurantConfig>, AppError>;
}

/// Lectura y escritura de la configuración (acción del dueño)
#[async_trait]
pub trait ConfigStore: ConfigProvider {
    /// Reemplaza la configuración activa y devuelve la fila guardada
    async fn save_active_config(&self, config: &RestaurantConfig) -> Result<RestaurantConfig, AppError>;
}

pub struct ConfigRepository {
    pool: PgPool,
}

impl ConfigRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const CONFIG_COLUMNS: &str = "id, domicilio_activo, latitud, longitud, distancia_maxima_km, distancia_base_km, \
    costo_base_domicilio, costo_por_km, tiempo_preparacion_min, hora_apertura, hora_cierre, updated_at";

#[async_trait]
impl ConfigProvider for ConfigRepository {
    async fn get_active_config(&self) -> Result<Option<RestaurantConfig>, AppError> {
        let query = format!(
            "SELECT {} FROM configuracion_restaurante WHERE activa = TRUE LIMIT 1",
            CONFIG_COLUMNS
        );

        let config = sqlx::query_as::<_, RestaurantConfig>(&query)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Error leyendo configuración: {}", e)))?;

        Ok(config)
    }
}

#[async_trait]
impl ConfigStore for ConfigRepository {
    async fn save_active_config(&self, config: &RestaurantConfig) -> Result<RestaurantConfig, AppError> {
        let query = format!(
            r#"
            INSERT INTO configuracion_restaurante (
                id, domicilio_activo, latitud, longitud, distancia_maxima_km, distancia_base_km,
                costo_base_domicilio, costo_por_km, tiempo_preparacion_min, hora_apertura, hora_cierre,
                activa, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, TRUE, $12)
            ON CONFLICT (activa) WHERE activa DO UPDATE SET
                domicilio_activo = EXCLUDED.domicilio_activo,
                latitud = EXCLUDED.latitud,
                longitud = EXCLUDED.longitud,
                distancia_maxima_km = EXCLUDED.distancia_maxima_km,
                distancia_base_km = EXCLUDED.distancia_base_km,
                costo_base_domicilio = EXCLUDED.costo_base_domicilio,
                costo_por_km = EXCLUDED.costo_por_km,
                tiempo_preparacion_min = EXCLUDED.tiempo_preparacion_min,
                hora_apertura = EXCLUDED.hora_apertura,
                hora_cierre = EXCLUDED.hora_cierre,
                updated_at = EXCLUDED.updated_at
            RETURNING {}
            "#,
            CONFIG_COLUMNS
        );

        let saved = sqlx::query_as::<_, RestaurantConfig>(&query)
            .bind(config.id)
            .bind(config.domicilio_activo)
            .bind(config.latitud)
            .bind(config.longitud)
            .bind(config.distancia_maxima_km)
            .bind(config.distancia_base_km)
            .bind(config.costo_base_domicilio)
            .bind(config.costo_por_km)
            .bind(config.tiempo_preparacion_min)
            .bind(config.hora_apertura)
            .bind(config.hora_cierre)
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Error guardando configuración: {}", e)))?;

        Ok(saved)
    }
}
