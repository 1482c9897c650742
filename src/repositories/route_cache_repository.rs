use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::models::route::RouteCacheEntry;
use crate::utils::errors::AppError;

/// Tabla `cache_rutas`
#[async_trait]
pub trait RouteCacheRepository: Send + Sync {
    async fn find_by_key(&self, clave: &str) -> Result<Option<RouteCacheEntry>, AppError>;
    async fn insert(&self, entry: &RouteCacheEntry) -> Result<(), AppError>;
    async fn delete_older_than(&self, limite: DateTime<Utc>) -> Result<u64, AppError>;
}

pub struct PgRouteCacheRepository {
    pool: PgPool,
}

impl PgRouteCacheRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RouteCacheRepository for PgRouteCacheRepository {
    async fn find_by_key(&self, clave: &str) -> Result<Option<RouteCacheEntry>, AppError> {
        let entry = sqlx::query_as::<_, RouteCacheEntry>(
            "SELECT id, clave, distancia_km, duracion_minutos, created_at FROM cache_rutas WHERE clave = $1 LIMIT 1",
        )
        .bind(clave)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Error buscando ruta en caché: {}", e)))?;

        Ok(entry)
    }

    async fn insert(&self, entry: &RouteCacheEntry) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO cache_rutas (id, clave, distancia_km, duracion_minutos, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (clave) DO NOTHING
            "#,
        )
        .bind(entry.id)
        .bind(&entry.clave)
        .bind(entry.distancia_km)
        .bind(entry.duracion_minutos)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Error guardando ruta en caché: {}", e)))?;

        Ok(())
    }

    async fn delete_older_than(&self, limite: DateTime<Utc>) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM cache_rutas WHERE created_at < $1")
            .bind(limite)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Error limpiando caché de rutas: {}", e)))?;

        Ok(result.rows_affected())
    }
}
