use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::models::address::AddressCacheEntry;
use crate::utils::errors::AppError;

/// Tabla `cache_direcciones`
#[async_trait]
pub trait AddressCacheRepository: Send + Sync {
    async fn find_by_key(&self, clave: &str) -> Result<Option<AddressCacheEntry>, AppError>;

    /// Inserción idempotente: si otra petición ya guardó la clave, no pasa nada
    async fn insert(&self, entry: &AddressCacheEntry) -> Result<(), AppError>;

    /// Borra las entradas creadas antes de `limite` y devuelve cuántas eran
    async fn delete_older_than(&self, limite: DateTime<Utc>) -> Result<u64, AppError>;
}

pub struct PgAddressCacheRepository {
    pool: PgPool,
}

impl PgAddressCacheRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AddressCacheRepository for PgAddressCacheRepository {
    async fn find_by_key(&self, clave: &str) -> Result<Option<AddressCacheEntry>, AppError> {
        let entry = sqlx::query_as::<_, AddressCacheEntry>(
            "SELECT id, clave, direccion_original, direccion_formateada, latitud, longitud, ciudad, barrio, created_at \
             FROM cache_direcciones WHERE clave = $1 LIMIT 1",
        )
        .bind(clave)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Error buscando dirección en caché: {}", e)))?;

        Ok(entry)
    }

    async fn insert(&self, entry: &AddressCacheEntry) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO cache_direcciones (id, clave, direccion_original, direccion_formateada, latitud, longitud, ciudad, barrio, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (clave) DO NOTHING
            "#,
        )
        .bind(entry.id)
        .bind(&entry.clave)
        .bind(&entry.direccion_original)
        .bind(&entry.direccion_formateada)
        .bind(entry.latitud)
        .bind(entry.longitud)
        .bind(&entry.ciudad)
        .bind(&entry.barrio)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Error guardando dirección en caché: {}", e)))?;

        Ok(())
    }

    async fn delete_older_than(&self, limite: DateTime<Utc>) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM cache_direcciones WHERE created_at < $1")
            .bind(limite)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Error limpiando caché de direcciones: {}", e)))?;

        Ok(result.rows_affected())
    }
}
