use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::payment::{Pago, Propina};
use crate::utils::errors::AppError;

/// Tablas `pagos` y `propinas`
#[async_trait]
pub trait PaymentRepository: Send + Sync {
    async fn insert_payment(&self, pago: &Pago) -> Result<Pago, AppError>;
    async fn delete_payment(&self, id: Uuid) -> Result<(), AppError>;
    async fn insert_tip(&self, propina: &Propina) -> Result<Propina, AppError>;
    async fn delete_tips_by_payment(&self, pago_id: Uuid) -> Result<(), AppError>;
    async fn find_by_order(&self, orden_id: Uuid) -> Result<Vec<Pago>, AppError>;
}

pub struct PgPaymentRepository {
    pool: PgPool,
}

impl PgPaymentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PaymentRepository for PgPaymentRepository {
    async fn insert_payment(&self, pago: &Pago) -> Result<Pago, AppError> {
        let creado = sqlx::query_as::<_, Pago>(
            r#"
            INSERT INTO pagos (id, orden_id, usuario_id, metodo_pago, monto, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, orden_id, usuario_id, metodo_pago, monto, created_at
            "#,
        )
        .bind(pago.id)
        .bind(pago.orden_id)
        .bind(pago.usuario_id)
        .bind(pago.metodo_pago)
        .bind(pago.monto)
        .bind(pago.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Error registrando pago: {}", e)))?;

        Ok(creado)
    }

    async fn delete_payment(&self, id: Uuid) -> Result<(), AppError> {
        sqlx::query("DELETE FROM pagos WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Error eliminando pago: {}", e)))?;

        Ok(())
    }

    async fn insert_tip(&self, propina: &Propina) -> Result<Propina, AppError> {
        let creada = sqlx::query_as::<_, Propina>(
            r#"
            INSERT INTO propinas (id, pago_id, monto, porcentaje, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, pago_id, monto, porcentaje, created_at
            "#,
        )
        .bind(propina.id)
        .bind(propina.pago_id)
        .bind(propina.monto)
        .bind(propina.porcentaje)
        .bind(propina.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Error registrando propina: {}", e)))?;

        Ok(creada)
    }

    async fn delete_tips_by_payment(&self, pago_id: Uuid) -> Result<(), AppError> {
        sqlx::query("DELETE FROM propinas WHERE pago_id = $1")
            .bind(pago_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Error eliminando propina: {}", e)))?;

        Ok(())
    }

    async fn find_by_order(&self, orden_id: Uuid) -> Result<Vec<Pago>, AppError> {
        let pagos = sqlx::query_as::<_, Pago>(
            "SELECT id, orden_id, usuario_id, metodo_pago, monto, created_at FROM pagos WHERE orden_id = $1 ORDER BY created_at",
        )
        .bind(orden_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Error listando pagos: {}", e)))?;

        Ok(pagos)
    }
}
