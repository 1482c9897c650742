use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::models::order::{
    EstadoOrden, HistorialEntry, NewOrder, Order, OrdenDetalle, Personalizacion, StatusChange,
};
use crate::utils::errors::AppError;

/// Tablas `ordenes`, `orden_detalles`, `orden_personalizaciones` y `orden_historial`.
///
/// No hay transacciones entre llamadas: quien encadena varias escrituras
/// es responsable de compensarlas si una falla.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn insert_order(&self, orden: &NewOrder) -> Result<Order, AppError>;
    async fn delete_order(&self, id: Uuid) -> Result<(), AppError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, AppError>;

    /// Orden más reciente cuyo teléfono, reducido a dígitos, es `normalizado`
    async fn find_latest_by_phone(&self, normalizado: &str) -> Result<Option<Order>, AppError>;

    async fn insert_details(&self, detalles: &[OrdenDetalle]) -> Result<Vec<OrdenDetalle>, AppError>;
    async fn delete_details_by_order(&self, orden_id: Uuid) -> Result<(), AppError>;
    async fn find_details(&self, orden_id: Uuid) -> Result<Vec<OrdenDetalle>, AppError>;

    async fn insert_personalizations(&self, filas: &[Personalizacion]) -> Result<(), AppError>;

    /// Actualización condicional: solo aplica si la orden sigue en `esperado`.
    /// `None` significa que otra operación cambió el estado primero.
    async fn transition_status(
        &self,
        id: Uuid,
        esperado: EstadoOrden,
        cambio: &StatusChange,
    ) -> Result<Option<Order>, AppError>;

    async fn insert_history(&self, entrada: &HistorialEntry) -> Result<(), AppError>;
    async fn find_history(&self, orden_id: Uuid) -> Result<Vec<HistorialEntry>, AppError>;
}

pub struct PgOrderRepository {
    pool: PgPool,
}

impl PgOrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const ORDER_COLUMNS: &str = "id, cliente_nombre, cliente_telefono, cliente_direccion, cliente_notas, total, estado, \
    tipo_orden, costo_domicilio, distancia_km, metodo_pago, subtotal_productos, total_final, usuario_vendedor_id, \
    usuario_entregador_id, created_at, updated_at, fecha_entrega";

#[async_trait]
impl OrderRepository for PgOrderRepository {
    async fn insert_order(&self, orden: &NewOrder) -> Result<Order, AppError> {
        let now = Utc::now();
        let query = format!(
            r#"
            INSERT INTO ordenes (
                id, cliente_nombre, cliente_telefono, cliente_direccion, cliente_notas, total, estado,
                tipo_orden, costo_domicilio, distancia_km, metodo_pago, subtotal_productos, total_final,
                usuario_vendedor_id, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $6, $13, $14, $14)
            RETURNING {}
            "#,
            ORDER_COLUMNS
        );

        let created = sqlx::query_as::<_, Order>(&query)
            .bind(orden.id)
            .bind(&orden.cliente_nombre)
            .bind(&orden.cliente_telefono)
            .bind(&orden.cliente_direccion)
            .bind(&orden.cliente_notas)
            .bind(orden.total)
            .bind(EstadoOrden::OrdenTomada)
            .bind(orden.tipo_orden.as_str())
            .bind(orden.costo_domicilio)
            .bind(orden.distancia_km)
            .bind(orden.metodo_pago)
            .bind(orden.subtotal_productos)
            .bind(orden.usuario_vendedor_id)
            .bind(now)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Error creando orden: {}", e)))?;

        Ok(created)
    }

    async fn delete_order(&self, id: Uuid) -> Result<(), AppError> {
        sqlx::query("DELETE FROM ordenes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Error eliminando orden: {}", e)))?;

        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, AppError> {
        let query = format!("SELECT {} FROM ordenes WHERE id = $1", ORDER_COLUMNS);
        let orden = sqlx::query_as::<_, Order>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Error buscando orden: {}", e)))?;

        Ok(orden)
    }

    async fn find_latest_by_phone(&self, normalizado: &str) -> Result<Option<Order>, AppError> {
        let query = format!(
            r"SELECT {} FROM ordenes
              WHERE regexp_replace(cliente_telefono, '\D', '', 'g') = $1
              ORDER BY created_at DESC LIMIT 1",
            ORDER_COLUMNS
        );
        let orden = sqlx::query_as::<_, Order>(&query)
            .bind(normalizado)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Error buscando orden por teléfono: {}", e)))?;

        Ok(orden)
    }

    async fn insert_details(&self, detalles: &[OrdenDetalle]) -> Result<Vec<OrdenDetalle>, AppError> {
        if detalles.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
            "INSERT INTO orden_detalles (id, orden_id, producto_id, producto_nombre, precio_unitario, cantidad, subtotal, notas_personalizacion) ",
        );
        builder.push_values(detalles, |mut row, detalle| {
            row.push_bind(detalle.id)
                .push_bind(detalle.orden_id)
                .push_bind(detalle.producto_id)
                .push_bind(&detalle.producto_nombre)
                .push_bind(detalle.precio_unitario)
                .push_bind(detalle.cantidad)
                .push_bind(detalle.subtotal)
                .push_bind(&detalle.notas_personalizacion);
        });
        builder.push(
            " RETURNING id, orden_id, producto_id, producto_nombre, precio_unitario, cantidad, subtotal, notas_personalizacion",
        );

        let creados = builder
            .build_query_as::<OrdenDetalle>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Error creando detalles de la orden: {}", e)))?;

        Ok(creados)
    }

    async fn delete_details_by_order(&self, orden_id: Uuid) -> Result<(), AppError> {
        sqlx::query(
            "DELETE FROM orden_personalizaciones WHERE orden_detalle_id IN (SELECT id FROM orden_detalles WHERE orden_id = $1)",
        )
        .bind(orden_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Error eliminando personalizaciones: {}", e)))?;

        sqlx::query("DELETE FROM orden_detalles WHERE orden_id = $1")
            .bind(orden_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Error eliminando detalles de la orden: {}", e)))?;

        Ok(())
    }

    async fn find_details(&self, orden_id: Uuid) -> Result<Vec<OrdenDetalle>, AppError> {
        let detalles = sqlx::query_as::<_, OrdenDetalle>(
            "SELECT id, orden_id, producto_id, producto_nombre, precio_unitario, cantidad, subtotal, notas_personalizacion \
             FROM orden_detalles WHERE orden_id = $1",
        )
        .bind(orden_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Error listando detalles de la orden: {}", e)))?;

        Ok(detalles)
    }

    async fn insert_personalizations(&self, filas: &[Personalizacion]) -> Result<(), AppError> {
        if filas.is_empty() {
            return Ok(());
        }

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
            "INSERT INTO orden_personalizaciones (id, orden_detalle_id, ingrediente_id, ingrediente_nombre, incluido, obligatorio) ",
        );
        builder.push_values(filas, |mut row, fila| {
            row.push_bind(fila.id)
                .push_bind(fila.orden_detalle_id)
                .push_bind(fila.ingrediente_id)
                .push_bind(&fila.ingrediente_nombre)
                .push_bind(fila.incluido)
                .push_bind(fila.obligatorio);
        });

        builder
            .build()
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Error creando personalizaciones: {}", e)))?;

        Ok(())
    }

    async fn transition_status(
        &self,
        id: Uuid,
        esperado: EstadoOrden,
        cambio: &StatusChange,
    ) -> Result<Option<Order>, AppError> {
        let query = format!(
            r#"
            UPDATE ordenes SET
                estado = $3,
                metodo_pago = COALESCE($4, metodo_pago),
                fecha_entrega = COALESCE($5, fecha_entrega),
                usuario_entregador_id = COALESCE($6, usuario_entregador_id),
                updated_at = NOW()
            WHERE id = $1 AND estado = $2
            RETURNING {}
            "#,
            ORDER_COLUMNS
        );

        let orden = sqlx::query_as::<_, Order>(&query)
            .bind(id)
            .bind(esperado)
            .bind(cambio.estado_nuevo)
            .bind(cambio.metodo_pago)
            .bind(cambio.fecha_entrega)
            .bind(cambio.usuario_entregador_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Error actualizando estado de la orden: {}", e)))?;

        Ok(orden)
    }

    async fn insert_history(&self, entrada: &HistorialEntry) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO orden_historial (id, orden_id, estado_anterior, estado_nuevo, usuario_id, notas, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(entrada.id)
        .bind(entrada.orden_id)
        .bind(entrada.estado_anterior)
        .bind(entrada.estado_nuevo)
        .bind(entrada.usuario_id)
        .bind(&entrada.notas)
        .bind(entrada.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Error guardando historial: {}", e)))?;

        Ok(())
    }

    async fn find_history(&self, orden_id: Uuid) -> Result<Vec<HistorialEntry>, AppError> {
        let entradas = sqlx::query_as::<_, HistorialEntry>(
            "SELECT id, orden_id, estado_anterior, estado_nuevo, usuario_id, notas, created_at \
             FROM orden_historial WHERE orden_id = $1 ORDER BY created_at",
        )
        .bind(orden_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Error leyendo historial: {}", e)))?;

        Ok(entradas)
    }
}
