//! Seguimiento y cambios de estado de órdenes
//!
//! La regla de cancelación (`Order::bloqueo_cancelacion`) es la misma para la
//! consulta por teléfono y para la cancelación, así la interfaz y el
//! servidor nunca discrepan.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::dto::order_dto::OrderLookupResponse;
use crate::models::order::{EstadoOrden, HistorialEntry, Order, StatusChange};
use crate::repositories::OrderRepository;
use crate::utils::errors::{codes, not_found_error, AppError, AppResult};
use crate::utils::validation::normalize_phone;

pub struct OrderStatusService {
    orders: Arc<dyn OrderRepository>,
}

impl OrderStatusService {
    pub fn new(orders: Arc<dyn OrderRepository>) -> Self {
        Self { orders }
    }

    pub async fn find_latest_order_by_phone(&self, telefono: &str) -> AppResult<OrderLookupResponse> {
        self.find_latest_order_by_phone_at(telefono, Utc::now()).await
    }

    pub async fn find_latest_order_by_phone_at(
        &self,
        telefono: &str,
        ahora: DateTime<Utc>,
    ) -> AppResult<OrderLookupResponse> {
        let normalizado = normalize_phone(telefono);
        if normalizado.is_empty() {
            return Err(AppError::ValidationError("El teléfono es requerido".to_string()));
        }

        let orden = self
            .orders
            .find_latest_by_phone(&normalizado)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("No hay órdenes para el teléfono {}", normalizado)))?;

        let bloqueo = orden.bloqueo_cancelacion(ahora);
        Ok(OrderLookupResponse {
            puede_cancelar: bloqueo.is_none(),
            segundos_restantes_cancelacion: orden.segundos_restantes_cancelacion(ahora),
            motivo_bloqueo: bloqueo.map(|b| b.mensaje().to_string()),
            orden,
            consultado_en: ahora,
        })
    }

    pub async fn cancel_order(&self, orden_id: Uuid, motivo: Option<String>) -> AppResult<Order> {
        self.cancel_order_at(orden_id, motivo, Utc::now()).await
    }

    pub async fn cancel_order_at(
        &self,
        orden_id: Uuid,
        motivo: Option<String>,
        ahora: DateTime<Utc>,
    ) -> AppResult<Order> {
        let orden = self.find(orden_id).await?;

        if let Some(bloqueo) = orden.bloqueo_cancelacion(ahora) {
            return Err(AppError::business(codes::CANCELACION_NO_PERMITIDA, bloqueo.mensaje()));
        }

        let cancelada = self
            .transition(&orden, StatusChange::to(EstadoOrden::Cancelada))
            .await?;

        let motivo = motivo
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| "sin motivo".to_string());
        self.record_history(HistorialEntry::new(
            orden_id,
            Some(orden.estado),
            EstadoOrden::Cancelada,
            None,
            format!("Cancelada por el cliente: {}", motivo),
        ))
        .await;

        log::info!("🚫 Orden {} cancelada", orden_id);
        Ok(cancelada)
    }

    /// Avanza un paso en el flujo del tipo de orden. La entrega se hace
    /// liquidando y la cancelación por su propia acción.
    pub async fn advance_status(&self, orden_id: Uuid, nuevo: EstadoOrden, usuario_id: Uuid) -> AppResult<Order> {
        let orden = self.find(orden_id).await?;
        let tipo = orden
            .tipo()
            .map_err(|e| AppError::business(codes::TIPO_ORDEN_INVALIDO, e))?;

        match nuevo {
            EstadoOrden::Entregada => {
                return Err(AppError::business(
                    codes::TRANSICION_INVALIDA,
                    "Para entregar una orden hay que liquidarla",
                ))
            }
            EstadoOrden::Cancelada => {
                return Err(AppError::business(
                    codes::TRANSICION_INVALIDA,
                    "Para cancelar una orden use la acción de cancelación",
                ))
            }
            _ => {}
        }

        if tipo.siguiente_estado(orden.estado) != Some(nuevo) {
            return Err(AppError::business(
                codes::TRANSICION_INVALIDA,
                format!(
                    "Una orden de tipo '{}' no puede pasar de '{}' a '{}'",
                    tipo, orden.estado, nuevo
                ),
            ));
        }

        let mut cambio = StatusChange::to(nuevo);
        if nuevo == EstadoOrden::EnCamino {
            cambio.usuario_entregador_id = Some(usuario_id);
        }
        let actualizada = self.transition(&orden, cambio).await?;

        self.record_history(HistorialEntry::new(
            orden_id,
            Some(orden.estado),
            nuevo,
            Some(usuario_id),
            format!("Cambio de estado: {} -> {}", orden.estado, nuevo),
        ))
        .await;

        log::info!("🔄 Orden {}: {} -> {}", orden_id, orden.estado, nuevo);
        Ok(actualizada)
    }

    /// Deja constancia de una impresión de recibo en el historial
    pub async fn register_print(&self, orden_id: Uuid, usuario_id: Uuid) -> AppResult<HistorialEntry> {
        let orden = self.find(orden_id).await?;
        let entrada = HistorialEntry::new(
            orden_id,
            Some(orden.estado),
            orden.estado,
            Some(usuario_id),
            "Impresión de recibo",
        );
        self.orders.insert_history(&entrada).await?;
        log::info!("🖨️ Impresión registrada para la orden {}", orden_id);
        Ok(entrada)
    }

    async fn find(&self, orden_id: Uuid) -> AppResult<Order> {
        self.orders
            .find_by_id(orden_id)
            .await?
            .ok_or_else(|| not_found_error("Orden", &orden_id.to_string()))
    }

    async fn transition(&self, orden: &Order, cambio: StatusChange) -> AppResult<Order> {
        self.orders
            .transition_status(orden.id, orden.estado, &cambio)
            .await?
            .ok_or_else(|| {
                AppError::Conflict(format!(
                    "La orden {} cambió de estado; vuelva a consultarla",
                    orden.id
                ))
            })
    }

    async fn record_history(&self, entrada: HistorialEntry) {
        if let Err(e) = self.orders.insert_history(&entrada).await {
            log::warn!("⚠️ No se pudo registrar el historial de la orden {}: {}", entrada.orden_id, e);
        }
    }
}
