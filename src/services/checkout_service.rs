//! Liquidación de órdenes
//!
//! El pago se registra antes de cerrar la orden. El cierre es una
//! actualización condicional sobre el estado leído; si falla o si otra
//! operación cambió el estado primero, el pago y la propina se borran.

use chrono::Utc;
use futures::FutureExt;
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

use crate::dto::order_dto::{SettleOrderRequest, SettlementResponse};
use crate::models::order::{EstadoOrden, HistorialEntry, Order, StatusChange, TipoOrden};
use crate::models::payment::{Pago, Propina, TipoComprobante};
use crate::repositories::{OrderRepository, PaymentRepository};
use crate::utils::errors::{codes, not_found_error, AppError, AppResult};
use crate::utils::saga::Saga;

pub struct CheckoutService {
    orders: Arc<dyn OrderRepository>,
    payments: Arc<dyn PaymentRepository>,
}

/// Tipo de orden y estado que debe tener para poder liquidarse
pub fn settlement_precondition(orden: &Order) -> AppResult<(TipoOrden, EstadoOrden)> {
    let tipo = orden
        .tipo()
        .map_err(|e| AppError::business(codes::TIPO_ORDEN_INVALIDO, e))?;

    let requerido = tipo.estado_para_liquidar();
    if orden.estado != requerido {
        return Err(AppError::business(
            codes::ESTADO_INVALIDO,
            format!(
                "Una orden de tipo '{}' debe estar en '{}' para liquidarse (estado actual: '{}')",
                tipo, requerido, orden.estado
            ),
        ));
    }
    Ok((tipo, requerido))
}

impl CheckoutService {
    pub fn new(orders: Arc<dyn OrderRepository>, payments: Arc<dyn PaymentRepository>) -> Self {
        Self { orders, payments }
    }

    pub async fn settle_order(
        &self,
        orden_id: Uuid,
        usuario_id: Uuid,
        request: SettleOrderRequest,
    ) -> AppResult<SettlementResponse> {
        if request.propina.is_sign_negative() && !request.propina.is_zero() {
            return Err(AppError::ValidationError("La propina no puede ser negativa".to_string()));
        }

        let orden = self
            .orders
            .find_by_id(orden_id)
            .await?
            .ok_or_else(|| not_found_error("Orden", &orden_id.to_string()))?;

        let (tipo, estado_actual) = settlement_precondition(&orden)?;

        let mut saga = Saga::new("liquidar orden");

        let monto = orden.total_a_cobrar() + request.propina;
        let pago = self
            .payments
            .insert_payment(&Pago::new(orden_id, Some(usuario_id), request.metodo_pago, monto))
            .await?;
        let payments = self.payments.clone();
        let pago_id = pago.id;
        saga.push("eliminar pago", move || {
            async move { payments.delete_payment(pago_id).await }.boxed()
        });

        let propina = self.record_tip(&mut saga, &pago, request.propina, orden.subtotal_productos).await;

        let cambio = StatusChange {
            estado_nuevo: EstadoOrden::Entregada,
            metodo_pago: Some(request.metodo_pago),
            fecha_entrega: Some(Utc::now()),
            usuario_entregador_id: Some(usuario_id),
        };

        let liquidada = match self.orders.transition_status(orden_id, estado_actual, &cambio).await {
            Ok(Some(liquidada)) => liquidada,
            Ok(None) => {
                log::warn!("⚠️ La orden {} cambió de estado durante la liquidación", orden_id);
                Self::compensate(saga, pago_id).await;
                return Err(AppError::Conflict(
                    "La orden cambió de estado mientras se liquidaba; vuelva a consultarla".to_string(),
                ));
            }
            Err(e) => {
                log::error!("❌ No se pudo cerrar la orden {}: {}", orden_id, e);
                Self::compensate(saga, pago_id).await;
                return Err(e);
            }
        };
        saga.commit();

        let historial = HistorialEntry::new(
            orden_id,
            Some(estado_actual),
            EstadoOrden::Entregada,
            Some(usuario_id),
            format!(
                "Liquidada con {}: total ${}, propina ${}, cobrado ${}",
                request.metodo_pago.as_str(),
                orden.total_a_cobrar(),
                request.propina,
                monto
            ),
        );
        if let Err(e) = self.orders.insert_history(&historial).await {
            log::warn!("⚠️ No se pudo registrar el historial de la orden {}: {}", orden_id, e);
        }

        log::info!("💰 Orden {} liquidada: ${} ({})", orden_id, monto, request.metodo_pago.as_str());

        Ok(SettlementResponse {
            orden: liquidada,
            pago,
            propina,
            tipo_orden: tipo,
            tipo_comprobante: request.tipo_comprobante,
            requiere_impresion: request.tipo_comprobante == TipoComprobante::Recibo,
            requiere_factura: request.tipo_comprobante == TipoComprobante::FacturaElectronica,
        })
    }

    /// La propina no es requerida: si no se puede guardar, solo se registra en el log
    async fn record_tip(
        &self,
        saga: &mut Saga,
        pago: &Pago,
        monto: Decimal,
        subtotal_productos: Decimal,
    ) -> Option<Propina> {
        if monto <= Decimal::ZERO {
            return None;
        }

        match self
            .payments
            .insert_tip(&Propina::new(pago.id, monto, subtotal_productos))
            .await
        {
            Ok(propina) => {
                let payments = self.payments.clone();
                let pago_id = pago.id;
                saga.push("eliminar propina", move || {
                    async move { payments.delete_tips_by_payment(pago_id).await }.boxed()
                });
                Some(propina)
            }
            Err(e) => {
                log::warn!("⚠️ No se pudo registrar la propina del pago {}: {}", pago.id, e);
                None
            }
        }
    }

    async fn compensate(saga: Saga, pago_id: Uuid) {
        let fallidas = saga.rollback().await;
        if fallidas > 0 {
            log::error!("❌ Pago huérfano {}: requiere conciliación manual", pago_id);
        }
    }
}
