use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MetodoPago {
    Efectivo,
    Tarjeta,
    Transferencia,
}

impl MetodoPago {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetodoPago::Efectivo => "efectivo",
            MetodoPago::Tarjeta => "tarjeta",
            MetodoPago::Transferencia => "transferencia",
        }
    }
}

/// Comprobante que pide el cliente al pagar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TipoComprobante {
    #[default]
    Ninguno,
    /// Recibo impreso en caja
    Recibo,
    /// Factura electrónica (la emite un servicio externo)
    FacturaElectronica,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Pago {
    pub id: Uuid,
    pub orden_id: Uuid,
    pub usuario_id: Option<Uuid>,
    pub metodo_pago: MetodoPago,
    pub monto: Decimal,
    pub created_at: DateTime<Utc>,
}

impl Pago {
    pub fn new(orden_id: Uuid, usuario_id: Option<Uuid>, metodo_pago: MetodoPago, monto: Decimal) -> Self {
        Self {
            id: Uuid::new_v4(),
            orden_id,
            usuario_id,
            metodo_pago,
            monto,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Propina {
    pub id: Uuid,
    pub pago_id: Uuid,
    pub monto: Decimal,
    pub porcentaje: Decimal,
    pub created_at: DateTime<Utc>,
}

impl Propina {
    /// `porcentaje` se calcula sobre el subtotal de productos, con dos decimales
    pub fn new(pago_id: Uuid, monto: Decimal, subtotal_productos: Decimal) -> Self {
        Self {
            id: Uuid::new_v4(),
            pago_id,
            monto,
            porcentaje: porcentaje_propina(monto, subtotal_productos),
            created_at: Utc::now(),
        }
    }
}

/// `round2(propina / subtotal * 100)`; 0 si no hay subtotal
pub fn porcentaje_propina(propina: Decimal, subtotal_productos: Decimal) -> Decimal {
    if subtotal_productos <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    (propina / subtotal_productos * Decimal::ONE_HUNDRED).round_dp(2)
}
