use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::order::{EstadoOrden, Order, OrdenDetalle, TipoOrden};
use crate::models::payment::{MetodoPago, Pago, Propina, TipoComprobante};
use crate::utils::validation::{validate_non_negative_amount, validate_not_empty};

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ClienteRequest {
    #[validate(custom = "validate_not_empty", length(max = 120))]
    pub nombre: String,
    #[validate(length(max = 30))]
    pub telefono: Option<String>,
    #[validate(length(max = 300))]
    pub direccion: Option<String>,
    #[validate(length(max = 500))]
    pub notas: Option<String>,
}

/// Ingrediente de un producto tal como lo marcó el mesero
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PersonalizacionRequest {
    pub ingrediente_id: Uuid,
    #[validate(length(min = 1, max = 120))]
    pub ingrediente_nombre: String,
    pub incluido: bool,
    #[serde(default)]
    pub obligatorio: bool,
}

impl PersonalizacionRequest {
    /// Solo las exclusiones opcionales se guardan; lo incluido y lo
    /// obligatorio queda implícito.
    pub fn is_persisted(&self) -> bool {
        !self.incluido && !self.obligatorio
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct OrderItemRequest {
    pub producto_id: Uuid,
    #[validate(length(min = 1, max = 200))]
    pub producto_nombre: String,
    #[validate(custom = "validate_non_negative_amount")]
    pub precio_unitario: Decimal,
    #[validate(range(min = 1, max = 999))]
    pub cantidad: i32,
    #[validate(length(max = 500))]
    pub notas: Option<String>,
    #[serde(default)]
    #[validate]
    pub personalizaciones: Vec<PersonalizacionRequest>,
}

impl OrderItemRequest {
    pub fn subtotal(&self) -> Decimal {
        self.precio_unitario * Decimal::from(self.cantidad)
    }
}

/// Cotización que el cliente aceptó antes de crear la orden
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CotizacionRequest {
    #[validate(length(min = 1))]
    pub direccion_formateada: String,
    #[validate(range(min = 0.0))]
    pub distancia_km: f64,
    #[validate(custom = "validate_non_negative_amount")]
    pub costo_domicilio: Decimal,
    #[serde(default)]
    pub fuera_de_cobertura: bool,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateOrderRequest {
    #[validate]
    pub cliente: ClienteRequest,
    pub tipo_orden: TipoOrden,
    #[validate(length(min = 1, message = "La orden debe tener al menos un producto"))]
    #[validate]
    pub items: Vec<OrderItemRequest>,
    #[validate]
    pub cotizacion: Option<CotizacionRequest>,
    pub metodo_pago: Option<MetodoPago>,
    #[validate(custom = "validate_non_negative_amount")]
    pub monto_entregado: Option<Decimal>,
}

#[derive(Debug, Serialize)]
pub struct CreateOrderResponse {
    pub orden: Order,
    pub detalles: Vec<OrdenDetalle>,
    /// Solo para pagos en efectivo con monto entregado
    pub cambio_a_devolver: Option<Decimal>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SettleOrderRequest {
    pub metodo_pago: MetodoPago,
    #[serde(default)]
    #[validate(custom = "validate_non_negative_amount")]
    pub propina: Decimal,
    #[serde(default)]
    pub tipo_comprobante: TipoComprobante,
}

#[derive(Debug, Serialize)]
pub struct SettlementResponse {
    pub orden: Order,
    pub pago: Pago,
    pub propina: Option<Propina>,
    pub tipo_orden: TipoOrden,
    pub tipo_comprobante: TipoComprobante,
    pub requiere_impresion: bool,
    pub requiere_factura: bool,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct CancelOrderRequest {
    #[validate(length(max = 500))]
    pub motivo: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AdvanceStatusRequest {
    pub estado: EstadoOrden,
}

#[derive(Debug, Serialize)]
pub struct OrderLookupResponse {
    pub orden: Order,
    pub puede_cancelar: bool,
    pub segundos_restantes_cancelacion: i64,
    /// Por qué ya no se puede cancelar
    pub motivo_bloqueo: Option<String>,
    pub consultado_en: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item_json() -> serde_json::Value {
        serde_json::json!({
            "producto_id": Uuid::new_v4(),
            "producto_nombre": "Hamburguesa sencilla",
            "precio_unitario": "18000",
            "cantidad": 2,
            "personalizaciones": [
                {"ingrediente_id": Uuid::new_v4(), "ingrediente_nombre": "Cebolla", "incluido": false},
                {"ingrediente_id": Uuid::new_v4(), "ingrediente_nombre": "Pan", "incluido": false, "obligatorio": true},
                {"ingrediente_id": Uuid::new_v4(), "ingrediente_nombre": "Tomate", "incluido": true}
            ]
        })
    }

    #[test]
    fn test_only_optional_exclusions_are_persisted() {
        let item: OrderItemRequest = serde_json::from_value(item_json()).unwrap();
        let persistidas: Vec<_> = item
            .personalizaciones
            .iter()
            .filter(|p| p.is_persisted())
            .map(|p| p.ingrediente_nombre.as_str())
            .collect();
        assert_eq!(persistidas, vec!["Cebolla"]);
        assert_eq!(item.subtotal(), Decimal::from(36000));
    }

    #[test]
    fn test_create_order_rejects_empty_items_and_zero_quantity() {
        let mut request: CreateOrderRequest = serde_json::from_value(serde_json::json!({
            "cliente": {"nombre": "Laura"},
            "tipo_orden": "mesa",
            "items": []
        }))
        .unwrap();
        assert!(request.validate().is_err());

        let mut item: OrderItemRequest = serde_json::from_value(item_json()).unwrap();
        item.cantidad = 0;
        request.items = vec![item];
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_settle_request_defaults() {
        let request: SettleOrderRequest = serde_json::from_str(r#"{"metodo_pago":"tarjeta"}"#).unwrap();
        assert_eq!(request.propina, Decimal::ZERO);
        assert_eq!(request.tipo_comprobante, TipoComprobante::Ninguno);
        assert!(request.validate().is_ok());
    }
}
