//! Creación de órdenes
//!
//! Cabecera, líneas y personalizaciones se escriben por separado. Cada
//! paso registra su compensación en una `Saga`; si un paso falla, lo ya
//! escrito se borra en orden inverso y la orden no queda a medias.

use futures::FutureExt;
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

use crate::dto::order_dto::{CreateOrderRequest, CreateOrderResponse};
use crate::models::order::{
    EstadoOrden, HistorialEntry, NewOrder, OrdenDetalle, Personalizacion, TipoOrden, DIRECCION_EN_LOCAL,
};
use crate::models::payment::MetodoPago;
use crate::repositories::{ConfigProvider, OrderRepository};
use crate::services::delivery_quote_service::{require_config, require_delivery_enabled};
use crate::services::pricing::price_delivery;
use crate::utils::errors::{codes, AppError, AppResult};
use crate::utils::saga::Saga;

pub struct OrderService {
    orders: Arc<dyn OrderRepository>,
    config: Arc<dyn ConfigProvider>,
}

/// Datos de domicilio ya validados
struct Entrega {
    direccion: String,
    costo: Decimal,
    distancia_km: f64,
}

impl OrderService {
    pub fn new(orders: Arc<dyn OrderRepository>, config: Arc<dyn ConfigProvider>) -> Self {
        Self { orders, config }
    }

    pub async fn create_order(
        &self,
        request: CreateOrderRequest,
        usuario_vendedor_id: Option<Uuid>,
    ) -> AppResult<CreateOrderResponse> {
        validate_items(&request)?;
        let entrega = self.validate_delivery(&request).await?;

        let subtotal: Decimal = request.items.iter().map(|item| item.subtotal()).sum();
        let costo_domicilio = entrega.as_ref().map(|e| e.costo).unwrap_or(Decimal::ZERO);
        let total = subtotal + costo_domicilio;

        let nueva = NewOrder {
            id: Uuid::new_v4(),
            cliente_nombre: request.cliente.nombre.trim().to_string(),
            cliente_telefono: request
                .cliente
                .telefono
                .as_deref()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string),
            cliente_direccion: entrega
                .as_ref()
                .map(|e| e.direccion.clone())
                .unwrap_or_else(|| DIRECCION_EN_LOCAL.to_string()),
            cliente_notas: request.cliente.notas.clone(),
            total,
            tipo_orden: request.tipo_orden,
            costo_domicilio,
            distancia_km: entrega.as_ref().map(|e| e.distancia_km),
            metodo_pago: request.metodo_pago,
            subtotal_productos: subtotal,
            usuario_vendedor_id,
        };

        log::info!(
            "🧾 Creando orden {} ({}) por ${}",
            nueva.id,
            nueva.tipo_orden,
            nueva.total
        );

        let mut saga = Saga::new("crear orden");

        let orden = self.orders.insert_order(&nueva).await?;
        let orders = self.orders.clone();
        let orden_id = orden.id;
        saga.push("eliminar cabecera de la orden", move || {
            async move { orders.delete_order(orden_id).await }.boxed()
        });

        let (detalles, personalizaciones) = build_lines(orden_id, &request);

        let detalles = match self.orders.insert_details(&detalles).await {
            Ok(creados) => creados,
            Err(e) => {
                log::error!("❌ Error guardando líneas de la orden {}: {}", orden_id, e);
                saga.rollback().await;
                return Err(e);
            }
        };
        let orders = self.orders.clone();
        saga.push("eliminar líneas de la orden", move || {
            async move { orders.delete_details_by_order(orden_id).await }.boxed()
        });

        if let Err(e) = self.orders.insert_personalizations(&personalizaciones).await {
            log::error!("❌ Error guardando personalizaciones de la orden {}: {}", orden_id, e);
            saga.rollback().await;
            return Err(e);
        }

        saga.commit();

        let historial = HistorialEntry::new(
            orden_id,
            None,
            EstadoOrden::OrdenTomada,
            usuario_vendedor_id,
            format!("Orden creada ({})", request.tipo_orden),
        );
        if let Err(e) = self.orders.insert_history(&historial).await {
            log::warn!("⚠️ No se pudo registrar el historial de la orden {}: {}", orden_id, e);
        }

        let cambio_a_devolver = match (request.metodo_pago, request.monto_entregado) {
            (Some(MetodoPago::Efectivo), Some(entregado)) => Some(entregado - orden.total),
            _ => None,
        };

        log::info!("✅ Orden {} creada con {} líneas", orden_id, detalles.len());
        Ok(CreateOrderResponse {
            orden,
            detalles,
            cambio_a_devolver,
        })
    }

    /// Reglas de domicilio; se vuelven a revisar aquí porque pudo pasar
    /// tiempo desde la cotización.
    async fn validate_delivery(&self, request: &CreateOrderRequest) -> AppResult<Option<Entrega>> {
        if request.tipo_orden != TipoOrden::Domicilio {
            return Ok(None);
        }

        let cotizacion = request.cotizacion.as_ref().ok_or_else(|| {
            AppError::business(
                codes::COTIZACION_REQUERIDA,
                "Las órdenes a domicilio requieren una cotización de envío",
            )
        })?;

        let direccion_cliente = request.cliente.direccion.as_deref().unwrap_or("").trim();
        if direccion_cliente.is_empty() {
            return Err(AppError::business(
                codes::DIRECCION_REQUERIDA,
                "La dirección del cliente es requerida para domicilios",
            ));
        }

        let config = require_config(self.config.as_ref()).await?;
        require_delivery_enabled(&config)?;

        if cotizacion.fuera_de_cobertura {
            return Err(AppError::business(
                codes::FUERA_DE_COBERTURA,
                "La dirección está fuera del área de cobertura",
            ));
        }

        // La tarifa se recalcula con la configuración vigente; la del cliente solo se compara
        let tarifa = price_delivery(cotizacion.distancia_km, &config).map_err(|_| {
            AppError::business(codes::COTIZACION_INVALIDA, "La distancia de la cotización no es válida")
        })?;
        if tarifa.costo_total != cotizacion.costo_domicilio {
            log::warn!(
                "⚠️ Cotización rechazada: ${} enviado, ${} calculado para {:.2} km",
                cotizacion.costo_domicilio,
                tarifa.costo_total,
                cotizacion.distancia_km
            );
            return Err(AppError::business(
                codes::COTIZACION_INVALIDA,
                "El costo del domicilio no coincide con la tarifa vigente; vuelva a cotizar",
            ));
        }

        Ok(Some(Entrega {
            direccion: cotizacion.direccion_formateada.trim().to_string(),
            costo: tarifa.costo_total,
            distancia_km: cotizacion.distancia_km,
        }))
    }
}

fn validate_items(request: &CreateOrderRequest) -> AppResult<()> {
    if request.items.is_empty() {
        return Err(AppError::ValidationError(
            "La orden debe tener al menos un producto".to_string(),
        ));
    }
    for item in &request.items {
        if item.cantidad < 1 {
            return Err(AppError::ValidationError(format!(
                "Cantidad inválida para '{}'",
                item.producto_nombre
            )));
        }
        if item.precio_unitario.is_sign_negative() && !item.precio_unitario.is_zero() {
            return Err(AppError::ValidationError(format!(
                "Precio inválido para '{}'",
                item.producto_nombre
            )));
        }
    }
    Ok(())
}

/// Líneas de la orden y las exclusiones de ingredientes que se guardan
fn build_lines(orden_id: Uuid, request: &CreateOrderRequest) -> (Vec<OrdenDetalle>, Vec<Personalizacion>) {
    let mut detalles = Vec::with_capacity(request.items.len());
    let mut personalizaciones = Vec::new();

    for item in &request.items {
        let detalle = OrdenDetalle {
            id: Uuid::new_v4(),
            orden_id,
            producto_id: item.producto_id,
            producto_nombre: item.producto_nombre.clone(),
            precio_unitario: item.precio_unitario,
            cantidad: item.cantidad,
            subtotal: item.subtotal(),
            notas_personalizacion: item.notas.clone(),
        };

        personalizaciones.extend(item.personalizaciones.iter().filter(|p| p.is_persisted()).map(|p| {
            Personalizacion {
                id: Uuid::new_v4(),
                orden_detalle_id: detalle.id,
                ingrediente_id: p.ingrediente_id,
                ingrediente_nombre: p.ingrediente_nombre.clone(),
                incluido: false,
                obligatorio: false,
            }
        }));
        detalles.push(detalle);
    }

    (detalles, personalizaciones)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use crate::dto::order_dto::{ClienteRequest, CotizacionRequest, OrderItemRequest, PersonalizacionRequest};

    pub fn item(nombre: &str, precio: i64, cantidad: i32) -> OrderItemRequest {
        OrderItemRequest {
            producto_id: Uuid::new_v4(),
            producto_nombre: nombre.to_string(),
            precio_unitario: Decimal::from(precio),
            cantidad,
            notas: None,
            personalizaciones: vec![
                PersonalizacionRequest {
                    ingrediente_id: Uuid::new_v4(),
                    ingrediente_nombre: "Cebolla".to_string(),
                    incluido: false,
                    obligatorio: false,
                },
                PersonalizacionRequest {
                    ingrediente_id: Uuid::new_v4(),
                    ingrediente_nombre: "Pan".to_string(),
                    incluido: false,
                    obligatorio: true,
                },
            ],
        }
    }

    pub fn mesa_request() -> CreateOrderRequest {
        CreateOrderRequest {
            cliente: ClienteRequest {
                nombre: "Laura Gómez".to_string(),
                telefono: Some("300 123 4567".to_string()),
                direccion: None,
                notas: None,
            },
            tipo_orden: TipoOrden::Mesa,
            items: vec![item("Hamburguesa", 18000, 2), item("Limonada", 6000, 1)],
            cotizacion: None,
            metodo_pago: None,
            monto_entregado: None,
        }
    }

    pub fn domicilio_request() -> CreateOrderRequest {
        let mut request = mesa_request();
        request.tipo_orden = TipoOrden::Domicilio;
        request.cliente.direccion = Some("Carrera 7 # 72-41".to_string());
        request.cotizacion = Some(CotizacionRequest {
            direccion_formateada: "Carrera 7 # 72-41, Chapinero, Bogotá".to_string(),
            distancia_km: 5.2,
            costo_domicilio: Decimal::from(5800),
            fuera_de_cobertura: false,
        });
        request
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use crate::models::config::fixtures::restaurant_config;
    use crate::repositories::memory::Escritura;
    use crate::repositories::InMemoryStore;
    use crate::utils::validation::normalize_phone;

    fn service(store: &Arc<InMemoryStore>) -> OrderService {
        OrderService::new(store.clone(), store.clone())
    }

    #[tokio::test]
    async fn test_create_mesa_order() {
        let store = Arc::new(InMemoryStore::with_config(restaurant_config()));
        let creada = service(&store).create_order(mesa_request(), None).await.unwrap();

        assert_eq!(creada.orden.subtotal_productos, Decimal::from(42000));
        assert_eq!(creada.orden.total, Decimal::from(42000));
        assert_eq!(creada.orden.cliente_direccion, DIRECCION_EN_LOCAL);
        assert_eq!(creada.orden.estado, EstadoOrden::OrdenTomada);
        assert_eq!(creada.detalles.len(), 2);
        // una exclusión opcional por línea; el pan es obligatorio
        assert_eq!(store.personalization_count().await, 2);
        assert_eq!(store.find_history(creada.orden.id).await.unwrap().len(), 1);
        assert!(creada.cambio_a_devolver.is_none());
    }

    #[tokio::test]
    async fn test_create_delivery_order_adds_fee_and_quoted_address() {
        let store = Arc::new(InMemoryStore::with_config(restaurant_config()));
        let mut request = domicilio_request();
        request.metodo_pago = Some(MetodoPago::Efectivo);
        request.monto_entregado = Some(Decimal::from(50000));

        let creada = service(&store).create_order(request, Some(Uuid::new_v4())).await.unwrap();

        assert_eq!(creada.orden.total, Decimal::from(47800));
        assert_eq!(creada.orden.costo_domicilio, Decimal::from(5800));
        assert_eq!(creada.orden.cliente_direccion, "Carrera 7 # 72-41, Chapinero, Bogotá");
        assert_eq!(creada.cambio_a_devolver, Some(Decimal::from(2200)));
    }

    #[tokio::test]
    async fn test_delivery_requires_quote_address_and_active_service() {
        let store = Arc::new(InMemoryStore::with_config(restaurant_config()));

        let mut sin_cotizacion = domicilio_request();
        sin_cotizacion.cotizacion = None;
        let error = service(&store).create_order(sin_cotizacion, None).await.unwrap_err();
        assert_eq!(error.code(), codes::COTIZACION_REQUERIDA);

        let mut sin_direccion = domicilio_request();
        sin_direccion.cliente.direccion = Some("   ".to_string());
        let error = service(&store).create_order(sin_direccion, None).await.unwrap_err();
        assert_eq!(error.code(), codes::DIRECCION_REQUERIDA);

        let mut config = restaurant_config();
        config.domicilio_activo = false;
        let apagado = Arc::new(InMemoryStore::with_config(config));
        let error = service(&apagado).create_order(domicilio_request(), None).await.unwrap_err();
        assert_eq!(error.code(), codes::SERVICIO_DESHABILITADO);

        assert_eq!(store.order_count().await, 0);
        assert_eq!(apagado.order_count().await, 0);
    }

    #[tokio::test]
    async fn test_delivery_fee_must_match_current_pricing() {
        let store = Arc::new(InMemoryStore::with_config(restaurant_config()));

        let mut alterada = domicilio_request();
        if let Some(cotizacion) = alterada.cotizacion.as_mut() {
            cotizacion.costo_domicilio = Decimal::ONE;
            cotizacion.distancia_km = 9.0;
        }
        let error = service(&store).create_order(alterada, None).await.unwrap_err();
        assert_eq!(error.code(), codes::COTIZACION_INVALIDA);

        let mut distancia_invalida = domicilio_request();
        if let Some(cotizacion) = distancia_invalida.cotizacion.as_mut() {
            cotizacion.distancia_km = f64::NAN;
        }
        let error = service(&store).create_order(distancia_invalida, None).await.unwrap_err();
        assert_eq!(error.code(), codes::COTIZACION_INVALIDA);

        assert_eq!(store.order_count().await, 0);
    }

    #[tokio::test]
    async fn test_detail_failure_removes_order_header() {
        let store = Arc::new(InMemoryStore::with_config(restaurant_config()));
        store.fail_on(Escritura::InsertDetails);

        let request = mesa_request();
        let telefono = request.cliente.telefono.clone().unwrap();
        assert!(service(&store).create_order(request, None).await.is_err());

        assert_eq!(store.order_count().await, 0);
        assert!(store
            .find_latest_by_phone(&normalize_phone(&telefono))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_personalization_failure_rolls_back_everything() {
        let store = Arc::new(InMemoryStore::with_config(restaurant_config()));
        store.fail_on(Escritura::InsertPersonalizations);

        assert!(service(&store).create_order(mesa_request(), None).await.is_err());

        assert_eq!(store.order_count().await, 0);
        assert_eq!(store.detail_count().await, 0);
        assert_eq!(store.personalization_count().await, 0);
    }

    #[tokio::test]
    async fn test_history_failure_does_not_fail_creation() {
        let store = Arc::new(InMemoryStore::with_config(restaurant_config()));
        store.fail_on(Escritura::InsertHistory);

        assert!(service(&store).create_order(mesa_request(), None).await.is_ok());
        assert_eq!(store.order_count().await, 1);
    }

    #[tokio::test]
    async fn test_rejects_invalid_items() {
        let store = Arc::new(InMemoryStore::new());

        let mut vacia = mesa_request();
        vacia.items.clear();
        assert!(matches!(
            service(&store).create_order(vacia, None).await,
            Err(AppError::ValidationError(_))
        ));

        let mut negativa = mesa_request();
        negativa.items[0].precio_unitario = Decimal::from(-1);
        assert!(service(&store).create_order(negativa, None).await.is_err());

        assert_eq!(store.order_count().await, 0);
    }
}
