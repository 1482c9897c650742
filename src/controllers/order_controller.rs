use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::dto::order_dto::{
    AdvanceStatusRequest, CancelOrderRequest, CreateOrderRequest, CreateOrderResponse,
    OrderLookupResponse, SettleOrderRequest, SettlementResponse,
};
use crate::dto::ApiResponse;
use crate::middleware::auth::require_settle_permission;
use crate::models::auth::AuthenticatedUser;
use crate::models::order::{HistorialEntry, Order};
use crate::services::{CheckoutService, OrderService, OrderStatusService};
use crate::utils::errors::AppError;

pub struct OrderController {
    orders: Arc<OrderService>,
    status: Arc<OrderStatusService>,
    checkout: Arc<CheckoutService>,
}

impl OrderController {
    pub fn new(
        orders: Arc<OrderService>,
        status: Arc<OrderStatusService>,
        checkout: Arc<CheckoutService>,
    ) -> Self {
        Self {
            orders,
            status,
            checkout,
        }
    }

    pub async fn create(
        &self,
        user: &AuthenticatedUser,
        request: CreateOrderRequest,
    ) -> Result<ApiResponse<CreateOrderResponse>, AppError> {
        request.validate()?;

        let response = self.orders.create_order(request, Some(user.usuario_id)).await?;
        let message = format!("Orden #{} creada exitosamente", response.orden.id);
        Ok(ApiResponse::success_with_message(response, message))
    }

    pub async fn find_by_phone(&self, telefono: &str) -> Result<ApiResponse<OrderLookupResponse>, AppError> {
        let lookup = self.status.find_latest_order_by_phone(telefono).await?;
        Ok(ApiResponse::success(lookup))
    }

    pub async fn cancel(
        &self,
        orden_id: Uuid,
        request: CancelOrderRequest,
    ) -> Result<ApiResponse<Order>, AppError> {
        request.validate()?;

        let orden = self.status.cancel_order(orden_id, request.motivo).await?;
        Ok(ApiResponse::success_with_message(orden, "Orden cancelada"))
    }

    pub async fn advance_status(
        &self,
        user: &AuthenticatedUser,
        orden_id: Uuid,
        request: AdvanceStatusRequest,
    ) -> Result<ApiResponse<Order>, AppError> {
        let orden = self
            .status
            .advance_status(orden_id, request.estado, user.usuario_id)
            .await?;
        let message = format!("Orden en estado {}", orden.estado);
        Ok(ApiResponse::success_with_message(orden, message))
    }

    pub async fn settle(
        &self,
        user: &AuthenticatedUser,
        orden_id: Uuid,
        request: SettleOrderRequest,
    ) -> Result<ApiResponse<SettlementResponse>, AppError> {
        require_settle_permission(user)?;
        request.validate()?;

        let liquidacion = self
            .checkout
            .settle_order(orden_id, user.usuario_id, request)
            .await?;
        Ok(ApiResponse::success_with_message(liquidacion, "Orden liquidada"))
    }

    pub async fn register_print(
        &self,
        user: &AuthenticatedUser,
        orden_id: Uuid,
    ) -> Result<ApiResponse<HistorialEntry>, AppError> {
        let entrada = self.status.register_print(orden_id, user.usuario_id).await?;
        Ok(ApiResponse::success(entrada))
    }
}
