//! Shared application state
//!
//! Este módulo define el estado compartido de la aplicación que se pasa
//! a través del router de Axum. Los servicios se construyen una sola vez
//! sobre los repositorios elegidos (PostgreSQL o memoria).

use sqlx::PgPool;
use std::sync::Arc;

use crate::config::environment::EnvironmentConfig;
use crate::repositories::{
    AddressCacheRepository, ConfigProvider, ConfigRepository, ConfigStore, InMemoryStore,
    OrderRepository, PaymentRepository, PgAddressCacheRepository, PgOrderRepository,
    PgPaymentRepository, PgRouteCacheRepository, RouteCacheRepository,
};
use crate::services::{
    AddressCacheService, CheckoutService, DeliveryQuoteService, GeocodingProvider, NominatimClient,
    OpenRouteServiceClient, OrderService, OrderStatusService, RouteEngine, RoutingProvider,
};
use crate::utils::jwt::JwtConfig;

/// Repositorios sobre los que se montan los servicios
#[derive(Clone)]
pub struct Repositories {
    pub config_provider: Arc<dyn ConfigProvider>,
    pub config_store: Arc<dyn ConfigStore>,
    pub address_cache: Arc<dyn AddressCacheRepository>,
    pub route_cache: Arc<dyn RouteCacheRepository>,
    pub orders: Arc<dyn OrderRepository>,
    pub payments: Arc<dyn PaymentRepository>,
}

impl Repositories {
    pub fn postgres(pool: PgPool) -> Self {
        let config = Arc::new(ConfigRepository::new(pool.clone()));
        Self {
            config_provider: config.clone(),
            config_store: config,
            address_cache: Arc::new(PgAddressCacheRepository::new(pool.clone())),
            route_cache: Arc::new(PgRouteCacheRepository::new(pool.clone())),
            orders: Arc::new(PgOrderRepository::new(pool.clone())),
            payments: Arc::new(PgPaymentRepository::new(pool)),
        }
    }

    pub fn memory(store: Arc<InMemoryStore>) -> Self {
        Self {
            config_provider: store.clone(),
            config_store: store.clone(),
            address_cache: store.clone(),
            route_cache: store.clone(),
            orders: store.clone(),
            payments: store,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: EnvironmentConfig,
    pub jwt: JwtConfig,
    pub config_store: Arc<dyn ConfigStore>,
    pub quotes: Arc<DeliveryQuoteService>,
    pub orders: Arc<OrderService>,
    pub status: Arc<OrderStatusService>,
    pub checkout: Arc<CheckoutService>,
}

impl AppState {
    /// Montar los servicios con proveedores externos ya construidos
    pub fn from_parts(
        config: EnvironmentConfig,
        repos: Repositories,
        geocoder: Arc<dyn GeocodingProvider>,
        routing: Arc<dyn RoutingProvider>,
    ) -> Self {
        let addresses = Arc::new(AddressCacheService::new(geocoder, repos.address_cache.clone()));
        let routes = Arc::new(RouteEngine::new(routing, repos.route_cache.clone()));
        let quotes = DeliveryQuoteService::new(
            repos.config_provider.clone(),
            addresses,
            routes,
            config.service_area,
        );

        Self {
            jwt: JwtConfig::from(&config),
            config,
            config_store: repos.config_store.clone(),
            quotes: Arc::new(quotes),
            orders: Arc::new(OrderService::new(repos.orders.clone(), repos.config_provider.clone())),
            status: Arc::new(OrderStatusService::new(repos.orders.clone())),
            checkout: Arc::new(CheckoutService::new(repos.orders, repos.payments)),
        }
    }

    /// Estado de producción: PostgreSQL, Nominatim y OpenRouteService
    pub fn postgres(pool: PgPool, config: EnvironmentConfig) -> anyhow::Result<Self> {
        let geocoder = Arc::new(NominatimClient::from_config(&config)?);
        let routing = Arc::new(OpenRouteServiceClient::from_config(&config)?);
        Ok(Self::from_parts(config, Repositories::postgres(pool), geocoder, routing))
    }

    /// Estado en memoria con los proveedores HTTP reales
    pub fn in_memory(config: EnvironmentConfig, store: Arc<InMemoryStore>) -> anyhow::Result<Self> {
        let geocoder = Arc::new(NominatimClient::from_config(&config)?);
        let routing = Arc::new(OpenRouteServiceClient::from_config(&config)?);
        Ok(Self::from_parts(config, Repositories::memory(store), geocoder, routing))
    }
}
