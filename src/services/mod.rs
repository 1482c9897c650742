//! Services module
//!
//! Lógica de negocio: cotización de domicilios (geocodificación, rutas y
//! tarifa) y ciclo de vida de las órdenes (creación, estados, liquidación).
//! Los servicios dependen de traits de repositorio y de proveedores
//! externos, nunca de una conexión concreta.

pub mod address_cache_service;
pub mod checkout_service;
pub mod delivery_quote_service;
pub mod geocoding_service;
pub mod order_service;
pub mod order_status_service;
pub mod pricing;
pub mod route_engine;
pub mod routing_service;

pub use address_cache_service::AddressCacheService;
pub use checkout_service::CheckoutService;
pub use delivery_quote_service::{DeliveryQuote, DeliveryQuoteService};
pub use geocoding_service::{GeocodingProvider, NominatimClient};
pub use order_service::OrderService;
pub use order_status_service::OrderStatusService;
pub use route_engine::RouteEngine;
pub use routing_service::{OpenRouteServiceClient, RoutingProvider};
