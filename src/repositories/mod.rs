//! Repositorios
//!
//! Cada tabla (o grupo de tablas) se accede a través de un trait para
//! poder cambiar PostgreSQL por el almacenamiento en memoria.

pub mod address_cache_repository;
pub mod config_repository;
pub mod memory;
pub mod order_repository;
pub mod payment_repository;
pub mod route_cache_repository;

pub use address_cache_repository::{AddressCacheRepository, PgAddressCacheRepository};
pub use config_repository::{ConfigProvider, ConfigRepository, ConfigStore};
pub use memory::InMemoryStore;
pub use order_repository::{OrderRepository, PgOrderRepository};
pub use payment_repository::{PaymentRepository, PgPaymentRepository};
pub use route_cache_repository::{PgRouteCacheRepository, RouteCacheRepository};
