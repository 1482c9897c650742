pub mod config_controller;
pub mod delivery_controller;
pub mod order_controller;

pub use config_controller::ConfigController;
pub use delivery_controller::DeliveryController;
pub use order_controller::OrderController;
