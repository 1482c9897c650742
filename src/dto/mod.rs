//! Data Transfer Objects
//!
//! Requests y responses de la API HTTP.

pub mod common_dto;
pub mod config_dto;
pub mod delivery_dto;
pub mod order_dto;

pub use common_dto::ApiResponse;
