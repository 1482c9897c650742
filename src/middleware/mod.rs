//! Middleware del sistema
//!
//! Autenticación por JWT (como extractor de Axum) y CORS.

pub mod auth;
pub mod cors;

pub use auth::*;
pub use cors::*;
