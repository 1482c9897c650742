//! Utilidades del sistema
//!
//! Este módulo contiene utilidades para manejo de errores, validación,
//! JWT y compensación de escrituras de varios pasos.

pub mod errors;
pub mod jwt;
pub mod saga;
pub mod validation;

pub use errors::{AppError, AppResult};
