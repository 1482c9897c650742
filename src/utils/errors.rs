//! Sistema de manejo de errores
//!
//! Este módulo define todos los tipos de errores del sistema
//! y su conversión a respuestas HTTP apropiadas. Todas las respuestas
//! de error usan el mismo sobre `{success: false, error, code}` para que
//! la interfaz pueda decidir entre reintentar o bloquear.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Errores principales de la aplicación
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("{0}")]
    ValidationError(String),

    /// Regla de negocio incumplida (servicio deshabilitado, estado incorrecto, ...)
    #[error("{message}")]
    BusinessRule { code: &'static str, message: String },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("JWT error: {0}")]
    Jwt(String),
}

impl AppError {
    pub fn business(code: &'static str, message: impl Into<String>) -> Self {
        AppError::BusinessRule {
            code,
            message: message.into(),
        }
    }

    /// Código estable que la interfaz usa para ramificar
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Database(_) | AppError::DatabaseError(_) => "DB_ERROR",
            AppError::Validation(_) | AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::BusinessRule { code, .. } => *code,
            AppError::Unauthorized(_) => "UNAUTHORIZED",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Conflict(_) => "CONFLICT",
            AppError::Internal(_) => "INTERNAL_ERROR",
            AppError::Jwt(_) => "JWT_ERROR",
        }
    }
}

/// Respuesta de error para la API
#[derive(Debug, serde::Serialize)]
struct ErrorResponse {
    success: bool,
    error: String,
    code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let code = self.code();
        let (status, error, details) = match self {
            AppError::Database(e) => {
                log::error!("❌ Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Ocurrió un error accediendo a la base de datos".to_string(),
                    None,
                )
            }

            AppError::DatabaseError(msg) => {
                log::error!("❌ Database error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Ocurrió un error accediendo a la base de datos".to_string(),
                    None,
                )
            }

            AppError::Validation(e) => {
                log::warn!("⚠️ Validation error: {}", e);
                (
                    StatusCode::BAD_REQUEST,
                    "Los datos enviados no son válidos".to_string(),
                    Some(json!(e)),
                )
            }

            AppError::ValidationError(msg) => {
                log::warn!("⚠️ Validation error: {}", msg);
                (StatusCode::BAD_REQUEST, msg, None)
            }

            AppError::BusinessRule { code, message } => {
                log::warn!("⚠️ Regla de negocio [{}]: {}", code, message);
                (StatusCode::UNPROCESSABLE_ENTITY, message, None)
            }

            AppError::Unauthorized(msg) => {
                log::warn!("🔒 Unauthorized access: {}", msg);
                (StatusCode::UNAUTHORIZED, msg, None)
            }

            AppError::Forbidden(msg) => {
                log::warn!("🔒 Forbidden access: {}", msg);
                (StatusCode::FORBIDDEN, msg, None)
            }

            AppError::NotFound(msg) => {
                log::info!("🔍 Resource not found: {}", msg);
                (StatusCode::NOT_FOUND, msg, None)
            }

            AppError::Conflict(msg) => {
                log::warn!("⚠️ Conflict: {}", msg);
                (StatusCode::CONFLICT, msg, None)
            }

            AppError::Internal(msg) => {
                log::error!("❌ Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Ocurrió un error inesperado".to_string(),
                    None,
                )
            }

            AppError::Jwt(msg) => {
                log::warn!("🔒 JWT error: {}", msg);
                (StatusCode::UNAUTHORIZED, msg, None)
            }
        };

        let body = ErrorResponse {
            success: false,
            error,
            code,
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Resultado tipado para operaciones que pueden fallar
pub type AppResult<T> = Result<T, AppError>;

/// Códigos de reglas de negocio que la interfaz distingue
pub mod codes {
    pub const CONFIGURACION_FALTANTE: &str = "CONFIGURACION_FALTANTE";
    pub const SERVICIO_DESHABILITADO: &str = "SERVICIO_DESHABILITADO";
    pub const DIRECCION_NO_ENCONTRADA: &str = "DIRECCION_NO_ENCONTRADA";
    pub const FUERA_DE_ZONA: &str = "FUERA_DE_ZONA";
    pub const FUERA_DE_COBERTURA: &str = "FUERA_DE_COBERTURA";
    pub const RUTA_FALLIDA: &str = "RUTA_FALLIDA";
    pub const COTIZACION_REQUERIDA: &str = "COTIZACION_REQUERIDA";
    pub const COTIZACION_INVALIDA: &str = "COTIZACION_INVALIDA";
    pub const DIRECCION_REQUERIDA: &str = "DIRECCION_REQUERIDA";
    pub const TIPO_ORDEN_INVALIDO: &str = "TIPO_ORDEN_INVALIDO";
    pub const ESTADO_INVALIDO: &str = "ESTADO_INVALIDO";
    pub const TRANSICION_INVALIDA: &str = "TRANSICION_INVALIDA";
    pub const CANCELACION_NO_PERMITIDA: &str = "CANCELACION_NO_PERMITIDA";
}

/// Función helper para crear errores de recurso no encontrado
pub fn not_found_error(resource: &str, id: &str) -> AppError {
    AppError::NotFound(format!("{} con id '{}' no encontrada", resource, id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_business_rule_keeps_code_and_message() {
        let error = AppError::business("SERVICIO_DESHABILITADO", "El servicio de domicilios está deshabilitado");
        assert_eq!(error.code(), "SERVICIO_DESHABILITADO");
        assert_eq!(error.to_string(), "El servicio de domicilios está deshabilitado");
    }

    #[test]
    fn test_business_rule_maps_to_unprocessable_entity() {
        let response = AppError::business("ESTADO_INVALIDO", "estado incorrecto").into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_not_found_helper() {
        let error = not_found_error("Orden", "abc");
        assert_eq!(error.code(), "NOT_FOUND");
        assert!(error.to_string().contains("abc"));
    }
}
