//! Middleware de autenticación
//!
//! Extrae el usuario autenticado del header `Authorization: Bearer <token>`.
//! Los handlers que lo declaran como argumento quedan protegidos.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use uuid::Uuid;

use crate::{
    models::auth::AuthenticatedUser,
    state::AppState,
    utils::{
        errors::AppError,
        jwt::{extract_token_from_header, verify_token},
    },
};

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("Header Authorization requerido".to_string()))?;

        let token = extract_token_from_header(auth_header)
            .map_err(|e| AppError::Unauthorized(e.to_string()))?;

        let claims = verify_token(token, &state.jwt)
            .map_err(|e| AppError::Unauthorized(e.to_string()))?;

        let usuario_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AppError::Unauthorized("Token con usuario inválido".to_string()))?;

        log::debug!("🔐 Usuario autenticado: {} ({:?})", usuario_id, claims.rol);

        Ok(AuthenticatedUser {
            usuario_id,
            rol: claims.rol,
        })
    }
}

/// Falla con 403 si el rol no puede cobrar órdenes
pub fn require_settle_permission(user: &AuthenticatedUser) -> Result<(), AppError> {
    if !user.rol.can_settle() {
        return Err(AppError::Forbidden(
            "Tu rol no puede liquidar órdenes".to_string(),
        ));
    }
    Ok(())
}

/// Falla con 403 si el rol no puede modificar la configuración
pub fn require_config_permission(user: &AuthenticatedUser) -> Result<(), AppError> {
    if !user.rol.can_manage_config() {
        return Err(AppError::Forbidden(
            "Solo el dueño o un administrador puede modificar la configuración".to_string(),
        ));
    }
    Ok(())
}
