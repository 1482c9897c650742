//! Usuario autenticado
//!
//! El inicio de sesión lo resuelve otro sistema; este servicio solo recibe
//! un token con el id del usuario y su rol.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rol {
    Dueno,
    Administrador,
    Cajero,
    Mesero,
    Domiciliario,
}

impl Rol {
    /// Puede cambiar la configuración del restaurante
    pub fn can_manage_config(&self) -> bool {
        matches!(self, Rol::Dueno | Rol::Administrador)
    }

    /// Puede cobrar órdenes
    pub fn can_settle(&self) -> bool {
        !matches!(self, Rol::Mesero)
    }
}

/// Usuario autenticado que se inyecta en las requests
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub usuario_id: Uuid,
    pub rol: Rol,
}
