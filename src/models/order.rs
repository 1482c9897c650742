//! Modelo de Orden
//!
//! Mapea las tablas `ordenes`, `orden_detalles`, `orden_personalizaciones`
//! y `orden_historial`, y define el ciclo de vida de una orden.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::models::payment::MetodoPago;

/// Ventana en la que el cliente todavía puede cancelar su orden
pub const VENTANA_CANCELACION_MINUTOS: i64 = 15;

/// Dirección guardada para órdenes que no son a domicilio
pub const DIRECCION_EN_LOCAL: &str = "En el local";

/// Estado de la orden - se guarda como texto en `ordenes.estado`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EstadoOrden {
    OrdenTomada,
    EnPreparacion,
    Lista,
    EnCamino,
    LlegueADestino,
    Entregada,
    Cancelada,
}

impl EstadoOrden {
    pub fn as_str(&self) -> &'static str {
        match self {
            EstadoOrden::OrdenTomada => "orden_tomada",
            EstadoOrden::EnPreparacion => "en_preparacion",
            EstadoOrden::Lista => "lista",
            EstadoOrden::EnCamino => "en_camino",
            EstadoOrden::LlegueADestino => "llegue_a_destino",
            EstadoOrden::Entregada => "entregada",
            EstadoOrden::Cancelada => "cancelada",
        }
    }
}

impl fmt::Display for EstadoOrden {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tipo de orden. En la base de datos es texto libre, por eso se
/// interpreta al leerla y un valor desconocido se rechaza.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TipoOrden {
    Mesa,
    ParaLlevar,
    Domicilio,
    Establecimiento,
}

impl TipoOrden {
    pub fn as_str(&self) -> &'static str {
        match self {
            TipoOrden::Mesa => "mesa",
            TipoOrden::ParaLlevar => "para_llevar",
            TipoOrden::Domicilio => "domicilio",
            TipoOrden::Establecimiento => "establecimiento",
        }
    }

    /// Secuencia de estados que recorre una orden de este tipo hasta entregarse
    pub fn flujo(&self) -> &'static [EstadoOrden] {
        use EstadoOrden::*;
        match self {
            TipoOrden::Domicilio => &[OrdenTomada, EnPreparacion, Lista, EnCamino, LlegueADestino, Entregada],
            _ => &[OrdenTomada, EnPreparacion, Lista, Entregada],
        }
    }

    /// Estado en el que debe estar la orden para poder liquidarla
    pub fn estado_para_liquidar(&self) -> EstadoOrden {
        match self {
            TipoOrden::Domicilio => EstadoOrden::LlegueADestino,
            _ => EstadoOrden::Lista,
        }
    }

    /// Siguiente estado del flujo, si existe
    pub fn siguiente_estado(&self, actual: EstadoOrden) -> Option<EstadoOrden> {
        let flujo = self.flujo();
        flujo
            .iter()
            .position(|estado| *estado == actual)
            .and_then(|i| flujo.get(i + 1))
            .copied()
    }
}

impl fmt::Display for TipoOrden {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TipoOrden {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "mesa" => Ok(TipoOrden::Mesa),
            "para_llevar" => Ok(TipoOrden::ParaLlevar),
            "domicilio" => Ok(TipoOrden::Domicilio),
            "establecimiento" => Ok(TipoOrden::Establecimiento),
            other => Err(format!("Tipo de orden inválido: '{}'", other)),
        }
    }
}

/// Orden principal - mapea exactamente a la tabla ordenes
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Order {
    pub id: Uuid,
    pub cliente_nombre: String,
    pub cliente_telefono: Option<String>,
    pub cliente_direccion: String,
    pub cliente_notas: Option<String>,
    pub total: Decimal,
    pub estado: EstadoOrden,
    pub tipo_orden: String,
    pub costo_domicilio: Decimal,
    pub distancia_km: Option<f64>,
    pub metodo_pago: Option<MetodoPago>,
    pub subtotal_productos: Decimal,
    pub total_final: Option<Decimal>,
    pub usuario_vendedor_id: Option<Uuid>,
    pub usuario_entregador_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub fecha_entrega: Option<DateTime<Utc>>,
}

/// Motivo por el que una orden ya no se puede cancelar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BloqueoCancelacion {
    EnPreparacion,
    YaLista,
    YaEntregada,
    YaCancelada,
    TiempoExcedido,
}

impl BloqueoCancelacion {
    pub fn mensaje(&self) -> &'static str {
        match self {
            BloqueoCancelacion::EnPreparacion => "La orden ya está en preparación y no se puede cancelar",
            BloqueoCancelacion::YaLista => "La orden ya está lista o en camino y no se puede cancelar",
            BloqueoCancelacion::YaEntregada => "La orden ya fue entregada",
            BloqueoCancelacion::YaCancelada => "La orden ya fue cancelada",
            BloqueoCancelacion::TiempoExcedido => {
                "Pasaron más de 15 minutos desde que se tomó la orden; ya no se puede cancelar"
            }
        }
    }
}

impl Order {
    pub fn tipo(&self) -> Result<TipoOrden, String> {
        self.tipo_orden.parse()
    }

    /// Total a cobrar antes de propina
    pub fn total_a_cobrar(&self) -> Decimal {
        self.total_final.unwrap_or(self.total)
    }

    /// Regla única de cancelación: solo `orden_tomada` y dentro de la ventana.
    /// La usan tanto la consulta por teléfono como la acción de cancelar.
    pub fn bloqueo_cancelacion(&self, ahora: DateTime<Utc>) -> Option<BloqueoCancelacion> {
        match self.estado {
            EstadoOrden::OrdenTomada => {}
            EstadoOrden::EnPreparacion => return Some(BloqueoCancelacion::EnPreparacion),
            EstadoOrden::Lista | EstadoOrden::EnCamino | EstadoOrden::LlegueADestino => {
                return Some(BloqueoCancelacion::YaLista)
            }
            EstadoOrden::Entregada => return Some(BloqueoCancelacion::YaEntregada),
            EstadoOrden::Cancelada => return Some(BloqueoCancelacion::YaCancelada),
        }

        if ahora - self.created_at > Duration::minutes(VENTANA_CANCELACION_MINUTOS) {
            return Some(BloqueoCancelacion::TiempoExcedido);
        }
        None
    }

    pub fn puede_cancelar(&self, ahora: DateTime<Utc>) -> bool {
        self.bloqueo_cancelacion(ahora).is_none()
    }

    /// Segundos que quedan para cancelar (0 si ya no se puede)
    pub fn segundos_restantes_cancelacion(&self, ahora: DateTime<Utc>) -> i64 {
        if !self.puede_cancelar(ahora) {
            return 0;
        }
        let limite = self.created_at + Duration::minutes(VENTANA_CANCELACION_MINUTOS);
        (limite - ahora).num_seconds().max(0)
    }
}

/// Datos para insertar la cabecera de una orden
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub id: Uuid,
    pub cliente_nombre: String,
    pub cliente_telefono: Option<String>,
    pub cliente_direccion: String,
    pub cliente_notas: Option<String>,
    pub total: Decimal,
    pub tipo_orden: TipoOrden,
    pub costo_domicilio: Decimal,
    pub distancia_km: Option<f64>,
    pub metodo_pago: Option<MetodoPago>,
    pub subtotal_productos: Decimal,
    pub usuario_vendedor_id: Option<Uuid>,
}

/// Línea de la orden; inmutable después de crearse
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct OrdenDetalle {
    pub id: Uuid,
    pub orden_id: Uuid,
    pub producto_id: Uuid,
    pub producto_nombre: String,
    pub precio_unitario: Decimal,
    pub cantidad: i32,
    pub subtotal: Decimal,
    pub notas_personalizacion: Option<String>,
}

/// Ingrediente excluido de una línea. Solo se guardan exclusiones no obligatorias.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Personalizacion {
    pub id: Uuid,
    pub orden_detalle_id: Uuid,
    pub ingrediente_id: Uuid,
    pub ingrediente_nombre: String,
    pub incluido: bool,
    pub obligatorio: bool,
}

/// Entrada del historial de la orden (solo inserción)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct HistorialEntry {
    pub id: Uuid,
    pub orden_id: Uuid,
    pub estado_anterior: Option<EstadoOrden>,
    pub estado_nuevo: EstadoOrden,
    pub usuario_id: Option<Uuid>,
    pub notas: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl HistorialEntry {
    pub fn new(
        orden_id: Uuid,
        estado_anterior: Option<EstadoOrden>,
        estado_nuevo: EstadoOrden,
        usuario_id: Option<Uuid>,
        notas: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            orden_id,
            estado_anterior,
            estado_nuevo,
            usuario_id,
            notas: Some(notas.into()),
            created_at: Utc::now(),
        }
    }
}

/// Cambios que acompañan una transición de estado; `None` conserva el valor actual
#[derive(Debug, Clone)]
pub struct StatusChange {
    pub estado_nuevo: EstadoOrden,
    pub metodo_pago: Option<MetodoPago>,
    pub fecha_entrega: Option<DateTime<Utc>>,
    pub usuario_entregador_id: Option<Uuid>,
}

impl StatusChange {
    pub fn to(estado_nuevo: EstadoOrden) -> Self {
        Self {
            estado_nuevo,
            metodo_pago: None,
            fecha_entrega: None,
            usuario_entregador_id: None,
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn order(tipo: TipoOrden, estado: EstadoOrden, created_at: DateTime<Utc>) -> Order {
        Order {
            id: Uuid::new_v4(),
            cliente_nombre: "Laura Gómez".to_string(),
            cliente_telefono: Some("3001234567".to_string()),
            cliente_direccion: DIRECCION_EN_LOCAL.to_string(),
            cliente_notas: None,
            total: Decimal::from(30000),
            estado,
            tipo_orden: tipo.as_str().to_string(),
            costo_domicilio: Decimal::ZERO,
            distancia_km: None,
            metodo_pago: None,
            subtotal_productos: Decimal::from(30000),
            total_final: Some(Decimal::from(30000)),
            usuario_vendedor_id: None,
            usuario_entregador_id: None,
            created_at,
            updated_at: created_at,
            fecha_entrega: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::order;
    use super::*;

    #[test]
    fn test_flujo_domicilio_includes_delivery_steps() {
        let tipo = TipoOrden::Domicilio;
        assert_eq!(tipo.siguiente_estado(EstadoOrden::Lista), Some(EstadoOrden::EnCamino));
        assert_eq!(tipo.siguiente_estado(EstadoOrden::EnCamino), Some(EstadoOrden::LlegueADestino));
        assert_eq!(tipo.siguiente_estado(EstadoOrden::LlegueADestino), Some(EstadoOrden::Entregada));
        assert_eq!(tipo.siguiente_estado(EstadoOrden::Entregada), None);
    }

    #[test]
    fn test_flujo_mesa_skips_delivery_steps() {
        let tipo = TipoOrden::Mesa;
        assert_eq!(tipo.siguiente_estado(EstadoOrden::Lista), Some(EstadoOrden::Entregada));
        assert_eq!(tipo.siguiente_estado(EstadoOrden::EnCamino), None);
        assert_eq!(tipo.siguiente_estado(EstadoOrden::Cancelada), None);
    }

    #[test]
    fn test_estado_para_liquidar() {
        assert_eq!(TipoOrden::Domicilio.estado_para_liquidar(), EstadoOrden::LlegueADestino);
        assert_eq!(TipoOrden::Mesa.estado_para_liquidar(), EstadoOrden::Lista);
        assert_eq!(TipoOrden::ParaLlevar.estado_para_liquidar(), EstadoOrden::Lista);
        assert_eq!(TipoOrden::Establecimiento.estado_para_liquidar(), EstadoOrden::Lista);
    }

    #[test]
    fn test_tipo_orden_from_str_rejects_unknown() {
        assert_eq!("para_llevar".parse::<TipoOrden>(), Ok(TipoOrden::ParaLlevar));
        assert!("drive_thru".parse::<TipoOrden>().is_err());
    }

    #[test]
    fn test_cancellation_window_boundaries() {
        let creada = Utc::now();
        let orden = order(TipoOrden::Mesa, EstadoOrden::OrdenTomada, creada);

        assert!(orden.puede_cancelar(creada + Duration::seconds(14 * 60 + 59)));
        assert!(orden.puede_cancelar(creada + Duration::minutes(15)));
        assert_eq!(
            orden.bloqueo_cancelacion(creada + Duration::seconds(15 * 60 + 1)),
            Some(BloqueoCancelacion::TiempoExcedido)
        );
    }

    #[test]
    fn test_cancellation_blocked_by_state() {
        let creada = Utc::now();
        let casos = [
            (EstadoOrden::EnPreparacion, BloqueoCancelacion::EnPreparacion),
            (EstadoOrden::Lista, BloqueoCancelacion::YaLista),
            (EstadoOrden::EnCamino, BloqueoCancelacion::YaLista),
            (EstadoOrden::Entregada, BloqueoCancelacion::YaEntregada),
            (EstadoOrden::Cancelada, BloqueoCancelacion::YaCancelada),
        ];
        for (estado, esperado) in casos {
            let orden = order(TipoOrden::Domicilio, estado, creada);
            assert_eq!(orden.bloqueo_cancelacion(creada), Some(esperado));
        }
    }

    #[test]
    fn test_segundos_restantes_cancelacion() {
        let creada = Utc::now();
        let orden = order(TipoOrden::Mesa, EstadoOrden::OrdenTomada, creada);
        assert_eq!(orden.segundos_restantes_cancelacion(creada + Duration::minutes(10)), 300);
        assert_eq!(orden.segundos_restantes_cancelacion(creada + Duration::minutes(20)), 0);
    }

    #[test]
    fn test_total_a_cobrar_falls_back_to_total() {
        let mut orden = order(TipoOrden::Mesa, EstadoOrden::Lista, Utc::now());
        orden.total_final = None;
        orden.total = Decimal::from(12500);
        assert_eq!(orden.total_a_cobrar(), Decimal::from(12500));
    }
}
