//! Almacenamiento en memoria
//!
//! Implementa todos los repositorios sobre un `RwLock`. Se usa con
//! `STORAGE_BACKEND=memory` para levantar el servicio sin PostgreSQL y en
//! las pruebas, donde además permite simular fallas de escritura.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::address::AddressCacheEntry;
use crate::models::config::RestaurantConfig;
use crate::models::order::{
    EstadoOrden, HistorialEntry, NewOrder, Order, OrdenDetalle, Personalizacion, StatusChange,
};
use crate::models::payment::{Pago, Propina};
use crate::models::route::RouteCacheEntry;
use crate::repositories::address_cache_repository::AddressCacheRepository;
use crate::repositories::config_repository::{ConfigProvider, ConfigStore};
use crate::repositories::order_repository::OrderRepository;
use crate::repositories::payment_repository::PaymentRepository;
use crate::repositories::route_cache_repository::RouteCacheRepository;
use crate::utils::errors::AppError;
use crate::utils::validation::normalize_phone;

/// Escrituras que se pueden hacer fallar a propósito
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Escritura {
    InsertOrder,
    InsertDetails,
    InsertPersonalizations,
    InsertHistory,
    InsertPayment,
    InsertTip,
    TransitionStatus,
    DeleteOrder,
    DeletePayment,
}

#[derive(Default)]
struct Tablas {
    config: Option<RestaurantConfig>,
    direcciones: HashMap<String, AddressCacheEntry>,
    rutas: HashMap<String, RouteCacheEntry>,
    ordenes: HashMap<Uuid, Order>,
    detalles: Vec<OrdenDetalle>,
    personalizaciones: Vec<Personalizacion>,
    historial: Vec<HistorialEntry>,
    pagos: Vec<Pago>,
    propinas: Vec<Propina>,
}

#[derive(Default)]
pub struct InMemoryStore {
    tablas: RwLock<Tablas>,
    fallas: Mutex<HashSet<Escritura>>,
    carreras: Mutex<u32>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: RestaurantConfig) -> Self {
        Self {
            tablas: RwLock::new(Tablas {
                config: Some(config),
                ..Tablas::default()
            }),
            ..Self::default()
        }
    }

    /// La escritura indicada falla con `DatabaseError` hasta llamar `clear_failures`
    pub fn fail_on(&self, escritura: Escritura) {
        if let Ok(mut fallas) = self.fallas.lock() {
            fallas.insert(escritura);
        }
    }

    pub fn clear_failures(&self) {
        if let Ok(mut fallas) = self.fallas.lock() {
            fallas.clear();
        }
    }

    /// La próxima transición condicional encuentra la orden en otro estado
    pub fn lose_next_transition_race(&self) {
        if let Ok(mut carreras) = self.carreras.lock() {
            *carreras += 1;
        }
    }

    fn check(&self, escritura: Escritura) -> Result<(), AppError> {
        let falla = self
            .fallas
            .lock()
            .map(|fallas| fallas.contains(&escritura))
            .unwrap_or(false);
        if falla {
            return Err(AppError::DatabaseError(format!("Falla simulada en {:?}", escritura)));
        }
        Ok(())
    }

    fn take_race(&self) -> bool {
        match self.carreras.lock() {
            Ok(mut carreras) if *carreras > 0 => {
                *carreras -= 1;
                true
            }
            _ => false,
        }
    }

    /// Inserta una orden tal cual, sin pasar por la creación normal
    pub async fn seed_order(&self, orden: Order) {
        self.tablas.write().await.ordenes.insert(orden.id, orden);
    }

    pub async fn order_count(&self) -> usize {
        self.tablas.read().await.ordenes.len()
    }

    pub async fn detail_count(&self) -> usize {
        self.tablas.read().await.detalles.len()
    }

    pub async fn personalization_count(&self) -> usize {
        self.tablas.read().await.personalizaciones.len()
    }

    pub async fn payment_count(&self) -> usize {
        self.tablas.read().await.pagos.len()
    }

    pub async fn tips(&self) -> Vec<Propina> {
        self.tablas.read().await.propinas.clone()
    }

    pub async fn address_cache_len(&self) -> usize {
        self.tablas.read().await.direcciones.len()
    }

    pub async fn route_cache_len(&self) -> usize {
        self.tablas.read().await.rutas.len()
    }

    /// Envejece todas las entradas de caché (para probar la limpieza)
    pub async fn backdate_caches(&self, created_at: DateTime<Utc>) {
        let mut tablas = self.tablas.write().await;
        for entry in tablas.direcciones.values_mut() {
            entry.created_at = created_at;
        }
        for entry in tablas.rutas.values_mut() {
            entry.created_at = created_at;
        }
    }
}

#[async_trait]
impl ConfigProvider for InMemoryStore {
    async fn get_active_config(&self) -> Result<Option<RestaurantConfig>, AppError> {
        Ok(self.tablas.read().await.config.clone())
    }
}

#[async_trait]
impl ConfigStore for InMemoryStore {
    async fn save_active_config(&self, config: &RestaurantConfig) -> Result<RestaurantConfig, AppError> {
        let mut tablas = self.tablas.write().await;
        let mut guardada = config.clone();
        if let Some(actual) = &tablas.config {
            guardada.id = actual.id;
        }
        guardada.updated_at = Utc::now();
        tablas.config = Some(guardada.clone());
        Ok(guardada)
    }
}

#[async_trait]
impl AddressCacheRepository for InMemoryStore {
    async fn find_by_key(&self, clave: &str) -> Result<Option<AddressCacheEntry>, AppError> {
        Ok(self.tablas.read().await.direcciones.get(clave).cloned())
    }

    async fn insert(&self, entry: &AddressCacheEntry) -> Result<(), AppError> {
        self.tablas
            .write()
            .await
            .direcciones
            .entry(entry.clave.clone())
            .or_insert_with(|| entry.clone());
        Ok(())
    }

    async fn delete_older_than(&self, limite: DateTime<Utc>) -> Result<u64, AppError> {
        let mut tablas = self.tablas.write().await;
        let antes = tablas.direcciones.len();
        tablas.direcciones.retain(|_, entry| entry.created_at >= limite);
        Ok((antes - tablas.direcciones.len()) as u64)
    }
}

#[async_trait]
impl RouteCacheRepository for InMemoryStore {
    async fn find_by_key(&self, clave: &str) -> Result<Option<RouteCacheEntry>, AppError> {
        Ok(self.tablas.read().await.rutas.get(clave).cloned())
    }

    async fn insert(&self, entry: &RouteCacheEntry) -> Result<(), AppError> {
        self.tablas
            .write()
            .await
            .rutas
            .entry(entry.clave.clone())
            .or_insert_with(|| entry.clone());
        Ok(())
    }

    async fn delete_older_than(&self, limite: DateTime<Utc>) -> Result<u64, AppError> {
        let mut tablas = self.tablas.write().await;
        let antes = tablas.rutas.len();
        tablas.rutas.retain(|_, entry| entry.created_at >= limite);
        Ok((antes - tablas.rutas.len()) as u64)
    }
}

#[async_trait]
impl OrderRepository for InMemoryStore {
    async fn insert_order(&self, orden: &NewOrder) -> Result<Order, AppError> {
        self.check(Escritura::InsertOrder)?;
        let now = Utc::now();
        let creada = Order {
            id: orden.id,
            cliente_nombre: orden.cliente_nombre.clone(),
            cliente_telefono: orden.cliente_telefono.clone(),
            cliente_direccion: orden.cliente_direccion.clone(),
            cliente_notas: orden.cliente_notas.clone(),
            total: orden.total,
            estado: EstadoOrden::OrdenTomada,
            tipo_orden: orden.tipo_orden.as_str().to_string(),
            costo_domicilio: orden.costo_domicilio,
            distancia_km: orden.distancia_km,
            metodo_pago: orden.metodo_pago,
            subtotal_productos: orden.subtotal_productos,
            total_final: Some(orden.total),
            usuario_vendedor_id: orden.usuario_vendedor_id,
            usuario_entregador_id: None,
            created_at: now,
            updated_at: now,
            fecha_entrega: None,
        };
        self.tablas.write().await.ordenes.insert(creada.id, creada.clone());
        Ok(creada)
    }

    async fn delete_order(&self, id: Uuid) -> Result<(), AppError> {
        self.check(Escritura::DeleteOrder)?;
        self.tablas.write().await.ordenes.remove(&id);
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, AppError> {
        Ok(self.tablas.read().await.ordenes.get(&id).cloned())
    }

    async fn find_latest_by_phone(&self, normalizado: &str) -> Result<Option<Order>, AppError> {
        let tablas = self.tablas.read().await;
        let orden = tablas
            .ordenes
            .values()
            .filter(|o| {
                o.cliente_telefono
                    .as_deref()
                    .map(|t| normalize_phone(t) == normalizado)
                    .unwrap_or(false)
            })
            .max_by_key(|o| o.created_at)
            .cloned();
        Ok(orden)
    }

    async fn insert_details(&self, detalles: &[OrdenDetalle]) -> Result<Vec<OrdenDetalle>, AppError> {
        self.check(Escritura::InsertDetails)?;
        self.tablas.write().await.detalles.extend_from_slice(detalles);
        Ok(detalles.to_vec())
    }

    async fn delete_details_by_order(&self, orden_id: Uuid) -> Result<(), AppError> {
        let mut tablas = self.tablas.write().await;
        let ids: HashSet<Uuid> = tablas
            .detalles
            .iter()
            .filter(|d| d.orden_id == orden_id)
            .map(|d| d.id)
            .collect();
        tablas.personalizaciones.retain(|p| !ids.contains(&p.orden_detalle_id));
        tablas.detalles.retain(|d| d.orden_id != orden_id);
        Ok(())
    }

    async fn find_details(&self, orden_id: Uuid) -> Result<Vec<OrdenDetalle>, AppError> {
        let tablas = self.tablas.read().await;
        Ok(tablas.detalles.iter().filter(|d| d.orden_id == orden_id).cloned().collect())
    }

    async fn insert_personalizations(&self, filas: &[Personalizacion]) -> Result<(), AppError> {
        self.check(Escritura::InsertPersonalizations)?;
        self.tablas.write().await.personalizaciones.extend_from_slice(filas);
        Ok(())
    }

    async fn transition_status(
        &self,
        id: Uuid,
        esperado: EstadoOrden,
        cambio: &StatusChange,
    ) -> Result<Option<Order>, AppError> {
        self.check(Escritura::TransitionStatus)?;
        if self.take_race() {
            return Ok(None);
        }

        let mut tablas = self.tablas.write().await;
        let orden = match tablas.ordenes.get_mut(&id) {
            Some(orden) if orden.estado == esperado => orden,
            _ => return Ok(None),
        };

        orden.estado = cambio.estado_nuevo;
        if let Some(metodo) = cambio.metodo_pago {
            orden.metodo_pago = Some(metodo);
        }
        if let Some(fecha) = cambio.fecha_entrega {
            orden.fecha_entrega = Some(fecha);
        }
        if let Some(usuario) = cambio.usuario_entregador_id {
            orden.usuario_entregador_id = Some(usuario);
        }
        orden.updated_at = Utc::now();
        Ok(Some(orden.clone()))
    }

    async fn insert_history(&self, entrada: &HistorialEntry) -> Result<(), AppError> {
        self.check(Escritura::InsertHistory)?;
        self.tablas.write().await.historial.push(entrada.clone());
        Ok(())
    }

    async fn find_history(&self, orden_id: Uuid) -> Result<Vec<HistorialEntry>, AppError> {
        let tablas = self.tablas.read().await;
        Ok(tablas.historial.iter().filter(|h| h.orden_id == orden_id).cloned().collect())
    }
}

#[async_trait]
impl PaymentRepository for InMemoryStore {
    async fn insert_payment(&self, pago: &Pago) -> Result<Pago, AppError> {
        self.check(Escritura::InsertPayment)?;
        self.tablas.write().await.pagos.push(pago.clone());
        Ok(pago.clone())
    }

    async fn delete_payment(&self, id: Uuid) -> Result<(), AppError> {
        self.check(Escritura::DeletePayment)?;
        self.tablas.write().await.pagos.retain(|p| p.id != id);
        Ok(())
    }

    async fn insert_tip(&self, propina: &Propina) -> Result<Propina, AppError> {
        self.check(Escritura::InsertTip)?;
        self.tablas.write().await.propinas.push(propina.clone());
        Ok(propina.clone())
    }

    async fn delete_tips_by_payment(&self, pago_id: Uuid) -> Result<(), AppError> {
        self.tablas.write().await.propinas.retain(|p| p.pago_id != pago_id);
        Ok(())
    }

    async fn find_by_order(&self, orden_id: Uuid) -> Result<Vec<Pago>, AppError> {
        let tablas = self.tablas.read().await;
        Ok(tablas.pagos.iter().filter(|p| p.orden_id == orden_id).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::config::fixtures::restaurant_config;
    use crate::models::order::fixtures::order;
    use crate::models::order::TipoOrden;
    use chrono::Duration;

    #[tokio::test]
    async fn test_transition_status_requires_expected_state() {
        let store = InMemoryStore::new();
        let orden = order(TipoOrden::Mesa, EstadoOrden::Lista, Utc::now());
        let id = orden.id;
        store.seed_order(orden).await;

        let fallida = store
            .transition_status(id, EstadoOrden::OrdenTomada, &StatusChange::to(EstadoOrden::Cancelada))
            .await
            .unwrap();
        assert!(fallida.is_none());

        let aplicada = store
            .transition_status(id, EstadoOrden::Lista, &StatusChange::to(EstadoOrden::Entregada))
            .await
            .unwrap();
        assert_eq!(aplicada.unwrap().estado, EstadoOrden::Entregada);
    }

    #[tokio::test]
    async fn test_find_latest_by_phone_matches_normalized_form() {
        let store = InMemoryStore::new();
        let ahora = Utc::now();
        let mut vieja = order(TipoOrden::Mesa, EstadoOrden::Entregada, ahora - Duration::hours(2));
        vieja.cliente_telefono = Some("300 123 4567".to_string());
        let nueva = order(TipoOrden::Domicilio, EstadoOrden::OrdenTomada, ahora);
        let nueva_id = nueva.id;
        store.seed_order(vieja).await;
        store.seed_order(nueva).await;

        let encontrada = store.find_latest_by_phone("3001234567").await.unwrap().unwrap();
        assert_eq!(encontrada.id, nueva_id);
        assert!(store.find_latest_by_phone("300123456").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_active_config_keeps_single_row() {
        let store = InMemoryStore::with_config(restaurant_config());
        let original_id = store.get_active_config().await.unwrap().unwrap().id;

        let mut nueva = restaurant_config();
        nueva.costo_por_km = rust_decimal::Decimal::from(900);
        let guardada = store.save_active_config(&nueva).await.unwrap();

        assert_eq!(guardada.id, original_id);
        assert_eq!(guardada.costo_por_km, rust_decimal::Decimal::from(900));
    }

    #[tokio::test]
    async fn test_simulated_failure() {
        let store = InMemoryStore::new();
        store.fail_on(Escritura::InsertPayment);
        let pago = Pago::new(Uuid::new_v4(), None, crate::models::payment::MetodoPago::Efectivo, rust_decimal::Decimal::from(1000));
        assert!(store.insert_payment(&pago).await.is_err());

        store.clear_failures();
        assert!(store.insert_payment(&pago).await.is_ok());
    }
}
