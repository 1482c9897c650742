//! Utilidades compartidas por las pruebas HTTP

#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{NaiveTime, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

use restaurant_delivery::config::environment::EnvironmentConfig;
use restaurant_delivery::models::auth::Rol;
use restaurant_delivery::models::config::RestaurantConfig;
use restaurant_delivery::repositories::InMemoryStore;
use restaurant_delivery::routes::create_router;
use restaurant_delivery::state::{AppState, Repositories};
use restaurant_delivery::testing::{FakeGeocoder, FakeRouting};
use restaurant_delivery::utils::jwt::{generate_token, JwtConfig};

pub const DIRECCION_CERCANA: &str = "Calle 72 # 10-34";
pub const DIRECCION_LEJANA: &str = "Autopista Norte # 220-50";

/// Base 3 km a $4.000, $800 por km extra, radio 10 km, origen en el centro de Bogotá
pub fn restaurant_config() -> RestaurantConfig {
    RestaurantConfig {
        id: Uuid::new_v4(),
        domicilio_activo: true,
        latitud: 4.6097,
        longitud: -74.0817,
        distancia_maxima_km: 10.0,
        distancia_base_km: 3.0,
        costo_base_domicilio: Decimal::from(4000),
        costo_por_km: Decimal::from(800),
        tiempo_preparacion_min: 20,
        hora_apertura: NaiveTime::from_hms_opt(0, 0, 0).unwrap(),
        hora_cierre: NaiveTime::from_hms_opt(0, 0, 0).unwrap(),
        updated_at: Utc::now(),
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<InMemoryStore>,
    pub routing: Arc<FakeRouting>,
    pub geocoder: Arc<FakeGeocoder>,
    jwt: JwtConfig,
}

impl TestApp {
    /// Restaurante configurado, proveedor de rutas que responde 5,2 km / 15 min
    pub fn new() -> Self {
        Self::build(Some(restaurant_config()), FakeRouting::returning(5.2, 15.0))
    }

    pub fn without_config() -> Self {
        Self::build(None, FakeRouting::returning(5.2, 15.0))
    }

    pub fn with_config(config: RestaurantConfig) -> Self {
        Self::build(Some(config), FakeRouting::returning(5.2, 15.0))
    }

    fn build(config: Option<RestaurantConfig>, routing: FakeRouting) -> Self {
        let store = Arc::new(match config {
            Some(config) => InMemoryStore::with_config(config),
            None => InMemoryStore::new(),
        });
        let geocoder = Arc::new(
            FakeGeocoder::new()
                .with_address(DIRECCION_CERCANA, 4.6565, -74.0555)
                .with_address(DIRECCION_LEJANA, 4.8000, -74.0300),
        );
        let routing = Arc::new(routing);

        let env = EnvironmentConfig {
            jwt_secret: "test-secret".to_string(),
            ..EnvironmentConfig::default()
        };
        let jwt = JwtConfig::from(&env);
        let state = AppState::from_parts(
            env,
            Repositories::memory(store.clone()),
            geocoder.clone(),
            routing.clone(),
        );

        Self {
            router: create_router(state),
            store,
            routing,
            geocoder,
            jwt,
        }
    }

    pub fn token(&self, rol: Rol) -> String {
        generate_token(Uuid::new_v4(), rol, &self.jwt).unwrap()
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::GET, uri, None, token).await
    }

    pub async fn post(&self, uri: &str, body: Value, token: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::POST, uri, Some(body), token).await
    }

    pub async fn put(&self, uri: &str, body: Value, token: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::PUT, uri, Some(body), token).await
    }
}

/// Lee un monto serializado por rust_decimal (texto) o como número
pub fn decimal(value: &Value) -> Decimal {
    match value {
        Value::String(texto) => texto.parse().unwrap(),
        Value::Number(numero) => numero.to_string().parse().unwrap(),
        other => panic!("no es un monto: {}", other),
    }
}

pub fn mesa_order() -> Value {
    serde_json::json!({
        "cliente": {"nombre": "Mesa 4", "telefono": "300 123 4567"},
        "tipo_orden": "mesa",
        "items": [
            {
                "producto_id": Uuid::new_v4(),
                "producto_nombre": "Hamburguesa doble",
                "precio_unitario": "21000",
                "cantidad": 2,
                "personalizaciones": [
                    {"ingrediente_id": Uuid::new_v4(), "ingrediente_nombre": "Cebolla", "incluido": false}
                ]
            }
        ],
        "metodo_pago": "efectivo",
        "monto_entregado": "50000"
    })
}

pub fn domicilio_order(costo_domicilio: &str, fuera_de_cobertura: bool) -> Value {
    serde_json::json!({
        "cliente": {
            "nombre": "Laura Gómez",
            "telefono": "3109876543",
            "direccion": DIRECCION_CERCANA
        },
        "tipo_orden": "domicilio",
        "items": [
            {
                "producto_id": Uuid::new_v4(),
                "producto_nombre": "Perro caliente",
                "precio_unitario": "15000",
                "cantidad": 1
            }
        ],
        "cotizacion": {
            "direccion_formateada": "Calle 72 # 10-34, Bogotá, Colombia",
            "distancia_km": 5.2,
            "costo_domicilio": costo_domicilio,
            "fuera_de_cobertura": fuera_de_cobertura
        },
        "metodo_pago": "transferencia"
    })
}
