//! Cliente del proveedor de rutas (OpenRouteService, perfil driving-car)

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::EnvironmentConfig;
use crate::models::address::Coordinates;

/// Distancia y duración de manejo devueltas por el proveedor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteSummary {
    pub distancia_km: f64,
    pub duracion_minutos: f64,
}

#[async_trait]
pub trait RoutingProvider: Send + Sync {
    async fn driving_route(&self, origen: Coordinates, destino: Coordinates) -> Result<RouteSummary>;
}

#[derive(Debug, Serialize)]
struct DirectionsRequest {
    /// [[lng, lat], [lng, lat]]
    coordinates: [[f64; 2]; 2],
    format: &'static str,
}

#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    #[serde(default)]
    routes: Vec<DirectionsRoute>,
}

#[derive(Debug, Deserialize)]
struct DirectionsRoute {
    summary: DirectionsSummary,
}

#[derive(Debug, Deserialize)]
struct DirectionsSummary {
    /// metros
    #[serde(default)]
    distance: f64,
    /// segundos
    #[serde(default)]
    duration: f64,
}

impl DirectionsResponse {
    fn into_summary(self) -> Result<RouteSummary> {
        let ruta = self
            .routes
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("El proveedor de rutas no devolvió rutas"))?;

        Ok(RouteSummary {
            distancia_km: ruta.summary.distance / 1000.0,
            duracion_minutos: ruta.summary.duration / 60.0,
        })
    }
}

pub struct OpenRouteServiceClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl OpenRouteServiceClient {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| anyhow!("No se pudo crear el cliente HTTP de rutas: {}", e))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
        })
    }

    pub fn from_config(config: &EnvironmentConfig) -> Result<Self> {
        Self::new(
            config.routing_base_url.clone(),
            config.routing_api_key.clone(),
            Duration::from_secs(config.http_timeout_secs),
        )
    }

    fn request_body(origen: Coordinates, destino: Coordinates) -> DirectionsRequest {
        DirectionsRequest {
            coordinates: [
                [origen.longitud, origen.latitud],
                [destino.longitud, destino.latitud],
            ],
            format: "json",
        }
    }
}

#[async_trait]
impl RoutingProvider for OpenRouteServiceClient {
    async fn driving_route(&self, origen: Coordinates, destino: Coordinates) -> Result<RouteSummary> {
        // Sin API key no se intenta la llamada; el motor usa la estimación
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| anyhow!("ROUTING_API_KEY no configurada"))?;

        let url = format!("{}/v2/directions/driving-car", self.base_url);
        let response = self
            .client
            .post(&url)
            .header("Authorization", api_key)
            .json(&Self::request_body(origen, destino))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("Proveedor de rutas respondió {}: {}", status, body));
        }

        let parsed: DirectionsResponse = response
            .json()
            .await
            .map_err(|e| anyhow!("Respuesta de rutas inválida: {}", e))?;
        parsed.into_summary()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_uses_lng_lat_order() {
        let body = OpenRouteServiceClient::request_body(
            Coordinates::new(4.6097, -74.0817),
            Coordinates::new(4.65, -74.05),
        );
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["coordinates"][0][0], -74.0817);
        assert_eq!(json["coordinates"][0][1], 4.6097);
        assert_eq!(json["format"], "json");
    }

    #[test]
    fn test_summary_converts_units() {
        let json = r#"{"routes":[{"summary":{"distance":5200.0,"duration":900.0}}]}"#;
        let parsed: DirectionsResponse = serde_json::from_str(json).unwrap();
        let summary = parsed.into_summary().unwrap();
        assert_eq!(summary.distancia_km, 5.2);
        assert_eq!(summary.duracion_minutos, 15.0);
    }

    #[test]
    fn test_empty_routes_is_error() {
        let parsed: DirectionsResponse = serde_json::from_str(r#"{"routes":[]}"#).unwrap();
        assert!(parsed.into_summary().is_err());
    }

    #[tokio::test]
    async fn test_missing_api_key_fails_without_request() {
        let client = OpenRouteServiceClient::new("http://127.0.0.1:9", Some("  ".to_string()), Duration::from_secs(1))
            .unwrap();
        let result = client
            .driving_route(Coordinates::new(4.6, -74.08), Coordinates::new(4.65, -74.05))
            .await;
        assert!(result.unwrap_err().to_string().contains("ROUTING_API_KEY"));
    }
}
