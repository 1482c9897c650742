//! Cliente del proveedor de geocodificación (Nominatim / OpenStreetMap)
//!
//! Solo habla HTTP; la caché y las reglas de "no encontrada" viven en
//! `AddressCacheService`.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::config::EnvironmentConfig;
use crate::models::address::{Coordinates, GeocodedAddress};

/// Proveedor externo de geocodificación
#[async_trait]
pub trait GeocodingProvider: Send + Sync {
    /// Primer resultado para el texto dado, `None` si no hubo resultados
    async fn search(&self, direccion: &str) -> Result<Option<GeocodedAddress>>;

    /// Dirección legible para unas coordenadas
    async fn reverse(&self, punto: Coordinates) -> Result<Option<String>>;
}

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    display_name: String,
    lat: String,
    lon: String,
    #[serde(default)]
    address: Option<NominatimAddress>,
}

#[derive(Debug, Default, Deserialize)]
struct NominatimAddress {
    city: Option<String>,
    town: Option<String>,
    neighbourhood: Option<String>,
    suburb: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NominatimReverse {
    display_name: Option<String>,
}

impl NominatimPlace {
    fn into_geocoded(self) -> Result<GeocodedAddress> {
        let latitud: f64 = self
            .lat
            .parse()
            .map_err(|e| anyhow!("Latitud inválida '{}': {}", self.lat, e))?;
        let longitud: f64 = self
            .lon
            .parse()
            .map_err(|e| anyhow!("Longitud inválida '{}': {}", self.lon, e))?;

        let address = self.address.unwrap_or_default();
        Ok(GeocodedAddress {
            direccion_formateada: self.display_name,
            latitud,
            longitud,
            ciudad: address.city.or(address.town),
            barrio: address.neighbourhood.or(address.suburb),
        })
    }
}

pub struct NominatimClient {
    client: Client,
    base_url: String,
    user_agent: String,
    /// Sufijo fijo que acota la búsqueda, ej. "Bogotá, Colombia"
    sufijo: String,
}

impl NominatimClient {
    pub fn new(
        base_url: impl Into<String>,
        user_agent: impl Into<String>,
        ciudad: &str,
        pais: &str,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| anyhow!("No se pudo crear el cliente HTTP de geocodificación: {}", e))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            user_agent: user_agent.into(),
            sufijo: format!("{}, {}", ciudad, pais),
        })
    }

    pub fn from_config(config: &EnvironmentConfig) -> Result<Self> {
        Self::new(
            config.geocoder_base_url.clone(),
            config.geocoder_user_agent.clone(),
            &config.geocoder_city,
            &config.geocoder_country,
            Duration::from_secs(config.http_timeout_secs),
        )
    }

    fn search_url(&self, direccion: &str) -> String {
        let consulta = format!("{}, {}", direccion.trim(), self.sufijo);
        format!(
            "{}/search?q={}&format=json&addressdetails=1&limit=1",
            self.base_url,
            urlencoding::encode(&consulta)
        )
    }

    fn reverse_url(&self, punto: Coordinates) -> String {
        format!(
            "{}/reverse?lat={}&lon={}&format=json",
            self.base_url, punto.latitud, punto.longitud
        )
    }
}

#[async_trait]
impl GeocodingProvider for NominatimClient {
    async fn search(&self, direccion: &str) -> Result<Option<GeocodedAddress>> {
        let url = self.search_url(direccion);
        log::debug!("🌐 Geocodificando: {}", url);

        let response = self
            .client
            .get(&url)
            .header("User-Agent", &self.user_agent)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("Geocodificación falló con estado {}: {}", status, body));
        }

        let lugares: Vec<NominatimPlace> = response
            .json()
            .await
            .map_err(|e| anyhow!("Respuesta de geocodificación inválida: {}", e))?;

        match lugares.into_iter().next() {
            Some(lugar) => Ok(Some(lugar.into_geocoded()?)),
            None => Ok(None),
        }
    }

    async fn reverse(&self, punto: Coordinates) -> Result<Option<String>> {
        let response = self
            .client
            .get(self.reverse_url(punto))
            .header("User-Agent", &self.user_agent)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("Geocodificación inversa falló con estado {}", status));
        }

        let lugar: NominatimReverse = response.json().await?;
        Ok(lugar.display_name.filter(|nombre| !nombre.trim().is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> NominatimClient {
        NominatimClient::new(
            "https://nominatim.example.org/",
            "restaurant-delivery-tests",
            "Bogotá",
            "Colombia",
            Duration::from_secs(1),
        )
        .unwrap()
    }

    #[test]
    fn test_search_url_appends_city_and_country() {
        let url = client().search_url("  Calle 45 # 12-30 ");
        assert!(url.starts_with("https://nominatim.example.org/search?q="));
        assert!(url.contains(&*urlencoding::encode("Calle 45 # 12-30, Bogotá, Colombia")));
        assert!(url.ends_with("&format=json&addressdetails=1&limit=1"));
    }

    #[test]
    fn test_parse_place_prefers_city_then_town() {
        let json = r#"[{
            "display_name": "Calle 45, Teusaquillo, Bogotá",
            "lat": "4.6321",
            "lon": "-74.0701",
            "address": {"town": "Chapinero", "suburb": "Teusaquillo"}
        }]"#;
        let lugares: Vec<NominatimPlace> = serde_json::from_str(json).unwrap();
        let geocoded = lugares.into_iter().next().unwrap().into_geocoded().unwrap();

        assert_eq!(geocoded.latitud, 4.6321);
        assert_eq!(geocoded.longitud, -74.0701);
        assert_eq!(geocoded.ciudad.as_deref(), Some("Chapinero"));
        assert_eq!(geocoded.barrio.as_deref(), Some("Teusaquillo"));
    }

    #[test]
    fn test_parse_place_rejects_bad_coordinates() {
        let lugar = NominatimPlace {
            display_name: "x".to_string(),
            lat: "no-es-numero".to_string(),
            lon: "-74.0".to_string(),
            address: None,
        };
        assert!(lugar.into_geocoded().is_err());
    }
}
