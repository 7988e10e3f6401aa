//! Device position lookup
//!
//! A terminal has no positioning hardware to ask, so the current position is
//! approximated from the public IP address via ip-api.com.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;

use super::Coordinates;

/// Default IP geolocation endpoint
pub const IP_API_URL: &str = "http://ip-api.com/json/";

/// Errors that can occur when determining the current position
#[derive(Debug, Error)]
pub enum GeolocationError {
    /// Position lookup is not available on this system
    #[error("Geolocation is not supported")]
    Unsupported,

    /// The lookup service refused or could not resolve a position
    #[error("Position unavailable: {0}")]
    Denied(String),

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
}

/// Source of the device's current position
#[async_trait]
pub trait Geolocator: Send + Sync {
    async fn locate(&self) -> Result<Coordinates, GeolocationError>;
}

/// Geolocator used when position lookup is switched off
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledGeolocator;

#[async_trait]
impl Geolocator for DisabledGeolocator {
    async fn locate(&self) -> Result<Coordinates, GeolocationError> {
        Err(GeolocationError::Unsupported)
    }
}

/// Response from ip-api.com
#[derive(Debug, Deserialize)]
struct IpApiResponse {
    status: String,
    message: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
    city: Option<String>,
}

/// Approximates the current position from the public IP address
#[derive(Debug, Clone)]
pub struct IpGeolocator {
    client: Client,
    url: String,
}

impl IpGeolocator {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            url: IP_API_URL.to_string(),
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }
}

#[async_trait]
impl Geolocator for IpGeolocator {
    async fn locate(&self) -> Result<Coordinates, GeolocationError> {
        let response = self.client.get(&self.url).send().await?;
        if !response.status().is_success() {
            return Err(GeolocationError::Denied(format!(
                "lookup returned status {}",
                response.status()
            )));
        }

        let body: IpApiResponse = response.json().await?;
        if body.status != "success" {
            let reason = body.message.unwrap_or_else(|| body.status.clone());
            tracing::warn!(%reason, "IP geolocation failed");
            return Err(GeolocationError::Denied(reason));
        }

        match (body.lat, body.lon) {
            (Some(lat), Some(lon)) => {
                tracing::info!(lat, lon, city = body.city.as_deref().unwrap_or("?"), "resolved position");
                Ok(Coordinates { lat, lon })
            }
            _ => Err(GeolocationError::Denied(
                "lookup returned no coordinates".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_disabled_geolocator_is_unsupported() {
        let result = DisabledGeolocator.locate().await;
        assert!(matches!(result, Err(GeolocationError::Unsupported)));
    }

    #[tokio::test]
    async fn test_ip_geolocator_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "success",
                "country": "Canada",
                "city": "Vancouver",
                "lat": 49.2827,
                "lon": -123.1207,
                "query": "203.0.113.7"
            })))
            .mount(&mock_server)
            .await;

        let locator = IpGeolocator::new(Client::new()).with_url(mock_server.uri());
        let coords = locator.locate().await.unwrap();

        assert!((coords.lat - 49.2827).abs() < 0.0001);
        assert!((coords.lon - (-123.1207)).abs() < 0.0001);
    }

    #[tokio::test]
    async fn test_ip_geolocator_fail_status() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "fail",
                "message": "private range",
                "query": "10.0.0.1"
            })))
            .mount(&mock_server)
            .await;

        let locator = IpGeolocator::new(Client::new()).with_url(mock_server.uri());

        match locator.locate().await {
            Err(GeolocationError::Denied(reason)) => assert_eq!(reason, "private range"),
            other => panic!("Expected Denied error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_ip_geolocator_http_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&mock_server)
            .await;

        let locator = IpGeolocator::new(Client::new()).with_url(mock_server.uri());
        let result = locator.locate().await;

        assert!(matches!(result, Err(GeolocationError::Denied(_))));
    }
}
