//! OpenWeatherMap API client
//!
//! Fetches current conditions and the 5 day / 3 hour forecast from the
//! OpenWeatherMap 2.5 API and normalizes the responses into raw records.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;

use super::{LocationSpec, RawCurrentConditions, RawForecastSample, Units};

/// Base URL for the OpenWeatherMap API
pub const OPENWEATHER_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";

/// Errors that can occur when fetching weather data
#[derive(Debug, Error)]
pub enum FetchError {
    /// The provider does not know the requested location
    #[error("Location not found: {0}")]
    NotFound(String),

    /// The provider answered with a non-success status
    #[error("{endpoint} request failed with status {status}")]
    Status {
        endpoint: &'static str,
        status: StatusCode,
    },

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Failed to parse JSON response
    #[error("Failed to parse JSON response: {0}")]
    Parse(#[from] serde_json::Error),

    /// Missing expected field in response
    #[error("Missing expected field in response: {0}")]
    MissingField(String),
}

/// Source of raw weather records
#[async_trait]
pub trait WeatherSource: Send + Sync {
    /// Fetches current conditions for a location
    async fn fetch_current(
        &self,
        location: &LocationSpec,
        units: Units,
    ) -> Result<RawCurrentConditions, FetchError>;

    /// Fetches the forecast time series for a location, in provider order
    async fn fetch_forecast(
        &self,
        location: &LocationSpec,
        units: Units,
    ) -> Result<Vec<RawForecastSample>, FetchError>;
}

/// Client for the OpenWeatherMap API
#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl OpenWeatherClient {
    /// Create a new client against the public API
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_client(Client::new(), api_key)
    }

    /// Create a new client with a custom HTTP client
    pub fn with_client(client: Client, api_key: impl Into<String>) -> Self {
        Self {
            client,
            base_url: OPENWEATHER_BASE_URL.to_string(),
            api_key: api_key.into(),
        }
    }

    /// Point the client at a different API root (mirrors, mock servers)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Query parameters shared by both endpoints
    fn query_params(&self, location: &LocationSpec, units: Units) -> Vec<(&'static str, String)> {
        let mut params = match location {
            LocationSpec::ByName(name) => vec![("q", name.clone())],
            LocationSpec::ByCoordinates(c) => {
                vec![("lat", c.lat.to_string()), ("lon", c.lon.to_string())]
            }
        };
        params.push(("appid", self.api_key.clone()));
        params.push(("units", units.as_query().to_string()));
        params
    }

    /// Issues a GET against `endpoint` and returns the body on success
    async fn get(
        &self,
        endpoint: &'static str,
        location: &LocationSpec,
        units: Units,
    ) -> Result<String, FetchError> {
        let url = format!("{}/{}", self.base_url, endpoint);
        tracing::debug!(endpoint, %location, units = units.as_query(), "requesting weather data");

        let response = self
            .client
            .get(&url)
            .query(&self.query_params(location, units))
            .send()
            .await?;

        let status = response.status();
        // The provider answers 404 for unknown places on the current endpoint
        if status == StatusCode::NOT_FOUND && endpoint == "weather" {
            tracing::warn!(endpoint, %location, "location not found");
            return Err(FetchError::NotFound(location.to_string()));
        }
        if !status.is_success() {
            tracing::warn!(endpoint, %location, %status, "weather request failed");
            return Err(FetchError::Status { endpoint, status });
        }

        Ok(response.text().await?)
    }
}

#[async_trait]
impl WeatherSource for OpenWeatherClient {
    async fn fetch_current(
        &self,
        location: &LocationSpec,
        units: Units,
    ) -> Result<RawCurrentConditions, FetchError> {
        let body = self.get("weather", location, units).await?;
        let response: CurrentResponse = serde_json::from_str(&body)?;
        parse_current(response)
    }

    async fn fetch_forecast(
        &self,
        location: &LocationSpec,
        units: Units,
    ) -> Result<Vec<RawForecastSample>, FetchError> {
        let body = self.get("forecast", location, units).await?;
        let response: ForecastResponse = serde_json::from_str(&body)?;
        parse_forecast(response)
    }
}

/// Converts the current-weather response into the normalized record
fn parse_current(response: CurrentResponse) -> Result<RawCurrentConditions, FetchError> {
    let weather = response
        .weather
        .into_iter()
        .next()
        .ok_or_else(|| FetchError::MissingField("weather".to_string()))?;

    Ok(RawCurrentConditions {
        name: response.name,
        country: response.sys.country.unwrap_or_default(),
        lat: response.coord.lat,
        lon: response.coord.lon,
        temp: response.main.temp,
        feels_like: response.main.feels_like,
        humidity: response.main.humidity.clamp(0.0, 100.0) as u8,
        pressure: response.main.pressure,
        wind_speed: response.wind.speed,
        wind_deg: response.wind.deg,
        visibility: response.visibility,
        condition: weather.main,
        description: weather.description,
        icon: weather.icon,
        sunrise: response.sys.sunrise,
        sunset: response.sys.sunset,
    })
}

/// Converts the forecast response into samples, preserving provider order
fn parse_forecast(response: ForecastResponse) -> Result<Vec<RawForecastSample>, FetchError> {
    response
        .list
        .into_iter()
        .map(|item| {
            let weather = item
                .weather
                .into_iter()
                .next()
                .ok_or_else(|| FetchError::MissingField("list[].weather".to_string()))?;
            Ok(RawForecastSample {
                timestamp: item.dt,
                temp: item.main.temp,
                condition: weather.main,
                icon: weather.icon,
            })
        })
        .collect()
}

/// `/weather` response structure
#[derive(Debug, Deserialize)]
struct CurrentResponse {
    name: String,
    coord: Coord,
    sys: Sys,
    main: CurrentMain,
    wind: Wind,
    visibility: Option<f64>,
    weather: Vec<Condition>,
}

#[derive(Debug, Deserialize)]
struct Coord {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
struct Sys {
    country: Option<String>,
    sunrise: i64,
    sunset: i64,
}

#[derive(Debug, Deserialize)]
struct CurrentMain {
    temp: f64,
    feels_like: f64,
    humidity: f64,
    pressure: f64,
}

#[derive(Debug, Deserialize)]
struct Wind {
    speed: f64,
    #[serde(default)]
    deg: f64,
}

#[derive(Debug, Deserialize)]
struct Condition {
    main: String,
    description: String,
    icon: String,
}

/// `/forecast` response structure
#[derive(Debug, Deserialize)]
struct ForecastResponse {
    list: Vec<ForecastItem>,
}

#[derive(Debug, Deserialize)]
struct ForecastItem {
    dt: i64,
    main: ForecastMain,
    weather: Vec<Condition>,
}

#[derive(Debug, Deserialize)]
struct ForecastMain {
    temp: f64,
}
