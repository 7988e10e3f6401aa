//! Core data models for Skycast
//!
//! This module contains the types shared by the fetcher, the forecast
//! aggregator and the presentation layer: location queries, raw provider
//! records and the presentation-ready view model.

pub mod geolocation;
pub mod openweather;

pub use geolocation::{DisabledGeolocator, GeolocationError, Geolocator, IpGeolocator};
pub use openweather::{FetchError, OpenWeatherClient, WeatherSource};

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Measurement system requested from the data provider
///
/// Conversion is never done locally: switching units re-queries the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    Metric,
    Imperial,
}

impl Units {
    /// Value of the provider's `units` query parameter
    pub fn as_query(self) -> &'static str {
        match self {
            Units::Metric => "metric",
            Units::Imperial => "imperial",
        }
    }

    pub fn temperature_symbol(self) -> &'static str {
        match self {
            Units::Metric => "°C",
            Units::Imperial => "°F",
        }
    }

    pub fn speed_unit(self) -> &'static str {
        match self {
            Units::Metric => "m/s",
            Units::Imperial => "mph",
        }
    }

    /// The other unit system
    pub fn toggled(self) -> Self {
        match self {
            Units::Metric => Units::Imperial,
            Units::Imperial => Units::Metric,
        }
    }
}

/// A latitude/longitude pair in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

/// Target of a weather lookup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationSpec {
    /// A place name as typed by the user, e.g. "London" or "Paris,FR"
    ByName(String),
    /// A geographic position
    ByCoordinates(Coordinates),
}

impl fmt::Display for LocationSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocationSpec::ByName(name) => write!(f, "{}", name),
            LocationSpec::ByCoordinates(c) => write!(f, "{:.4},{:.4}", c.lat, c.lon),
        }
    }
}

/// One provider-supplied forecast data point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawForecastSample {
    /// Seconds since the Unix epoch
    pub timestamp: i64,
    /// Temperature in the unit system the data was requested in
    pub temp: f64,
    /// Primary condition label in provider vocabulary (case-sensitive)
    pub condition: String,
    /// Opaque icon token
    pub icon: String,
}

/// Current conditions as normalized by the fetch step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawCurrentConditions {
    /// Location name resolved by the provider
    pub name: String,
    /// ISO country code, empty when the provider has none
    pub country: String,
    pub lat: f64,
    pub lon: f64,
    pub temp: f64,
    pub feels_like: f64,
    /// Relative humidity percentage (0-100)
    pub humidity: u8,
    /// Atmospheric pressure in hPa
    pub pressure: f64,
    pub wind_speed: f64,
    /// Wind direction in meteorological degrees
    pub wind_deg: f64,
    /// Visibility in metres, when reported
    pub visibility: Option<f64>,
    pub condition: String,
    pub description: String,
    pub icon: String,
    /// Sunrise as seconds since the Unix epoch
    pub sunrise: i64,
    /// Sunset as seconds since the Unix epoch
    pub sunset: i64,
}

/// Resolved location shown in the view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    pub country: String,
    pub lat: f64,
    pub lon: f64,
}

/// Current conditions ready for display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditionsView {
    pub temp: f64,
    pub feels_like: f64,
    pub humidity: u8,
    pub pressure: f64,
    pub wind_speed: f64,
    pub wind_deg: f64,
    /// 16-point compass label for `wind_deg`
    pub wind_direction: String,
    pub visibility_km: Option<f64>,
    /// Lowercased condition label
    pub condition: String,
    pub description: String,
    pub icon: String,
    /// `None` when the reported timestamp is out of range
    pub sunrise: Option<DateTime<Utc>>,
    pub sunset: Option<DateTime<Utc>>,
}

/// One entry of the short-term hourly outlook
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyEntry {
    /// Seconds since the Unix epoch of the source sample
    pub timestamp: i64,
    /// Local hour of day (0-23)
    pub hour: u32,
    /// "H:00" label, no zero padding
    pub label: String,
    pub temp: f64,
    /// Lowercased condition label
    pub condition: String,
    pub icon: String,
}

/// Summary of one calendar day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySummary {
    /// Calendar date of the day's first sample
    pub date: NaiveDate,
    /// Short weekday name, e.g. "Mon"
    pub weekday: String,
    /// Month and day, e.g. "Jul 15"
    pub month_day: String,
    pub max_temp: f64,
    pub min_temp: f64,
    /// Most frequent condition of the day, lowercased
    pub condition: String,
    /// Icon of the day's first sample
    pub icon: String,
}

/// Aggregated forecast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastView {
    pub hourly: Vec<HourlyEntry>,
    pub daily: Vec<DailySummary>,
}

/// Everything the presentation layer needs for one lookup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewModel {
    pub location: Location,
    pub current: CurrentConditionsView,
    pub forecast: ForecastView,
    /// Unit system the values were requested in
    pub units: Units,
    /// When the lookup completed
    pub fetched_at: DateTime<Utc>,
}

const COMPASS_POINTS: [&str; 16] = [
    "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW", "NW",
    "NNW",
];

/// Maps a wind direction in degrees to a 16-point compass label
pub fn wind_direction(degrees: f64) -> &'static str {
    let index = ((degrees / 22.5).round() as i64).rem_euclid(16) as usize;
    COMPASS_POINTS[index]
}

impl CurrentConditionsView {
    /// Builds the display record from the fetcher's normalized record
    pub fn from_raw(raw: &RawCurrentConditions) -> Self {
        Self {
            temp: raw.temp,
            feels_like: raw.feels_like,
            humidity: raw.humidity,
            pressure: raw.pressure,
            wind_speed: raw.wind_speed,
            wind_deg: raw.wind_deg,
            wind_direction: wind_direction(raw.wind_deg).to_string(),
            visibility_km: raw.visibility.map(|metres| metres / 1000.0),
            condition: raw.condition.to_lowercase(),
            description: raw.description.clone(),
            icon: raw.icon.clone(),
            sunrise: DateTime::from_timestamp(raw.sunrise, 0),
            sunset: DateTime::from_timestamp(raw.sunset, 0),
        }
    }
}

impl Location {
    pub fn from_raw(raw: &RawCurrentConditions) -> Self {
        Self {
            name: raw.name.clone(),
            country: raw.country.clone(),
            lat: raw.lat,
            lon: raw.lon,
        }
    }
}
