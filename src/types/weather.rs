//! Current-weather record as returned by the OpenWeatherMap API.
//!
//! Field names on the wire follow the API (`main`, `dt`, `sys`, ...); the
//! Rust names say what the fields hold. Every field defaults when absent so
//! partial payloads still deserialize.

use serde::{Deserialize, Serialize};

/// Snapshot of the current weather for one city.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeatherData {
    /// Condition groups; the first one is the primary condition.
    #[serde(rename = "weather", default)]
    pub conditions: Vec<Condition>,
    #[serde(rename = "main", default)]
    pub temperature: Option<Temperature>,
    /// Visibility in meters.
    #[serde(default)]
    pub visibility: Option<u32>,
    #[serde(default)]
    pub wind: Option<Wind>,
    /// Time of calculation, unix seconds (UTC).
    #[serde(rename = "dt", default)]
    pub datetime: i64,
    #[serde(rename = "sys", default)]
    pub sun: Option<SunTimes>,
    /// Shift in seconds from UTC.
    #[serde(default)]
    pub timezone: i32,
    /// City name as resolved by the API.
    #[serde(default)]
    pub name: String,
}

/// A weather condition group (e.g. `Clouds` / `scattered clouds`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    #[serde(default)]
    pub main: String,
    #[serde(default)]
    pub description: String,
}

/// Temperatures in the units requested from the API (Kelvin by default).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Temperature {
    #[serde(default)]
    pub temp: f64,
    #[serde(default)]
    pub feels_like: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Wind {
    /// Meters per second by default.
    #[serde(default)]
    pub speed: f64,
}

/// Sunrise and sunset, unix seconds (UTC).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SunTimes {
    #[serde(default)]
    pub sunrise: i64,
    #[serde(default)]
    pub sunset: i64,
}

impl WeatherData {
    /// An otherwise empty record carrying only a city name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// The primary condition, if the API sent any.
    pub fn condition(&self) -> Option<&Condition> {
        self.conditions.first()
    }
}
