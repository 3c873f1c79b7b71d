//! # Weather Feature
//!
//! Current conditions and multi-day forecasts from WeatherAPI.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.4.0
//! - **Toggleable**: true

use anyhow::{Context, Result};
use log::warn;
use serde::Deserialize;
use std::time::Duration;

const BASE_URL: &str = "http://api.weatherapi.com/v1";

#[derive(Debug, Clone, Deserialize)]
pub struct Location {
    pub name: String,
    pub country: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Condition {
    pub text: String,
    /// Protocol-relative icon URL as returned by the API
    pub icon: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CurrentConditions {
    pub temp_c: f64,
    pub feelslike_c: f64,
    pub humidity: f64,
    pub wind_kph: f64,
    pub pressure_mb: f64,
    pub precip_mm: f64,
    pub uv: f64,
    pub vis_km: f64,
    pub condition: Condition,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CurrentWeather {
    pub location: Location,
    pub current: CurrentConditions,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DaySummary {
    pub maxtemp_c: f64,
    pub mintemp_c: f64,
    pub daily_chance_of_rain: f64,
    pub condition: Condition,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForecastDay {
    pub date: String,
    pub day: DaySummary,
}

#[derive(Debug, Clone, Deserialize)]
struct ForecastBlock {
    forecastday: Vec<ForecastDay>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Forecast {
    pub location: Location,
    #[serde(rename = "forecast")]
    forecast_block: ForecastBlock,
}

impl Forecast {
    pub fn days(&self) -> &[ForecastDay] {
        &self.forecast_block.forecastday
    }
}

/// WeatherAPI client. Without an API key every lookup returns `Ok(None)` and
/// the command layer reports the feature as unavailable.
#[derive(Clone)]
pub struct WeatherClient {
    client: reqwest::Client,
    api_key: Option<String>,
}

impl WeatherClient {
    pub fn new(api_key: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        WeatherClient { client, api_key }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Current conditions for a city; `Ok(None)` when unconfigured or the
    /// city is unknown.
    pub async fn current(&self, city: &str) -> Result<Option<CurrentWeather>> {
        let Some(api_key) = &self.api_key else {
            return Ok(None);
        };

        let response = self
            .client
            .get(format!("{BASE_URL}/current.json"))
            .query(&[("key", api_key.as_str()), ("q", city), ("aqi", "no")])
            .send()
            .await
            .context("weather request failed")?;

        if !response.status().is_success() {
            warn!("WeatherAPI returned {} for city {city}", response.status());
            return Ok(None);
        }

        Ok(Some(response.json().await.context("invalid weather payload")?))
    }

    /// Forecast for up to `days` days; `Ok(None)` when unconfigured or the
    /// city is unknown.
    pub async fn forecast(&self, city: &str, days: u8) -> Result<Option<Forecast>> {
        let Some(api_key) = &self.api_key else {
            return Ok(None);
        };

        let days = days.clamp(1, 10).to_string();
        let response = self
            .client
            .get(format!("{BASE_URL}/forecast.json"))
            .query(&[
                ("key", api_key.as_str()),
                ("q", city),
                ("days", days.as_str()),
                ("aqi", "no"),
                ("alerts", "no"),
            ])
            .send()
            .await
            .context("forecast request failed")?;

        if !response.status().is_success() {
            warn!("WeatherAPI returned {} for city {city}", response.status());
            return Ok(None);
        }

        Ok(Some(response.json().await.context("invalid forecast payload")?))
    }
}
