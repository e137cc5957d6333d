//! Thin client for the weather service's current-conditions endpoint.

use crate::api::WeatherApi;
use crate::{Config, Result};
use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

/// Current conditions as returned by the weather endpoint. Only the fields
/// the notification text needs are kept.
#[derive(Debug, Clone, Deserialize)]
pub struct WeatherReport {
    pub(crate) location: Location,
    pub(crate) current: CurrentConditions,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Location {
    pub(crate) name: String,
    pub(crate) country: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CurrentConditions {
    pub(crate) temp_c: f64,
    pub(crate) feelslike_c: f64,
    pub(crate) last_updated: String,
    pub(crate) condition: Condition,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Condition {
    pub(crate) text: String,
}

/// Weather lookups are best-effort: every failure path logs and yields
/// `None`, so a broken or unconfigured weather service can never interfere
/// with transaction monitoring.
pub struct WeatherClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    coordinates: String,
}

impl WeatherClient {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            client: reqwest::Client::builder()
                .timeout(config.request_timeout())
                .build()
                .context("Unable to build the weather HTTP client")?,
            endpoint: config.weather_api_url().to_string(),
            api_key: config.weather_api_key(),
            coordinates: config.weather_coordinates().to_string(),
        })
    }
}

#[async_trait]
impl WeatherApi for WeatherClient {
    async fn current(&self) -> Option<WeatherReport> {
        let Some(key) = self.api_key.as_deref() else {
            debug!("weather API key not configured, skipping weather check");
            return None;
        };

        let result = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("key", key),
                ("q", self.coordinates.as_str()),
                ("aqi", "no"),
            ])
            .send()
            .await;

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                warn!("weather request failed: {e}");
                return None;
            }
        };

        if !response.status().is_success() {
            warn!("weather service answered HTTP {}", response.status());
            return None;
        }

        match response.json::<WeatherReport>().await {
            Ok(report) => Some(report),
            Err(e) => {
                warn!("could not decode the weather response: {e}");
                None
            }
        }
    }
}
