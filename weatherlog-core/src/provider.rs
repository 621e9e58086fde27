use crate::{Config, Observation, error::FetchError, provider::openweather::OpenWeatherProvider};
use anyhow::Context;
use async_trait::async_trait;
use std::{fmt::Debug, time::Duration};

pub mod openweather;

/// Source of current weather observations.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// Fetch the current observation for `city`. One attempt, no retries.
    async fn fetch(&self, city: &str) -> Result<Observation, FetchError>;
}

/// Construct the OpenWeather provider from config.
pub fn provider_from_config(config: &Config) -> anyhow::Result<Box<dyn WeatherProvider>> {
    let api_key = config.require_api_key()?;

    let mut provider = OpenWeatherProvider::with_base_url(api_key.to_owned(), config.base_url());

    if let Some(secs) = config.request_timeout_secs {
        provider = provider
            .with_timeout(Duration::from_secs(secs))
            .context("Failed to build HTTP client for OpenWeather")?;
    }

    Ok(Box::new(provider))
}
