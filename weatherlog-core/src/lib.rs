//! Core library for the `weatherlog` CLI.
//!
//! This crate defines:
//! - Configuration handling
//! - The weather provider abstraction and its OpenWeather implementation
//! - SQLite persistence of observations
//! - The collector that sequences fetch, store and report per city
//!
//! It is used by `weatherlog-cli`, but can also be reused by other binaries or services.

pub mod collector;
pub mod config;
pub mod error;
pub mod model;
pub mod provider;
pub mod store;

pub use collector::{CityOutcome, CityReport, CollectionSummary, Collector, Progress};
pub use config::Config;
pub use error::{FetchError, StoreError};
pub use model::{Observation, StoredObservation, TemperatureStats};
pub use provider::{WeatherProvider, openweather::OpenWeatherProvider, provider_from_config};
pub use store::ObservationStore;
