use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A weather reading as returned by a provider, before it is stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub city: String,
    pub temperature_c: f64,
    pub description: String,
    pub humidity_pct: i64,
}

/// A row read back from the observation store.
///
/// Measurement columns are nullable in the table, so they are optional here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredObservation {
    pub id: i64,
    pub city: String,
    pub temperature_c: Option<f64>,
    pub description: Option<String>,
    pub humidity_pct: Option<i64>,
    pub recorded_at: DateTime<Utc>,
}

/// Aggregate temperature figures for one city.
///
/// `average`, `min` and `max` are `None` when there is nothing to aggregate;
/// check `count` first.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TemperatureStats {
    pub count: u64,
    pub average: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl TemperatureStats {
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}
