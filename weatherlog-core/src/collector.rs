//! Drives fetch → store → report over a list of cities.
//!
//! Cities are processed one at a time. A failure for one city is recorded in
//! its [`CityOutcome`] and never stops the remaining cities.

use tracing::{info, warn};

use crate::{
    error::{FetchError, StoreError},
    model::{Observation, StoredObservation, TemperatureStats},
    provider::WeatherProvider,
    store::ObservationStore,
};

/// Result of collecting a single city.
#[derive(Debug)]
pub enum CityOutcome {
    Saved { id: i64, observation: Observation },
    FetchFailed { city: String, error: FetchError },
    StoreFailed { observation: Observation, error: StoreError },
}

impl CityOutcome {
    pub fn city(&self) -> &str {
        match self {
            CityOutcome::Saved { observation, .. } | CityOutcome::StoreFailed { observation, .. } => {
                &observation.city
            }
            CityOutcome::FetchFailed { city, .. } => city,
        }
    }

    pub fn is_saved(&self) -> bool {
        matches!(self, CityOutcome::Saved { .. })
    }
}

/// Per-city events emitted by [`Collector::collect_all_with`].
#[derive(Debug, Clone, Copy)]
pub enum Progress<'a> {
    Fetching(&'a str),
    Finished(&'a CityOutcome),
}

#[derive(Debug, Default)]
pub struct CollectionSummary {
    pub outcomes: Vec<CityOutcome>,
}

impl CollectionSummary {
    pub fn saved(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_saved()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.saved()
    }
}

/// Recent history and aggregate stats for one city.
#[derive(Debug, Clone, PartialEq)]
pub struct CityReport {
    pub city: String,
    pub history: Vec<StoredObservation>,
    pub stats: TemperatureStats,
}

#[derive(Debug)]
pub struct Collector {
    provider: Box<dyn WeatherProvider>,
    store: ObservationStore,
}

impl Collector {
    pub fn new(provider: Box<dyn WeatherProvider>, store: ObservationStore) -> Self {
        Self { provider, store }
    }

    pub fn store(&self) -> &ObservationStore {
        &self.store
    }

    /// Fetch one city and persist the observation if the fetch succeeded.
    pub async fn collect(&self, city: &str) -> CityOutcome {
        let observation = match self.provider.fetch(city).await {
            Ok(observation) => observation,
            Err(error) => {
                warn!(city, %error, "fetch failed");
                return CityOutcome::FetchFailed { city: city.to_string(), error };
            }
        };

        match self.store.insert(&observation) {
            Ok(id) => {
                info!(city, id, temperature_c = observation.temperature_c, "observation saved");
                CityOutcome::Saved { id, observation }
            }
            Err(error) => {
                warn!(city, %error, "insert failed");
                CityOutcome::StoreFailed { observation, error }
            }
        }
    }

    pub async fn collect_all<S: AsRef<str>>(&self, cities: &[S]) -> CollectionSummary {
        self.collect_all_with(cities, |_| {}).await
    }

    /// Like [`collect_all`](Self::collect_all), reporting progress as each city
    /// starts and finishes.
    pub async fn collect_all_with<S, F>(&self, cities: &[S], mut on_progress: F) -> CollectionSummary
    where
        S: AsRef<str>,
        F: FnMut(Progress<'_>),
    {
        let mut summary = CollectionSummary::default();

        for city in cities {
            let city = city.as_ref();
            on_progress(Progress::Fetching(city));
            let outcome = self.collect(city).await;
            on_progress(Progress::Finished(&outcome));
            summary.outcomes.push(outcome);
        }

        info!(saved = summary.saved(), failed = summary.failed(), "collection finished");
        summary
    }

    pub fn report(&self, city: &str, limit: usize) -> Result<CityReport, StoreError> {
        report(&self.store, city, limit)
    }
}

/// Build a report straight from the store; no provider required.
pub fn report(store: &ObservationStore, city: &str, limit: usize) -> Result<CityReport, StoreError> {
    let history = store.recent_history(city, limit)?;
    let stats = store.stats(city)?;

    Ok(CityReport { city: city.to_string(), history, stats })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use tempfile::TempDir;

    /// Answers from a fixed table; unknown cities fail with a 404.
    #[derive(Debug)]
    struct FakeProvider {
        known: Vec<(&'static str, f64)>,
    }

    #[async_trait]
    impl WeatherProvider for FakeProvider {
        async fn fetch(&self, city: &str) -> Result<Observation, FetchError> {
            self.known
                .iter()
                .find(|(name, _)| *name == city)
                .map(|(_, temp)| Observation {
                    city: city.to_string(),
                    temperature_c: *temp,
                    description: "overcast clouds".to_string(),
                    humidity_pct: 80,
                })
                .ok_or_else(|| FetchError::Api { status: 404, message: "city not found".into() })
        }
    }

    fn collector(known: Vec<(&'static str, f64)>) -> (TempDir, Collector) {
        let dir = tempfile::tempdir().unwrap();
        let store = ObservationStore::open(dir.path().join("weather.db")).unwrap();
        (dir, Collector::new(Box::new(FakeProvider { known }), store))
    }

    #[tokio::test]
    async fn one_failing_city_does_not_abort_the_run() {
        let (_dir, collector) = collector(vec![("London", 11.0), ("Tokyo", 22.0)]);

        let summary = collector.collect_all(&["London", "Nowhere", "Tokyo"]).await;

        assert_eq!(summary.outcomes.len(), 3);
        assert_eq!(summary.saved(), 2);
        assert_eq!(summary.failed(), 1);
        assert_eq!(summary.outcomes[1].city(), "Nowhere");
        assert!(matches!(
            summary.outcomes[1],
            CityOutcome::FetchFailed { error: FetchError::Api { status: 404, .. }, .. }
        ));
        assert_eq!(collector.store().count().unwrap(), 2);
    }

    #[tokio::test]
    async fn progress_reports_each_city_in_order() {
        let (_dir, collector) = collector(vec![("Lima", 18.0)]);
        let mut events = Vec::new();

        let summary = collector
            .collect_all_with(&["Lima", "Nowhere"], |progress| match progress {
                Progress::Fetching(city) => events.push(format!("start {city}")),
                Progress::Finished(outcome) => {
                    events.push(format!("done {} {}", outcome.city(), outcome.is_saved()))
                }
            })
            .await;

        assert_eq!(
            events,
            vec!["start Lima", "done Lima true", "start Nowhere", "done Nowhere false"]
        );
        assert_eq!(summary.saved(), 1);
        assert_eq!(summary.failed(), 1);
    }

    #[tokio::test]
    async fn failed_fetch_inserts_nothing() {
        let (_dir, collector) = collector(vec![]);

        let outcome = collector.collect("London").await;

        assert!(!outcome.is_saved());
        assert_eq!(collector.store().count().unwrap(), 0);
    }

    #[tokio::test]
    async fn storage_failure_is_reported_per_city() {
        let dir = tempfile::tempdir().unwrap();
        // A directory cannot be opened as a database file.
        let store = ObservationStore::new(dir.path());
        let collector =
            Collector::new(Box::new(FakeProvider { known: vec![("Paris", 9.0)] }), store);

        let outcome = collector.collect("Paris").await;

        assert!(matches!(outcome, CityOutcome::StoreFailed { .. }));
        assert_eq!(outcome.city(), "Paris");
    }

    #[tokio::test]
    async fn report_reflects_collected_rows() {
        let (_dir, collector) = collector(vec![("Athens", 30.0)]);
        collector.collect_all(&["Athens", "Athens"]).await;

        let report = collector.report("Athens", 5).unwrap();

        assert_eq!(report.city, "Athens");
        assert_eq!(report.history.len(), 2);
        assert_eq!(report.stats.count, 2);
        assert_eq!(report.stats.average, Some(30.0));

        let empty = collector.report("Paris", 5).unwrap();
        assert!(empty.history.is_empty());
        assert!(empty.stats.is_empty());
    }
}
