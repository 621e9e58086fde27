//! SQLite-backed persistence for weather observations.
//!
//! `ObservationStore` holds only the database path. Every operation opens its
//! own connection and drops it before returning, so no handle outlives a call.

use std::{
    fs,
    path::{Path, PathBuf},
};

use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::{Connection, params};
use tracing::debug;

use crate::{
    error::StoreError,
    model::{Observation, StoredObservation, TemperatureStats},
};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS weather_data (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        city TEXT NOT NULL,
        temperature REAL,
        description TEXT,
        humidity INTEGER,
        timestamp DATETIME DEFAULT CURRENT_TIMESTAMP
    );

    CREATE INDEX IF NOT EXISTS idx_weather_data_city_timestamp
        ON weather_data(city, timestamp);
"#;

#[derive(Debug, Clone)]
pub struct ObservationStore {
    path: PathBuf,
}

/// Raw column values before the timestamp is parsed.
type RawRow = (i64, String, Option<f64>, Option<String>, Option<i64>, Option<String>);

impl ObservationStore {
    /// Create a handle for the database at `path`. Nothing is touched on disk
    /// until [`initialize`](Self::initialize) or another operation runs.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self { path: path.as_ref().to_path_buf() }
    }

    /// Create a handle and initialize the schema in one step.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let store = Self::new(path);
        store.initialize()?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the database file and table if missing. Existing rows are kept.
    pub fn initialize(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let conn = self.connect()?;
        conn.execute_batch(SCHEMA)?;
        debug!(path = %self.path.display(), "observation store initialized");
        Ok(())
    }

    /// Append one observation. Returns the id assigned by the database.
    pub fn insert(&self, observation: &Observation) -> Result<i64, StoreError> {
        let conn = self.connect()?;
        conn.execute(
            "INSERT INTO weather_data (city, temperature, description, humidity)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                observation.city,
                observation.temperature_c,
                observation.description,
                observation.humidity_pct,
            ],
        )?;

        let id = conn.last_insert_rowid();
        debug!(id, city = %observation.city, "inserted observation");
        Ok(id)
    }

    /// Up to `limit` most recent observations for `city`, newest first.
    pub fn recent_history(
        &self,
        city: &str,
        limit: usize,
    ) -> Result<Vec<StoredObservation>, StoreError> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT id, city, temperature, description, humidity, timestamp
             FROM weather_data
             WHERE city = ?1
             ORDER BY timestamp DESC, id DESC
             LIMIT ?2",
        )?;

        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = stmt
            .query_map(params![city, limit], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?, row.get(5)?))
            })?
            .collect::<Result<Vec<RawRow>, _>>()?;

        rows.into_iter().map(Self::stored_from_raw).collect()
    }

    /// Average, minimum and maximum temperature plus row count for `city`.
    pub fn stats(&self, city: &str) -> Result<TemperatureStats, StoreError> {
        let conn = self.connect()?;
        let (average, min, max, count): (Option<f64>, Option<f64>, Option<f64>, i64) = conn
            .query_row(
                "SELECT AVG(temperature), MIN(temperature), MAX(temperature), COUNT(*)
                 FROM weather_data
                 WHERE city = ?1",
                params![city],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )?;

        Ok(TemperatureStats { count: u64::try_from(count).unwrap_or(0), average, min, max })
    }

    /// Total number of stored observations across all cities.
    pub fn count(&self) -> Result<u64, StoreError> {
        let conn = self.connect()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM weather_data", [], |row| row.get(0))?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    fn connect(&self) -> Result<Connection, StoreError> {
        Ok(Connection::open(&self.path)?)
    }

    fn stored_from_raw(raw: RawRow) -> Result<StoredObservation, StoreError> {
        let (id, city, temperature_c, description, humidity_pct, timestamp) = raw;
        let timestamp = timestamp.unwrap_or_default();
        let recorded_at =
            parse_timestamp(&timestamp).ok_or_else(|| StoreError::Timestamp(timestamp.clone()))?;

        Ok(StoredObservation { id, city, temperature_c, description, humidity_pct, recorded_at })
    }
}

/// SQLite's `CURRENT_TIMESTAMP` is UTC text without an offset.
fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    const FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

    FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|ndt| ndt.and_utc())
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.with_timezone(&Utc)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};
    use tempfile::TempDir;

    fn temp_store() -> (TempDir, ObservationStore) {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = ObservationStore::open(dir.path().join("weather.db")).expect("open store");
        (dir, store)
    }

    fn obs(city: &str, temp: f64) -> Observation {
        Observation {
            city: city.to_string(),
            temperature_c: temp,
            description: "clear sky".to_string(),
            humidity_pct: 60,
        }
    }

    #[test]
    fn insert_assigns_increasing_ids() {
        let (_dir, store) = temp_store();

        let a = store.insert(&obs("London", 10.0)).unwrap();
        let b = store.insert(&obs("London", 11.0)).unwrap();

        assert!(b > a);
        assert_eq!(store.count().unwrap(), 2);
    }

    #[test]
    fn recent_history_is_limited_newest_first_and_filtered() {
        let (_dir, store) = temp_store();

        for t in [1.0, 2.0, 3.0, 4.0] {
            store.insert(&obs("Paris", t)).unwrap();
        }
        store.insert(&obs("Tokyo", 99.0)).unwrap();

        let history = store.recent_history("Paris", 3).unwrap();

        assert_eq!(history.len(), 3);
        assert!(history.iter().all(|r| r.city == "Paris"));
        let temps: Vec<_> = history.iter().map(|r| r.temperature_c.unwrap()).collect();
        assert_eq!(temps, vec![4.0, 3.0, 2.0]);
        assert!(history.windows(2).all(|w| w[0].recorded_at >= w[1].recorded_at));
    }

    #[test]
    fn recent_history_for_unknown_city_is_empty() {
        let (_dir, store) = temp_store();
        store.insert(&obs("London", 10.0)).unwrap();

        assert!(store.recent_history("Atlantis", 5).unwrap().is_empty());
    }

    #[test]
    fn stats_without_rows_has_no_aggregates() {
        let (_dir, store) = temp_store();

        let stats = store.stats("Athens").unwrap();

        assert!(stats.is_empty());
        assert_eq!(stats, TemperatureStats::default());
    }

    #[test]
    fn stats_match_inserted_temperatures() {
        let (_dir, store) = temp_store();
        for t in [12.5, -3.0, 20.0, 7.5] {
            store.insert(&obs("Athens", t)).unwrap();
        }
        store.insert(&obs("London", 100.0)).unwrap();

        let stats = store.stats("Athens").unwrap();

        assert_eq!(stats.count, 4);
        assert!((stats.average.unwrap() - 9.25).abs() < 1e-9);
        assert_eq!(stats.min, Some(-3.0));
        assert_eq!(stats.max, Some(20.0));
    }

    #[test]
    fn initialize_twice_keeps_rows() {
        let (dir, store) = temp_store();
        store.insert(&obs("London", 10.0)).unwrap();

        store.initialize().unwrap();
        let reopened = ObservationStore::open(dir.path().join("weather.db")).unwrap();

        assert_eq!(reopened.count().unwrap(), 1);
        assert_eq!(reopened.recent_history("London", 10).unwrap().len(), 1);
    }

    #[test]
    fn initialize_creates_missing_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("deeper").join("weather.db");

        let store = ObservationStore::open(&path).unwrap();

        assert!(path.exists());
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn rows_with_null_measurements_are_readable() {
        let (_dir, store) = temp_store();
        let conn = Connection::open(store.path()).unwrap();
        conn.execute("INSERT INTO weather_data (city) VALUES ('Oslo')", []).unwrap();

        let history = store.recent_history("Oslo", 5).unwrap();
        let stats = store.stats("Oslo").unwrap();

        assert_eq!(history.len(), 1);
        assert_eq!(history[0].temperature_c, None);
        assert_eq!(history[0].description, None);
        assert_eq!(stats.count, 1);
        assert_eq!(stats.average, None);
    }

    #[test]
    fn parses_sqlite_timestamps() {
        let ts = parse_timestamp("2024-03-01 12:34:56").unwrap();
        assert_eq!((ts.year(), ts.month(), ts.day()), (2024, 3, 1));
        assert_eq!((ts.hour(), ts.minute(), ts.second()), (12, 34, 56));

        assert!(parse_timestamp("2024-03-01 12:34:56.789").is_some());
        assert!(parse_timestamp("2024-03-01T12:34:56+00:00").is_some());
        assert!(parse_timestamp("yesterday").is_none());
    }
}
