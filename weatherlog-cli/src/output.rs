//! Human-readable rendering of collection results and reports.

use chrono::{DateTime, Utc};
use weatherlog_core::{
    CityOutcome, CityReport, CollectionSummary, Observation, StoredObservation, TemperatureStats,
};

pub const BANNER_WIDTH: usize = 50;

pub fn fetching_line(city: &str) -> String {
    format!("\nFetching weather for {city}...")
}

/// Lines printed after one city has been collected.
pub fn render_outcome(outcome: &CityOutcome) -> String {
    match outcome {
        CityOutcome::Saved { observation, .. } => {
            format!(
                "Weather data for {} saved successfully!\n{}",
                observation.city,
                render_observation(observation)
            )
        }
        CityOutcome::FetchFailed { city, error } => {
            format!("Failed to get data for {city}: {error}")
        }
        CityOutcome::StoreFailed { observation, error } => {
            format!("Failed to save data for {}: {error}", observation.city)
        }
    }
}

pub fn render_observation(obs: &Observation) -> String {
    format!(
        "Temperature: {}°C\nDescription: {}\nHumidity: {}%",
        celsius(obs.temperature_c),
        obs.description,
        obs.humidity_pct
    )
}

pub fn render_summary(summary: &CollectionSummary) -> String {
    format!(
        "\nCollected {} of {} cities ({} failed).",
        summary.saved(),
        summary.outcomes.len(),
        summary.failed()
    )
}

pub fn statistics_banner() -> String {
    let rule = "=".repeat(BANNER_WIDTH);
    format!("\n{rule}\nWEATHER STATISTICS\n{rule}")
}

/// History and stats for one city. Returns `None` when the city has no rows.
pub fn render_report(report: &CityReport, limit: usize) -> Option<String> {
    if report.history.is_empty() {
        return None;
    }

    let mut out = format!("\nLast {limit} records for {}:", report.city);
    for record in &report.history {
        out.push_str("\n  ");
        out.push_str(&render_history_line(record));
    }

    if let Some(stats) = render_stats(&report.stats) {
        out.push_str("\n  ");
        out.push_str(&stats);
    }

    Some(out)
}

pub fn render_history_line(record: &StoredObservation) -> String {
    format!(
        "{}: {}°C - {}",
        format_timestamp(record.recorded_at),
        display_or_dash(record.temperature_c),
        record.description.as_deref().unwrap_or("-"),
    )
}

/// Only rendered when there is at least one row with a temperature.
pub fn render_stats(stats: &TemperatureStats) -> Option<String> {
    if stats.is_empty() {
        return None;
    }

    let (avg, min, max) = (stats.average?, stats.min?, stats.max?);
    Some(format!("Stats: Avg: {avg:.1}°C, Min: {}°C, Max: {}°C", celsius(min), celsius(max)))
}

pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Whole degrees keep their decimal point: `12.0`, not `12`.
fn celsius(value: f64) -> String {
    format!("{value:?}")
}

fn display_or_dash(value: Option<f64>) -> String {
    value.map(celsius).unwrap_or_else(|| "-".to_string())
}
