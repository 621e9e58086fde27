use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use inquire::{Password, Text};
use weatherlog_core::{
    Collector, Config, ObservationStore, Progress, collector, provider_from_config,
};

use crate::output;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weatherlog", version, about = "Collect and summarize weather observations")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// SQLite database file (default: weather_data.db).
    #[arg(long, global = true, env = "WEATHERLOG_DB")]
    pub db: Option<PathBuf>,

    /// City to process; repeat to give several. Replaces the configured list.
    #[arg(long = "city", global = true)]
    pub cities: Vec<String>,

    /// OpenWeather API key; overrides the configured one.
    #[arg(long, global = true, env = "WEATHERLOG_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Log debug output to stderr (RUST_LOG takes precedence).
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Fetch and store every city, then print history and statistics (default).
    Run {
        /// Records shown per city.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Fetch and store every city without printing a report.
    Collect,

    /// Print stored history and statistics without fetching.
    Report {
        /// Records shown per city.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Interactively set the API key and city list.
    Configure,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let mut config = Config::load()?;
        self.apply_overrides(&mut config);

        match self.command.clone().unwrap_or(Command::Run { limit: None }) {
            Command::Run { limit } => {
                let store = open_store(&config)?;
                let collector = Collector::new(provider_from_config(&config)?, store);
                collect(&collector, &config.cities).await;
                report(collector.store(), &config.cities, limit.unwrap_or(config.history_limit))?;
            }
            Command::Collect => {
                let store = open_store(&config)?;
                let collector = Collector::new(provider_from_config(&config)?, store);
                collect(&collector, &config.cities).await;
            }
            Command::Report { limit } => {
                let store = open_store(&config)?;
                report(&store, &config.cities, limit.unwrap_or(config.history_limit))?;
            }
            Command::Configure => configure(config)?,
        }

        Ok(())
    }

    /// Fold command-line values into the loaded config.
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(db) = &self.db {
            config.database_path = db.clone();
        }
        if !self.cities.is_empty() {
            config.set_cities(&self.cities);
        }
        if let Some(key) = &self.api_key {
            config.api_key = Some(key.clone());
        }
    }
}

/// Storage initialization failure aborts the whole run.
fn open_store(config: &Config) -> anyhow::Result<ObservationStore> {
    let store = ObservationStore::open(&config.database_path).with_context(|| {
        format!("Failed to initialize database at {}", config.database_path.display())
    })?;

    println!("Database setup complete!");
    Ok(store)
}

async fn collect(collector: &Collector, cities: &[String]) {
    println!("Starting weather data collection...");

    let summary = collector
        .collect_all_with(cities, |progress| match progress {
            Progress::Fetching(city) => println!("{}", output::fetching_line(city)),
            Progress::Finished(outcome) => println!("{}", output::render_outcome(outcome)),
        })
        .await;

    println!("{}", output::render_summary(&summary));
}

fn report(store: &ObservationStore, cities: &[String], limit: usize) -> anyhow::Result<()> {
    println!("{}", output::statistics_banner());

    for city in cities {
        let report = collector::report(store, city, limit)
            .with_context(|| format!("Failed to read history for {city}"))?;

        if let Some(text) = output::render_report(&report, limit) {
            println!("{text}");
        }
    }

    Ok(())
}

fn configure(mut config: Config) -> anyhow::Result<()> {
    let api_key = Password::new("OpenWeather API key:")
        .without_confirmation()
        .with_help_message("Get one at https://openweathermap.org/api")
        .prompt()
        .context("Failed to read API key")?;

    if !api_key.trim().is_empty() {
        config.api_key = Some(api_key.trim().to_string());
    }

    let current = config.cities.join(", ");
    let cities = Text::new("Cities (comma-separated):")
        .with_default(&current)
        .prompt()
        .context("Failed to read city list")?;
    config.set_cities(cities.split(','));

    let path = config.save()?;
    println!("Configuration saved to {}", path.display());

    Ok(())
}
