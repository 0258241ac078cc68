use std::process::ExitCode;
use std::sync::Arc;

use chrono::{Duration, NaiveDate, NaiveTime};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use reach_engine::domain::{DomainError, Itinerary, LandmarkId, VisitableLocation};
use reach_engine::engine::{
    Calculation, ConfigError, EngineConfig, EngineError, ExecutionSummary, PathScoreCard,
    ScoreCard, ScoreSummary, executor_for,
};
use reach_engine::reachability::{CacheConfig, CachedReachabilityClient};
use reach_engine::sample::sample_city;

/// Environment variable naming a JSON engine configuration file.
const CONFIG_VAR: &str = "REACH_CONFIG";

/// Query times for the demo run, every five minutes.
const WINDOW: ((u32, u32), (u32, u32)) = ((7, 30), (8, 30));
const STEP_MINS: i64 = 5;

#[derive(Debug, thiserror::Error)]
enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to build the sample city: {0}")]
    Sample(#[from] DomainError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("failed to write report: {0}")]
    Report(#[from] serde_json::Error),
}

#[derive(Serialize)]
struct Report {
    execution: ExecutionSummary,
    scores: ScoreSummary,
    /// Best itineraries into the market.
    best_paths: Vec<Itinerary>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), AppError> {
    let config = match std::env::var_os(CONFIG_VAR) {
        Some(path) => EngineConfig::from_json_file(path)?,
        None => EngineConfig::default(),
    };
    info!(?config, "Loaded configuration");

    let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap_or_default();
    let city = sample_city(date)?;

    let walking = CachedReachabilityClient::new(
        city.walking.clone(),
        &CacheConfig {
            ceiling: config.longest_duration(),
            max_capacity: config.walk_cache_capacity,
        },
    );
    let card = Arc::new(PathScoreCard::new());
    let calculation = Arc::new(
        Calculation::builder(
            Arc::new(city.timetable.clone()),
            Arc::new(walking),
            Arc::new(city.arena.clone()),
            card.clone(),
        )
        .configure(&config)
        .build(),
    );

    let ((from_h, from_m), (to_h, to_m)) = WINDOW;
    let times = city.query_times(
        NaiveTime::from_hms_opt(from_h, from_m, 0).unwrap_or_default(),
        NaiveTime::from_hms_opt(to_h, to_m, 0).unwrap_or_default(),
        Duration::minutes(STEP_MINS),
    );
    let groups = calculation.task_groups(city.sectors().iter().copied(), &times, "demo");
    info!(
        groups = groups.len(),
        times = times.len(),
        served_stops = city.timetable.served_stops().count(),
        "Running sample city"
    );

    let execution = executor_for(&config).execute(&calculation, groups)?;

    let market = city.arena.id_of(&VisitableLocation::Landmark(LandmarkId(0)));
    let report = Report {
        execution,
        scores: card.summary(),
        best_paths: market.map(|m| card.best_paths(m, 3)).unwrap_or_default(),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
