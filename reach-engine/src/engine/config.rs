//! Engine configuration.

use std::path::{Path, PathBuf};

use chrono::Duration;
use serde::Deserialize;

use super::range::Strategy;
use crate::domain::Direction;

/// Errors loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// How task groups are scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutorKind {
    Sequential,
    #[default]
    Parallel,
}

/// Configuration parameters for a calculation.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Forward (earliest arrival) or backward (latest departure) search.
    pub direction: Direction,

    /// How tables are reused across a task group's times.
    pub strategy: Strategy,

    pub executor: ExecutorKind,

    /// Worker threads for the parallel executor.
    /// `None` uses the available hardware parallelism.
    pub workers: Option<usize>,

    /// Travel-time budget (minutes).
    pub longest_duration_mins: i64,

    /// Minimum time at a stop before boarding (minutes).
    pub boarding_buffer_mins: i64,

    /// Round limit per table build. `None` uses one more than the number
    /// of locations.
    pub max_rounds: Option<usize>,

    /// How often the parallel executor reports on draining workers (milliseconds).
    pub poll_interval_ms: u64,

    /// Maximum number of locations in the walking cache.
    pub walk_cache_capacity: u64,
}

impl EngineConfig {
    /// Load configuration from a JSON file. Missing fields take defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the values describe a runnable calculation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.longest_duration_mins <= 0 {
            return Err(ConfigError::Invalid(
                "longest_duration_mins must be positive".to_string(),
            ));
        }
        if self.boarding_buffer_mins < 0 {
            return Err(ConfigError::Invalid(
                "boarding_buffer_mins must not be negative".to_string(),
            ));
        }
        if self.workers == Some(0) {
            return Err(ConfigError::Invalid("workers must be at least 1".to_string()));
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "poll_interval_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Returns the travel-time budget as a Duration.
    pub fn longest_duration(&self) -> Duration {
        Duration::minutes(self.longest_duration_mins)
    }

    /// Returns the boarding buffer as a Duration.
    pub fn boarding_buffer(&self) -> Duration {
        Duration::minutes(self.boarding_buffer_mins)
    }

    /// Returns the poll interval.
    pub fn poll_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            direction: Direction::Forward,
            strategy: Strategy::Incremental,
            executor: ExecutorKind::Parallel,
            workers: None,
            longest_duration_mins: 45,
            boarding_buffer_mins: 1,
            max_rounds: None,
            poll_interval_ms: 5_000,
            walk_cache_capacity: 10_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn default_config() {
        let config = EngineConfig::default();

        assert_eq!(config.direction, Direction::Forward);
        assert_eq!(config.strategy, Strategy::Incremental);
        assert_eq!(config.executor, ExecutorKind::Parallel);
        assert_eq!(config.workers, None);
        assert_eq!(config.longest_duration_mins, 45);
        assert_eq!(config.boarding_buffer_mins, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn duration_methods() {
        let config = EngineConfig::default();

        assert_eq!(config.longest_duration(), Duration::minutes(45));
        assert_eq!(config.boarding_buffer(), Duration::minutes(1));
        assert_eq!(config.poll_interval(), std::time::Duration::from_secs(5));
    }

    #[test]
    fn load_partial_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("engine.json");
        std::fs::write(
            &path,
            r#"{ "direction": "backward", "strategy": "progressive", "workers": 2 }"#,
        )
        .unwrap();

        let config = EngineConfig::from_json_file(&path).unwrap();
        assert_eq!(config.direction, Direction::Backward);
        assert_eq!(config.strategy, Strategy::Progressive);
        assert_eq!(config.workers, Some(2));
        assert_eq!(config.longest_duration_mins, 45);
    }

    #[test]
    fn missing_file() {
        let dir = tempdir().unwrap();
        let err = EngineConfig::from_json_file(dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn malformed_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("engine.json");
        std::fs::write(&path, r#"{ "direction": "sideways" }"#).unwrap();

        let err = EngineConfig::from_json_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn rejects_invalid_values() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("engine.json");
        std::fs::write(&path, r#"{ "longest_duration_mins": 0 }"#).unwrap();
        assert!(matches!(
            EngineConfig::from_json_file(&path),
            Err(ConfigError::Invalid(_))
        ));

        let config = EngineConfig {
            workers: Some(0),
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
