use rand::Rng;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

// ============================================================================
// Table Configuration
// ============================================================================
//
// Everything tunable about a dinner: table size, how long philosophers
// think and eat, how often the observer looks at the counters, and the
// optional bounds that make a run finite.
//
// Loaded from JSON (every field optional) and overridden from the CLI.
//
// ============================================================================

/// Inclusive range of milliseconds a phase may last
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurationRange {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl DurationRange {
    pub const fn new(min_ms: u64, max_ms: u64) -> Self {
        Self { min_ms, max_ms }
    }

    /// Draw a duration uniformly from the range
    pub fn sample<R: Rng>(&self, rng: &mut R) -> Duration {
        Duration::from_millis(rng.random_range(self.min_ms..=self.max_ms))
    }

    fn validate(&self, name: &'static str) -> Result<(), ConfigError> {
        if self.min_ms > self.max_ms {
            return Err(ConfigError::InvalidRange {
                name,
                min_ms: self.min_ms,
                max_ms: self.max_ms,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TableConfig {
    /// Number of philosophers, and therefore of forks
    pub philosophers: usize,
    /// How long a philosopher thinks between attempts
    pub think: DurationRange,
    /// How long a philosopher holds both forks
    pub eat: DurationRange,
    /// Period of the observer that resets the meal counters
    pub observer_interval_ms: u64,
    /// Seed for seating orientation and phase durations; random when absent
    pub seed: Option<u64>,
    /// Stop each philosopher after this many think/attempt rounds
    pub rounds: Option<u64>,
    /// Stop the whole dinner after this many seconds
    pub run_for_secs: Option<u64>,
    /// Serve Prometheus metrics on this port
    pub metrics_port: Option<u16>,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            philosophers: 5,
            think: DurationRange::new(1000, 5000),
            eat: DurationRange::new(1000, 5000),
            observer_interval_ms: 1000,
            seed: None,
            rounds: None,
            run_for_secs: None,
            metrics_port: None,
        }
    }
}

impl TableConfig {
    /// Load a config from a JSON file, filling missing fields with defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.philosophers < 2 {
            return Err(ConfigError::TooFewPhilosophers(self.philosophers));
        }
        self.think.validate("think")?;
        self.eat.validate("eat")?;
        if self.observer_interval_ms == 0 {
            return Err(ConfigError::ZeroObserverInterval);
        }
        Ok(())
    }

    pub fn observer_interval(&self) -> Duration {
        Duration::from_millis(self.observer_interval_ms)
    }

    pub fn run_for(&self) -> Option<Duration> {
        self.run_for_secs.map(Duration::from_secs)
    }
}

// ============================================================================
// Configuration Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("A table needs at least 2 philosophers, got {0}")]
    TooFewPhilosophers(usize),

    #[error("Invalid {name} range: {min_ms}ms is greater than {max_ms}ms")]
    InvalidRange {
        name: &'static str,
        min_ms: u64,
        max_ms: u64,
    },

    #[error("Observer interval must be greater than zero")]
    ZeroObserverInterval,

    #[error("Failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_default_config_is_valid() {
        let config = TableConfig::default();

        assert!(config.validate().is_ok());
        assert_eq!(config.philosophers, 5);
        assert_eq!(config.think, DurationRange::new(1000, 5000));
        assert_eq!(config.eat, DurationRange::new(1000, 5000));
        assert_eq!(config.observer_interval(), Duration::from_secs(1));
        assert_eq!(config.run_for(), None);
    }

    #[test]
    fn test_validate_rejects_tiny_table() {
        let config = TableConfig {
            philosophers: 1,
            ..TableConfig::default()
        };

        assert!(matches!(config.validate(), Err(ConfigError::TooFewPhilosophers(1))));
    }

    #[test]
    fn test_validate_rejects_inverted_range() {
        let config = TableConfig {
            eat: DurationRange::new(50, 10),
            ..TableConfig::default()
        };

        match config.validate() {
            Err(ConfigError::InvalidRange { name, min_ms, max_ms }) => {
                assert_eq!(name, "eat");
                assert_eq!(min_ms, 50);
                assert_eq!(max_ms, 10);
            }
            other => panic!("Expected InvalidRange, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_rejects_zero_observer_interval() {
        let config = TableConfig {
            observer_interval_ms: 0,
            ..TableConfig::default()
        };

        assert!(matches!(config.validate(), Err(ConfigError::ZeroObserverInterval)));
    }

    #[test]
    fn test_sample_stays_within_range() {
        let range = DurationRange::new(10, 20);
        let mut rng = ChaCha8Rng::seed_from_u64(7);

        for _ in 0..1000 {
            let sampled = range.sample(&mut rng);
            assert!(sampled >= Duration::from_millis(10));
            assert!(sampled <= Duration::from_millis(20));
        }
    }

    #[test]
    fn test_sample_degenerate_range() {
        let range = DurationRange::new(3, 3);
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        assert_eq!(range.sample(&mut rng), Duration::from_millis(3));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: TableConfig =
            serde_json::from_str(r#"{ "philosophers": 7, "rounds": 10 }"#).unwrap();

        assert_eq!(config.philosophers, 7);
        assert_eq!(config.rounds, Some(10));
        assert_eq!(config.think, TableConfig::default().think);
        assert_eq!(config.seed, None);
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let result = serde_json::from_str::<TableConfig>(r#"{ "forks": 5 }"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_from_json_file() {
        let path = std::env::temp_dir().join(format!("table-{}.json", uuid::Uuid::new_v4()));
        std::fs::write(
            &path,
            r#"{ "seed": 42, "think": { "min_ms": 1, "max_ms": 2 } }"#,
        )
        .unwrap();

        let config = TableConfig::from_json_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.seed, Some(42));
        assert_eq!(config.think, DurationRange::new(1, 2));
        assert_eq!(config.philosophers, 5);
    }

    #[test]
    fn test_from_missing_file() {
        let path = std::env::temp_dir().join(format!("missing-{}.json", uuid::Uuid::new_v4()));

        assert!(matches!(
            TableConfig::from_json_file(&path),
            Err(ConfigError::Read { .. })
        ));
    }
}
