//! Configuration for heartlive.

use crate::core::history::DEFAULT_CAPACITY;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Main configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Time between readings from the feed
    #[serde(with = "duration_serde")]
    pub tick_interval: Duration,

    /// Number of readings kept for the trend line
    pub history_capacity: usize,

    /// Which heart-rate source to use
    pub source: SourceKind,

    /// Recording played back by the replay source
    pub replay_path: Option<PathBuf>,

    /// Synthetic generator bounds
    pub mock: MockConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(2),
            history_capacity: DEFAULT_CAPACITY,
            source: SourceKind::Mock,
            replay_path: None,
            mock: MockConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from `path`, falling back to defaults if it is missing.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
        let config: Config =
            serde_json::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path())
    }

    /// Save configuration to `path`.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path, content).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("heartlive")
            .join("config.json")
    }

    /// Check that the values can drive a session.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.history_capacity == 0 {
            return Err(ConfigError::Invalid(
                "history_capacity must be at least 1".to_string(),
            ));
        }
        if self.tick_interval.is_zero() {
            return Err(ConfigError::Invalid(
                "tick_interval must be at least 1 second".to_string(),
            ));
        }
        if self.source == SourceKind::Replay && self.replay_path.is_none() {
            return Err(ConfigError::Invalid(
                "replay source needs a replay_path".to_string(),
            ));
        }
        self.mock.validate()
    }
}

/// Where heart-rate readings come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Synthetic random walk
    Mock,
    /// Recorded measurements played back from a file
    Replay,
}

impl FromStr for SourceKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mock" | "simulated" => Ok(SourceKind::Mock),
            "replay" | "file" => Ok(SourceKind::Replay),
            other => Err(ConfigError::Invalid(format!("unknown source '{other}'"))),
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceKind::Mock => write!(f, "mock"),
            SourceKind::Replay => write!(f, "replay"),
        }
    }
}

/// Bounds for the synthetic heart-rate generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MockConfig {
    /// Lowest value the generator emits
    pub min_bpm: i32,
    /// Highest value the generator emits
    pub max_bpm: i32,
    /// Lower bound of the value picked at session start
    pub initial_min: i32,
    /// Upper bound of the value picked at session start
    pub initial_max: i32,
    /// Largest change between two consecutive readings
    pub max_step: i32,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            min_bpm: 55,
            max_bpm: 120,
            initial_min: 65,
            initial_max: 85,
            max_step: 3,
        }
    }
}

impl MockConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_bpm > self.max_bpm {
            return Err(ConfigError::Invalid(format!(
                "mock.min_bpm ({}) is above mock.max_bpm ({})",
                self.min_bpm, self.max_bpm
            )));
        }
        if self.initial_min > self.initial_max {
            return Err(ConfigError::Invalid(format!(
                "mock.initial_min ({}) is above mock.initial_max ({})",
                self.initial_min, self.initial_max
            )));
        }
        if self.max_step < 0 {
            return Err(ConfigError::Invalid(
                "mock.max_step must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    IoError(String),
    ParseError(String),
    SerializeError(String),
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {e}"),
            ConfigError::ParseError(e) => write!(f, "Parse error: {e}"),
            ConfigError::SerializeError(e) => write!(f, "Serialize error: {e}"),
            ConfigError::Invalid(e) => write!(f, "Invalid configuration: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Serde support for Duration.
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
