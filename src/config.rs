use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

pub const CONFIG_ENV: &str = "DAYBUILDER_CONFIG";
pub const DATABASE_ENV: &str = "DAYBUILDER_DB";
pub const DEFAULT_DURATION_ENV: &str = "DAYBUILDER_DEFAULT_DURATION";

#[derive(Debug)]
pub enum ConfigError {
    Io(io::Error),
    Parse(serde_json::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(err) => write!(f, "unable to read config: {err}"),
            ConfigError::Parse(err) => write!(f, "invalid config: {err}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<io::Error> for ConfigError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// SQLite database the planner is loaded from and saved to.
    pub database_path: Option<PathBuf>,
    /// Duration used when a new entry is added without one.
    pub default_duration_minutes: i64,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            default_duration_minutes: 60,
        }
    }
}

impl PlannerConfig {
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let file = File::open(path)?;
        let config = serde_json::from_reader(file)?;
        Ok(config)
    }

    pub fn save_json_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let file = File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }

    /// Defaults, then the JSON file named by `DAYBUILDER_CONFIG`, then the
    /// individual environment overrides.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::from_json_file(PathBuf::from(path))?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Applies overrides from any key/value source. Unparseable or
    /// non-positive durations are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(DATABASE_ENV) {
            let path = path.trim();
            if !path.is_empty() {
                tracing::info!(path, "using database from environment");
                self.database_path = Some(PathBuf::from(path));
            }
        }
        if let Some(duration) = lookup(DEFAULT_DURATION_ENV) {
            if let Ok(value) = duration.trim().parse::<i64>() {
                if value > 0 {
                    self.default_duration_minutes = value;
                }
            }
        }
    }
}
