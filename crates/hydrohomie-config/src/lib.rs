//! Shared configuration for HydroHomie tools.
//!
//! TOML settings merged with defaults and `HYDROHOMIE_` environment
//! variables, translation to `hydrohomie_core::EngineConfig`, and the
//! JSON file that persists the device directory.

mod directory;

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use hydrohomie_core::EngineConfig;

pub use directory::JsonFileDirectory;

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("malformed device directory: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Output defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Polling and timing.
    #[serde(default)]
    pub engine: EngineSettings,

    /// Where the device directory is stored. Defaults to the platform
    /// data directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory_file: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}

/// Engine timing, in seconds. A zero interval disables that task.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct EngineSettings {
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    #[serde(default = "default_poll_interval")]
    pub status_interval: u64,

    #[serde(default = "default_poll_interval")]
    pub config_interval: u64,

    #[serde(default = "default_schedule_tick")]
    pub schedule_tick: u64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            status_interval: default_poll_interval(),
            config_interval: default_poll_interval(),
            schedule_tick: default_schedule_tick(),
        }
    }
}

fn default_timeout() -> u64 {
    4
}
fn default_poll_interval() -> u64 {
    5
}
fn default_schedule_tick() -> u64 {
    1
}

impl Config {
    /// Check values figment cannot: a zero timeout would fail every call.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.engine.timeout == 0 {
            return Err(ConfigError::Validation {
                field: "engine.timeout".into(),
                reason: "must be at least 1 second".into(),
            });
        }
        if !matches!(
            self.defaults.output.as_str(),
            "table" | "json" | "json-compact" | "yaml" | "plain"
        ) {
            return Err(ConfigError::Validation {
                field: "defaults.output".into(),
                reason: format!(
                    "expected 'table', 'json', 'json-compact', 'yaml' or 'plain', got '{}'",
                    self.defaults.output
                ),
            });
        }
        Ok(())
    }

    /// Translate to the engine's runtime configuration.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            request_timeout: Duration::from_secs(self.engine.timeout),
            status_interval: Duration::from_secs(self.engine.status_interval),
            config_interval: Duration::from_secs(self.engine.config_interval),
            schedule_tick: Duration::from_secs(self.engine.schedule_tick),
        }
    }

    /// The configured directory file, or the platform default.
    pub fn directory_path(&self) -> PathBuf {
        self.directory_file
            .clone()
            .unwrap_or_else(default_directory_path)
    }
}

// ── Paths ───────────────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "hydrohomie", "hydrohomie")
}

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    project_dirs().map_or_else(
        || dirs_fallback().join("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Default location of the persisted device directory.
pub fn default_directory_path() -> PathBuf {
    project_dirs().map_or_else(
        || dirs_fallback().join("devices.json"),
        |dirs| dirs.data_dir().join("devices.json"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("hydrohomie");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load config from `path` (which need not exist) + environment.
///
/// Environment keys use `__` between sections, e.g.
/// `HYDROHOMIE_ENGINE__TIMEOUT=10`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("HYDROHOMIE_").split("__"));

    let config: Config = figment.extract()?;
    config.validate()?;
    Ok(config)
}

/// Load config, returning a default if the file is missing or invalid.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_engine_defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.engine_config(), EngineConfig::default());
        assert_eq!(cfg.defaults.output, "table");
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg.engine.status_interval, 5);
        assert!(cfg.directory_file.is_none());
    }

    #[test]
    fn file_values_override_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "directory_file = \"/tmp/homies.json\"\n\n[engine]\nstatus_interval = 2\nschedule_tick = 0\n",
        )
        .unwrap();

        let cfg = load_config_from(&path).unwrap();
        assert_eq!(cfg.engine.status_interval, 2);
        assert_eq!(cfg.engine.config_interval, 5);
        assert_eq!(cfg.directory_path(), PathBuf::from("/tmp/homies.json"));

        let engine = cfg.engine_config();
        assert_eq!(engine.status_interval, Duration::from_secs(2));
        assert!(engine.schedule_tick.is_zero());
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[engine]\ntimeout = 0\n").unwrap();

        let err = load_config_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Validation { .. }));
    }

    #[test]
    fn save_then_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut cfg = Config::default();
        cfg.defaults.output = "json".into();
        cfg.engine.timeout = 9;

        save_config_to(&cfg, &path).unwrap();
        assert_eq!(load_config_from(&path).unwrap(), cfg);
    }
}
