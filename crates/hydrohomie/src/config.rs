//! CLI configuration: thin wrapper around `hydrohomie_config`.
//!
//! Adds resolution that respects `GlobalOpts` flag overrides
//! (--timeout, --directory, --output, --color).

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::ValueEnum;

use hydrohomie_config::JsonFileDirectory;
use hydrohomie_core::{DirectoryPersistence, EngineConfig};

use crate::cli::{ColorMode, GlobalOpts, OutputFormat};
use crate::error::CliError;

pub use hydrohomie_config::{Config, config_path, load_config, save_config};

/// Everything a command needs, resolved once per invocation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub engine: EngineConfig,
    pub directory_file: PathBuf,
    pub output: OutputFormat,
    pub color: bool,
    pub quiet: bool,
    pub yes: bool,
}

impl Settings {
    /// Merge the config file with CLI flag overrides. Flags win.
    pub fn resolve(cfg: &Config, global: &GlobalOpts) -> Result<Self, CliError> {
        let mut engine = cfg.engine_config();
        if let Some(secs) = global.timeout {
            if secs == 0 {
                return Err(CliError::Validation {
                    field: "timeout".into(),
                    reason: "must be at least 1 second".into(),
                });
            }
            engine.request_timeout = Duration::from_secs(secs);
        }

        let output = match global.output {
            Some(format) => format,
            None => parse_enum::<OutputFormat>("defaults.output", &cfg.defaults.output)?,
        };
        let color = match global.color {
            Some(mode) => mode,
            None => parse_enum::<ColorMode>("defaults.color", &cfg.defaults.color)?,
        };

        Ok(Self {
            engine,
            directory_file: global
                .directory
                .clone()
                .unwrap_or_else(|| cfg.directory_path()),
            output,
            color: crate::output::should_color(color),
            quiet: global.quiet,
            yes: global.yes,
        })
    }

    pub fn persistence(&self) -> Arc<dyn DirectoryPersistence> {
        Arc::new(JsonFileDirectory::new(&self.directory_file))
    }
}

fn parse_enum<E: ValueEnum>(field: &str, raw: &str) -> Result<E, CliError> {
    E::from_str(raw, true).map_err(|reason| CliError::Validation {
        field: field.into(),
        reason,
    })
}

/// Apply `key = value` to a config. Only known keys are accepted.
pub fn set_value(cfg: &mut Config, key: &str, value: &str) -> Result<(), CliError> {
    let seconds = || {
        value.parse::<u64>().map_err(|_| CliError::Validation {
            field: key.into(),
            reason: format!("expected a whole number of seconds, got '{value}'"),
        })
    };

    match key {
        "defaults.output" => {
            parse_enum::<OutputFormat>(key, value)?;
            cfg.defaults.output = value.to_ascii_lowercase();
        }
        "defaults.color" => {
            parse_enum::<ColorMode>(key, value)?;
            cfg.defaults.color = value.to_ascii_lowercase();
        }
        "engine.timeout" => cfg.engine.timeout = seconds()?,
        "engine.status_interval" => cfg.engine.status_interval = seconds()?,
        "engine.config_interval" => cfg.engine.config_interval = seconds()?,
        "engine.schedule_tick" => cfg.engine.schedule_tick = seconds()?,
        "directory_file" => cfg.directory_file = Some(PathBuf::from(value)),
        other => {
            return Err(CliError::Validation {
                field: "key".into(),
                reason: format!(
                    "unknown key '{other}' (known: defaults.output, defaults.color, \
                     engine.timeout, engine.status_interval, engine.config_interval, \
                     engine.schedule_tick, directory_file)"
                ),
            });
        }
    }
    cfg.validate()?;
    Ok(())
}
