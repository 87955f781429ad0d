//! Shared helpers for command handlers.

use std::future::Future;
use std::io::IsTerminal;

use hydrohomie_core::{Controller, CoreError, DeviceAddress};

use crate::config::Settings;
use crate::error::CliError;
use crate::output;

/// Validate an operator-entered device address.
pub fn parse_address(raw: &str) -> Result<DeviceAddress, CliError> {
    DeviceAddress::parse(raw).map_err(|e| match e {
        CoreError::ValidationFailed { message } => CliError::Validation {
            field: "address".into(),
            reason: message,
        },
        other => other.into(),
    })
}

/// Run `f` against a one-shot engine built from `settings`, then print
/// any non-fatal warnings the engine collected (e.g. the directory file
/// could not be written).
pub async fn with_engine<F, Fut, T>(settings: &Settings, f: F) -> Result<T, CliError>
where
    F: FnOnce(Controller) -> Fut,
    Fut: Future<Output = Result<T, CoreError>>,
{
    let (value, warnings) =
        Controller::oneshot(settings.engine.clone(), settings.persistence(), |c| async move {
            let value = f(c.clone()).await?;
            Ok((value, c.take_warnings().await))
        })
        .await?;

    for warning in warnings {
        let line = format!("warning: {warning}");
        eprintln!("{}", output::paint(&line, output::Tone::Warn, settings.color));
    }
    Ok(value)
}

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, action: &str, settings: &Settings) -> Result<bool, CliError> {
    if settings.yes {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: action.into(),
        });
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    Ok(confirmed)
}
