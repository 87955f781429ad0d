//! Command dispatch: bridges CLI args -> core Commands -> output formatting.

pub mod config_cmd;
pub mod control;
pub mod devices;
pub mod history;
pub mod util;
pub mod watch;

use crate::cli::Command;
use crate::config::Settings;
use crate::error::CliError;

/// Dispatch a device-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, settings: &Settings) -> Result<(), CliError> {
    match cmd {
        Command::Devices(args) => devices::handle(args, settings).await,
        Command::Water(args) => control::water(args, settings).await,
        Command::Stop(args) => control::stop(args, settings).await,
        Command::History(args) => history::handle(args, settings).await,
        Command::Watch(args) => watch::handle(args, settings).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => Err(CliError::Internal {
            message: "command does not need a device engine".into(),
        }),
    }
}
