//! Manual watering commands.

use crate::cli::TargetArgs;
use crate::config::Settings;
use crate::error::CliError;
use crate::output;

use super::util;

/// Start a watering cycle now. The device's own schedule is untouched.
pub async fn water(args: TargetArgs, settings: &Settings) -> Result<(), CliError> {
    let address = util::parse_address(&args.address)?;
    let target = address.clone();
    util::with_engine(settings, |c| async move { c.force_water(target).await }).await?;
    output::print_status(&format!("Watering started on {address}"), settings.quiet);
    Ok(())
}

/// Stop a watering cycle in progress.
pub async fn stop(args: TargetArgs, settings: &Settings) -> Result<(), CliError> {
    let address = util::parse_address(&args.address)?;
    let target = address.clone();
    util::with_engine(settings, |c| async move { c.force_stop(target).await }).await?;
    output::print_status(&format!("Watering stopped on {address}"), settings.quiet);
    Ok(())
}
