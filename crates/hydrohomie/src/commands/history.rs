//! Sensor history for one device.

use tabled::Tabled;

use hydrohomie_core::HistorySample;

use crate::cli::TargetArgs;
use crate::config::Settings;
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct HistoryRow {
    #[tabled(rename = "When")]
    when: String,
    #[tabled(rename = "Temp")]
    temperature: String,
    #[tabled(rename = "Tank")]
    tank: String,
}

impl From<&HistorySample> for HistoryRow {
    fn from(s: &HistorySample) -> Self {
        Self {
            when: s.age_label(),
            temperature: format!("{:.1}°C", s.temperature),
            tank: format!("{:.1}%", s.water_level / 10.0),
        }
    }
}

/// Query the device directly; the address need not be in the directory.
pub async fn handle(args: TargetArgs, settings: &Settings) -> Result<(), CliError> {
    let address = util::parse_address(&args.address)?;
    let samples =
        util::with_engine(settings, |c| async move { c.fetch_history(&address).await }).await?;

    let out = output::render_list(settings.output, &samples, |s| HistoryRow::from(s), |s| {
        format!("{}\t{}\t{}", s.minutes_ago, s.temperature, s.water_level)
    })?;
    output::print_output(&out, settings.quiet);
    Ok(())
}
