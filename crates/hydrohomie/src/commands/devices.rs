//! Device command handlers.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tabled::Tabled;

use hydrohomie_config::JsonFileDirectory;
use hydrohomie_core::{
    Category, ConfigChange, CoreError, DeviceRecord, SchedulePhase, ScheduleView,
};

use crate::cli::{DevicesArgs, DevicesCommand};
use crate::config::Settings;
use crate::error::CliError;
use crate::output::{self, Tone, dash_or, format_duration, format_seconds, paint};

use super::util;

// ── Views ───────────────────────────────────────────────────────────

/// A record plus its schedule at render time, for structured output.
#[derive(Debug, Serialize)]
pub struct DeviceView {
    #[serde(flatten)]
    pub record: DeviceRecord,
    pub schedule: Option<ScheduleView>,
}

impl DeviceView {
    pub fn at(record: &DeviceRecord, now: DateTime<Utc>) -> Self {
        Self {
            record: record.clone(),
            schedule: ScheduleView::compute(record, now),
        }
    }
}

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
pub struct DeviceRow {
    #[tabled(rename = "Address")]
    address: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Tank")]
    tank: String,
    #[tabled(rename = "Temp")]
    temp: String,
    #[tabled(rename = "Countdown")]
    countdown: String,
    #[tabled(rename = "Progress")]
    progress: String,
}

impl DeviceRow {
    pub fn new(view: &DeviceView, color: bool) -> Self {
        let r = &view.record;
        Self {
            address: r.address.to_string(),
            name: r.display_name().to_owned(),
            state: state_label(r, color),
            tank: r
                .water_level_percent()
                .map_or_else(|| "-".into(), |p| format!("{p:.1}%")),
            temp: r
                .current_temp
                .map_or_else(|| "-".into(), |t| format!("{t:.1}°C")),
            countdown: view.schedule.map_or_else(|| "-".into(), countdown_label),
            progress: view
                .schedule
                .map_or_else(|| "-".into(), |s| format!("{:.0}%", s.progress_percent)),
        }
    }
}

/// Short state for tables: watering, idle, offline or unknown.
fn state_label(r: &DeviceRecord, color: bool) -> String {
    if r.status_error.is_some() {
        return paint("offline", Tone::Bad, color);
    }
    match r.is_watering {
        Some(true) => paint("watering", Tone::Active, color),
        Some(false) => paint("idle", Tone::Good, color),
        None => paint("unknown", Tone::Muted, color),
    }
}

pub fn countdown_label(view: ScheduleView) -> String {
    let left = format_duration(view.countdown());
    match view.phase {
        SchedulePhase::Idle => format!("next in {left}"),
        SchedulePhase::Watering => format!("{left} left"),
    }
}

fn error_line(r: &DeviceRecord, category: Category) -> Option<String> {
    r.last_error(category)
        .map(|e| format!("{} ({}, {})", e.message, e.kind, e.at.format("%H:%M:%S")))
}

pub fn detail(view: &DeviceView) -> String {
    let r = &view.record;
    let mut lines = vec![
        format!("Address:   {}", r.address),
        format!("Name:      {}", r.display_name()),
        format!("Watering:  {}", dash_or(r.is_watering)),
        format!(
            "Tank:      {}",
            r.water_level_percent()
                .map_or_else(|| "-".into(), |p| format!("{p:.1}%"))
        ),
        format!(
            "Temp:      {}",
            r.current_temp
                .map_or_else(|| "-".into(), |t| format!("{t:.1}°C"))
        ),
        format!(
            "Plant:     {}",
            r.current_plant_level
                .map_or_else(|| "-".into(), |p| format!("{p:.1}"))
        ),
        format!("Duration:  {}", format_seconds(r.watering_duration)),
        format!("Interval:  {}", format_seconds(r.watering_interval)),
        format!(
            "Last run:  {}",
            r.last_watering_time.map_or_else(
                || "never".into(),
                |t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string()
            )
        ),
    ];
    if let Some(threshold) = r.water_tank_threshold {
        lines.push(format!("Tank min:  {threshold}"));
    }
    if let Some(buffer) = r.plant_flood_buffer {
        lines.push(format!("Flood buf: {buffer}"));
    }
    if let Some(schedule) = view.schedule {
        lines.push(format!(
            "Schedule:  {} ({:.0}%)",
            countdown_label(schedule),
            schedule.progress_percent
        ));
    }
    if let Some(err) = error_line(r, Category::Status) {
        lines.push(format!("Status error: {err}"));
    }
    if let Some(err) = error_line(r, Category::Config) {
        lines.push(format!("Config error: {err}"));
    }
    lines.join("\n")
}

fn render_records(records: &[Arc<DeviceRecord>], settings: &Settings) -> Result<String, CliError> {
    let now = Utc::now();
    let views: Vec<DeviceView> = records.iter().map(|r| DeviceView::at(r, now)).collect();
    output::render_list(
        settings.output,
        &views,
        |v| DeviceRow::new(v, settings.color),
        |v| v.record.address.to_string(),
    )
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(args: DevicesArgs, settings: &Settings) -> Result<(), CliError> {
    match args.command {
        DevicesCommand::List { offline: true } => {
            let directory = JsonFileDirectory::new(&settings.directory_file).read()?;
            let records: Vec<Arc<DeviceRecord>> = directory
                .into_iter()
                .map(|a| Arc::new(DeviceRecord::new(a)))
                .collect();
            let out = render_records(&records, settings)?;
            output::print_output(&out, settings.quiet);
            Ok(())
        }

        DevicesCommand::List { offline: false } => {
            let records = util::with_engine(settings, |c| async move {
                c.refresh().await?;
                Ok(c.records_snapshot())
            })
            .await?;
            let out = render_records(&records, settings)?;
            output::print_output(&out, settings.quiet);
            Ok(())
        }

        DevicesCommand::Show { address } => {
            let address = util::parse_address(&address)?;
            let record = util::with_engine(settings, |c| async move {
                if !c.store().contains(&address) {
                    return Err(CoreError::DeviceNotFound {
                        address: address.to_string(),
                    });
                }
                c.refresh().await?;
                c.record(&address).ok_or_else(|| CoreError::DeviceNotFound {
                    address: address.to_string(),
                })
            })
            .await?;
            let view = DeviceView::at(&record, Utc::now());
            let out = output::render_single(settings.output, &view, detail, |v| {
                v.record.address.to_string()
            })?;
            output::print_output(&out, settings.quiet);
            Ok(())
        }

        DevicesCommand::Add { address } => {
            let address = util::parse_address(&address)?;
            let record =
                util::with_engine(settings, |c| async move { c.add_device(address).await })
                    .await?;
            output::print_status(
                &format!("Added {} ({})", record.display_name(), record.address),
                settings.quiet,
            );
            Ok(())
        }

        DevicesCommand::Remove { address } => {
            let address = util::parse_address(&address)?;
            if !util::confirm(
                &format!("Remove {address} from the directory?"),
                "devices remove",
                settings,
            )? {
                return Ok(());
            }
            let record =
                util::with_engine(settings, |c| async move { c.remove_device(address).await })
                    .await?;
            output::print_status(&format!("Removed {}", record.address), settings.quiet);
            Ok(())
        }

        DevicesCommand::Configure {
            address,
            name,
            duration,
            interval,
        } => {
            let address = util::parse_address(&address)?;
            let change = ConfigChange {
                name,
                watering_duration: duration.map(|d| d.as_secs()),
                watering_interval: interval.map(|d| d.as_secs()),
            };
            change.validate()?;

            let record = util::with_engine(settings, |c| async move {
                if !c.store().contains(&address) {
                    return Err(CoreError::DeviceNotFound {
                        address: address.to_string(),
                    });
                }
                // Unchanged fields are filled from what the device reports
                c.refresh().await?;
                c.update_config(address, change).await
            })
            .await?;

            let view = DeviceView::at(&record, Utc::now());
            let out = output::render_single(settings.output, &view, detail, |v| {
                v.record.address.to_string()
            })?;
            output::print_status(&format!("Updated {}", record.display_name()), settings.quiet);
            output::print_output(&out, settings.quiet);
            Ok(())
        }
    }
}
