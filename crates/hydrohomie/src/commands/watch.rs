//! Live overview: runs the full engine and redraws on every schedule tick.

use std::io::IsTerminal;
use std::time::Duration;

use hydrohomie_core::{Controller, ScheduleBoard};

use crate::cli::{OutputFormat, WatchArgs};
use crate::config::Settings;
use crate::error::CliError;
use crate::output::{self, Tone, paint};

use super::devices::{DeviceRow, DeviceView, countdown_label};
use super::util;

const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

pub async fn handle(args: WatchArgs, settings: &Settings) -> Result<(), CliError> {
    let selected = args
        .select
        .as_deref()
        .map(util::parse_address)
        .transpose()?;

    // Redraws follow the schedule tick; a disabled tick falls back to 1s
    let mut engine = settings.engine.clone();
    if engine.schedule_tick.is_zero() {
        engine.schedule_tick = Duration::from_secs(1);
    }

    let controller = Controller::new(engine, settings.persistence())?;
    controller.start().await?;

    let result = async {
        if let Some(address) = &selected {
            controller.selection().select(address)?;
        }
        run(&controller, args.count, settings).await
    }
    .await;

    controller.stop().await;
    result
}

async fn run(
    controller: &Controller,
    count: Option<u64>,
    settings: &Settings,
) -> Result<(), CliError> {
    let mut boards = controller.schedules();
    let clear = settings.output == OutputFormat::Table && std::io::stdout().is_terminal();
    let mut drawn: u64 = 0;

    loop {
        tokio::select! {
            biased;
            _ = tokio::signal::ctrl_c() => {
                tracing::debug!("interrupted");
                break;
            }
            changed = boards.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }

        let board = boards.borrow_and_update().clone();
        let frame = render_frame(controller, &board, settings)?;
        if clear {
            print!("{CLEAR_SCREEN}");
        }
        output::print_output(&frame, settings.quiet);

        for warning in controller.take_warnings().await {
            let line = format!("warning: {warning}");
            eprintln!("{}", paint(&line, Tone::Warn, settings.color));
        }

        drawn += 1;
        if count.is_some_and(|n| drawn >= n) {
            break;
        }
    }
    Ok(())
}

/// One redraw: the fleet table plus the selected device's countdown.
fn render_frame(
    controller: &Controller,
    board: &ScheduleBoard,
    settings: &Settings,
) -> Result<String, CliError> {
    let views: Vec<DeviceView> = controller
        .records_snapshot()
        .iter()
        .map(|r| DeviceView {
            record: (**r).clone(),
            schedule: board.get(&r.address).copied(),
        })
        .collect();

    let mut frame = output::render_list(
        settings.output,
        &views,
        |v| DeviceRow::new(v, settings.color),
        |v| v.record.address.to_string(),
    )?;

    if settings.output == OutputFormat::Table {
        if let Some(record) = controller.selection().current() {
            let countdown = board
                .get(&record.address)
                .copied()
                .map_or_else(|| "schedule unknown".into(), countdown_label);
            let line = format!("▶ {}: {countdown}", record.display_name());
            frame.push('\n');
            frame.push_str(&paint(&line, Tone::Active, settings.color));
        }
    }
    Ok(frame)
}
