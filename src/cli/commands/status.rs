use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::ClockState;
use crate::errors::AppResult;
use crate::models::TimeEntry;
use crate::ui::messages::{detail, error, info, success, warning};
use crate::utils::time::{format_local, format_timer};
use std::thread;
use std::time::Duration;
use tracing::debug;

use super::clock_machine;

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    match cmd {
        Commands::Status => {
            let machine = clock_machine(cfg)?;
            print_state(&machine.state(), machine.elapsed_seconds());
            Ok(())
        }
        Commands::Watch { interval, count } => watch(cfg, *interval, *count),
        _ => Ok(()),
    }
}

fn print_entry_details(entry: &TimeEntry) {
    detail("Started", format_local(entry.start_time));
    if !entry.description.is_empty() {
        detail("Description", &entry.description);
    }
    if !entry.activity_tags.is_empty() {
        let names: Vec<&str> = entry.activity_tags.iter().map(|t| t.name.as_str()).collect();
        detail("Tags", names.join(", "));
    }
    if !entry.photos.is_empty() {
        detail("Photos", entry.photos.len());
    }
}

pub(crate) fn print_state(state: &ClockState, elapsed: Option<i64>) {
    let timer = format_timer(elapsed.unwrap_or(0));
    match state {
        ClockState::NoEmployeeSelected => {
            info("No employee selected. Use `rtimeclock employees` and `rtimeclock select <ID>`.");
        }
        ClockState::AwaitingAuthentication { employee } => {
            info(format!(
                "Hello, {}. Enter your PIN with `rtimeclock login --pin <PIN>`.",
                employee.first_name
            ));
        }
        ClockState::AuthenticatedIdle { employee } => {
            info(format!("{} is clocked out.", employee.display_name()));
        }
        ClockState::ActiveNormal { employee, entry } => {
            success(format!(
                "{} is clocked in on {} [{timer}]",
                employee.display_name(),
                entry.job_display_name
            ));
            print_entry_details(entry);
        }
        ClockState::ActiveInterruption {
            employee,
            entry,
            paused,
        } => {
            warning(format!(
                "{} is on an interruption: {} [{timer}]",
                employee.display_name(),
                entry.job_display_name
            ));
            if !entry.interruption_reason.is_empty() {
                detail("Reason", &entry.interruption_reason);
            }
            print_entry_details(entry);
            if let Some(p) = paused {
                detail(
                    "Paused",
                    format!("{} (since {})", p.job_display_name, format_local(p.start_time)),
                );
            }
        }
    }
}

/// One line per state change; the server stays authoritative.
fn watch(cfg: &Config, interval: Option<u64>, count: Option<u64>) -> AppResult<()> {
    let mut machine = clock_machine(cfg)?;
    let every = Duration::from_secs(interval.unwrap_or(cfg.poll_interval_secs).max(1));

    let mut last: Option<String> = None;
    machine.subscribe(move |state| {
        let line = match state.entry() {
            Some(e) => format!("{state}: {} (entry {})", e.job_display_name, e.id),
            None => state.to_string(),
        };
        if last.as_deref() != Some(line.as_str()) {
            info(&line);
            last = Some(line);
        }
    });

    print_state(&machine.state(), machine.elapsed_seconds());

    let mut polls = 0u64;
    loop {
        if count.is_some_and(|c| polls >= c) {
            return Ok(());
        }
        thread::sleep(every);
        polls += 1;
        debug!(poll = polls, "polling current entry");
        // A failed poll keeps the last known state.
        if let Err(e) = machine.refresh() {
            error(format!("Refresh failed: {e}"));
        }
    }
}
