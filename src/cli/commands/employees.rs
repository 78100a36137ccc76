use crate::api::ClockApi;
use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::auth::validate_pin_format;
use crate::errors::AppResult;
use crate::store::{KeyValueStore, keys};
use crate::ui::messages::{info, success};
use crate::utils::table::{Column, Table};

use super::{audit, clock_machine, http_api, offline_clock_machine, status};

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    match cmd {
        Commands::Employees => list(cfg),
        Commands::Select { employee_id } => select(cfg, *employee_id),
        Commands::Login { pin } => login(cfg, pin),
        Commands::Logout => logout(cfg),
        _ => Ok(()),
    }
}

fn list(cfg: &Config) -> AppResult<()> {
    let mut employees = http_api(cfg)?.employees()?;
    employees.retain(|e| e.is_active);
    employees.sort_by_key(|e| e.display_name().to_lowercase());

    if employees.is_empty() {
        info("No active employees.");
        return Ok(());
    }

    let mut table = Table::new(vec![
        Column::new("ID", 5),
        Column::new("Name", 28),
        Column::new("PIN", 4),
    ]);
    for e in employees {
        table.add_row(vec![
            e.id.to_string(),
            e.display_name(),
            if e.has_pin { "yes" } else { "no" }.to_string(),
        ]);
    }
    print!("{}", table.render());
    Ok(())
}

fn select(cfg: &Config, employee_id: i64) -> AppResult<()> {
    let mut machine = clock_machine(cfg)?;
    let state = machine.select_employee_by_id(employee_id)?;

    if let Some(e) = state.employee() {
        audit(machine.store(), "select", &e.id.to_string(), &e.display_name());
        success(format!("Selected {}", e.display_name()));
    }
    status::print_state(&state, machine.elapsed_seconds());
    Ok(())
}

fn login(cfg: &Config, pin: &str) -> AppResult<()> {
    // Wrong length never leaves the terminal.
    validate_pin_format(pin)?;

    let mut machine = clock_machine(cfg)?;
    let state = machine.submit_pin(pin)?;

    if let Some(e) = state.employee() {
        audit(machine.store(), "pin_ok", &e.id.to_string(), &e.display_name());
        success(format!("Welcome, {}!", e.first_name));
    }
    status::print_state(&state, machine.elapsed_seconds());
    Ok(())
}

/// Works offline: only the local selection and auth record are dropped.
fn logout(cfg: &Config) -> AppResult<()> {
    let mut machine = offline_clock_machine(cfg)?;
    let selected = machine.store().get(keys::SELECTED_EMPLOYEE)?;
    machine.logout()?;

    match selected {
        Some(id) => {
            audit(machine.store(), "logout", &id, "selection cleared");
            success("Logged out.");
        }
        None => info("No employee was selected."),
    }
    Ok(())
}
