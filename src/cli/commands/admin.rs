use crate::api::HttpAdminApi;
use crate::cli::parser::{AdminCmd, Commands};
use crate::config::Config;
use crate::core::AdminSession;
use crate::errors::AppResult;
use crate::models::NewEmployee;
use crate::store::SqliteStore;
use crate::ui::messages::{info, success};
use crate::utils::table::{Column, Table};

use super::{audit, http_api, open_store};

fn print_employees(list: &[crate::models::AdminEmployee]) {
    if list.is_empty() {
        info("No employees.");
        return;
    }
    let mut table = Table::new(vec![
        Column::new("ID", 5),
        Column::new("Name", 28),
        Column::new("Email", 28),
        Column::new("PIN", 4),
        Column::new("Active", 6),
    ]);
    for e in list {
        let name = if e.full_name.is_empty() {
            format!("{} {}", e.first_name, e.last_name)
        } else {
            e.full_name.clone()
        };
        table.add_row(vec![
            e.id.to_string(),
            name,
            e.email.clone(),
            if e.has_pin { "yes" } else { "no" }.into(),
            if e.is_active { "yes" } else { "no" }.into(),
        ]);
    }
    print!("{}", table.render());
}

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    let Commands::Admin { action } = cmd else {
        return Ok(());
    };
    let session: AdminSession<HttpAdminApi, SqliteStore> =
        AdminSession::new(HttpAdminApi::new(http_api(cfg)?), open_store(cfg)?);

    match action {
        AdminCmd::Login { password } => {
            let list = session.login(password)?;
            audit(session.store(), "admin_login", "", "admin credential accepted");
            success(format!("Admin logged in ({} employees)", list.len()));
        }
        AdminCmd::Logout => {
            session.logout()?;
            success("Admin logged out.");
        }
        AdminCmd::List => print_employees(&session.list()?),
        AdminCmd::Add {
            first_name,
            last_name,
            email,
            pin,
        } => {
            let created = session.add(&NewEmployee {
                first_name: first_name.clone(),
                last_name: last_name.clone(),
                email: email.clone(),
                pin: pin.clone(),
            })?;
            audit(
                session.store(),
                "admin_add",
                &created.id.to_string(),
                &format!("{} {}", created.first_name, created.last_name),
            );
            success(format!(
                "Added {} {} (id {})",
                created.first_name, created.last_name, created.id
            ));
        }
        AdminCmd::SetPin { employee_id, pin } => {
            session.set_pin(*employee_id, pin)?;
            audit(session.store(), "admin_set_pin", &employee_id.to_string(), "PIN updated");
            success(format!("PIN updated for employee {employee_id}"));
        }
        AdminCmd::Delete { employee_id } => {
            session.delete(*employee_id)?;
            audit(session.store(), "admin_delete", &employee_id.to_string(), "deleted");
            success(format!("Employee {employee_id} deleted"));
        }
    }
    Ok(())
}
