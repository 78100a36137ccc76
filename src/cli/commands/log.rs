use crate::cli::parser::Commands;
use crate::config::Config;
use crate::errors::AppResult;
use crate::store::log::load_log;
use crate::ui::messages::info;
use crate::utils::table::{Column, Table};

use super::open_store;

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if matches!(cmd, Commands::Log { print: true }) {
        let store = open_store(cfg)?;
        let rows = load_log(&store.conn)?;

        if rows.is_empty() {
            info("The log is empty.");
            return Ok(());
        }

        let mut table = Table::new(vec![
            Column::new("ID", 5),
            Column::new("Date", 26),
            Column::new("Operation", 32),
            Column::new("Message", 0),
        ]);
        for r in rows {
            let op = if r.target.is_empty() {
                r.operation.clone()
            } else {
                format!("{} ({})", r.operation, r.target)
            };
            table.add_row(vec![r.id.to_string(), r.date, op, r.message]);
        }
        print!("{}", table.render());
    }

    Ok(())
}
