use crate::api::ClockApi;
use crate::cli::parser::Commands;
use crate::config::Config;
use crate::errors::AppResult;
use crate::ui::messages::info;
use crate::utils::colors::paint_hex;
use crate::utils::table::{Column, Table};

use super::http_api;

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Tags { role } = cmd {
        let api = http_api(cfg)?;
        let mut tags = match role {
            Some(r) => api.tags_for_role(*r)?,
            None => api.activity_tags()?,
        };
        tags.retain(|t| t.is_active);

        if tags.is_empty() {
            info("No activity tags.");
            return Ok(());
        }

        let mut table = Table::new(vec![
            Column::new("ID", 5),
            Column::new("Name", 24),
            Column::new("Scope", 20),
        ]);
        for t in &tags {
            let scope = if t.is_global() {
                "global".to_string()
            } else {
                t.role_name.clone().unwrap_or_default()
            };
            table.add_row(vec![t.id.to_string(), format!("● {}", t.name), scope]);
        }

        // Color the bullet after padding so escape codes do not skew widths.
        let rendered = table.render();
        let mut lines = rendered.lines();
        if let Some(h) = lines.next() {
            println!("{h}");
        }
        for (line, t) in lines.zip(&tags) {
            println!("{}", line.replacen('●', &paint_hex("●", &t.color), 1));
        }
    }
    Ok(())
}
