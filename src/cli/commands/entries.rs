use crate::api::{EntryFilters, ReportApi};
use crate::cli::parser::{Commands, EntriesCmd, EntryFilterArgs};
use crate::config::Config;
use crate::core::entries::{build_update, parse_filters, total_seconds};
use crate::errors::AppResult;
use crate::export::export_entries;
use crate::ui::messages::{info, success};
use crate::utils::table::{Column, Table};
use crate::utils::time::{format_duration_long, format_local};
use std::path::Path;

use super::{audit, http_api, open_store};

fn filters(args: &EntryFilterArgs) -> AppResult<EntryFilters> {
    parse_filters(
        args.employee,
        args.category,
        args.from.as_deref(),
        args.to.as_deref(),
    )
}

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    let Commands::Entries { action } = cmd else {
        return Ok(());
    };

    match action {
        EntriesCmd::List { filters: args } => {
            let f = filters(args)?;
            let entries = http_api(cfg)?.time_entries(&f)?;
            if entries.is_empty() {
                info("No time entries match the filters.");
                return Ok(());
            }

            let mut table = Table::new(vec![
                Column::new("ID", 6),
                Column::new("Employee", 20),
                Column::new("Job", 28),
                Column::new("Start", 16),
                Column::new("End", 16),
                Column::new("Duration", 12),
            ]);
            for e in &entries {
                let end = e.end_time.map(format_local).unwrap_or_else(|| "-".into());
                table.add_row(vec![
                    e.id.to_string(),
                    e.employee_name.clone().unwrap_or_default(),
                    if e.is_interruption {
                        format!("⏸ {}", e.job_display_name)
                    } else {
                        e.job_display_name.clone()
                    },
                    format_local(e.start_time),
                    end,
                    format_duration_long(e.duration_seconds),
                ]);
            }
            print!("{}", table.render());
            info(format!(
                "{} entries, total {}",
                entries.len(),
                format_duration_long(total_seconds(&entries))
            ));
            Ok(())
        }
        EntriesCmd::Export {
            filters: args,
            format,
            file,
            force,
        } => {
            let f = filters(args)?;
            let entries = http_api(cfg)?.time_entries(&f)?;
            let n = export_entries(&entries, *format, Path::new(file), *force)?;
            audit(
                &open_store(cfg)?,
                "export",
                format.as_str(),
                &format!("{n} entries to {file}"),
            );
            Ok(())
        }
        EntriesCmd::Edit {
            id,
            start,
            end,
            description,
        } => {
            if start.is_none() && end.is_none() && description.is_none() {
                // Rejected locally, before fetching anything.
                build_update(None, None, None, None)?;
            }
            let api = http_api(cfg)?;
            let current = api.time_entry(*id)?;
            let update = build_update(
                Some(&current),
                start.as_deref(),
                end.as_deref(),
                description.as_deref(),
            )?;
            let updated = api.update_time_entry(*id, &update)?;

            audit(&open_store(cfg)?, "entry_edit", &id.to_string(), &updated.job_display_name);
            success(format!(
                "Entry {} updated ({})",
                updated.id,
                format_duration_long(updated.duration_seconds)
            ));
            Ok(())
        }
        EntriesCmd::Delete { id } => {
            http_api(cfg)?.delete_time_entry(*id)?;
            audit(&open_store(cfg)?, "entry_delete", &id.to_string(), "deleted");
            success(format!("Entry {id} deleted"));
            Ok(())
        }
    }
}
