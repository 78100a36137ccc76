use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::insights::{
    InsightsReport, bar_width, busiest_hour, fetch_report, hour_grid, max_hours, resolve_filters,
    tag_share,
};
use crate::errors::{AppError, AppResult};
use crate::ui::messages::{header, info};
use crate::utils::colors::paint_hex;
use crate::utils::date::{parse_date, today};
use chrono::NaiveDate;

use super::http_api;

const BAR_WIDTH: usize = 30;

fn date_arg(value: Option<&str>) -> AppResult<Option<NaiveDate>> {
    value
        .map(|s| {
            parse_date(s).ok_or_else(|| {
                AppError::Validation(format!("Invalid date '{s}' (expected YYYY-MM-DD)"))
            })
        })
        .transpose()
}

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Insights { from, to, role } = cmd {
        let filters = resolve_filters(
            today(),
            date_arg(from.as_deref())?,
            date_arg(to.as_deref())?,
            *role,
        )?;
        let report = fetch_report(&http_api(cfg)?, &filters)?;
        print_report(&report);
    }
    Ok(())
}

fn print_report(r: &InsightsReport) {
    header(format!(
        "Insights {} → {}",
        r.filters.start_date, r.filters.end_date
    ));

    println!("Hours by role");
    let rows = &r.role_hours.role_hours;
    if rows.is_empty() {
        info("No sessions in this period");
    } else {
        let max = max_hours(rows);
        let label_w = rows.iter().map(|h| h.role_name.len()).max().unwrap_or(0);
        let bar_w = BAR_WIDTH;
        for h in rows {
            println!(
                "  {:<label_w$}  {:<bar_w$}  {:.1}h",
                h.role_name,
                "█".repeat(bar_width(h.total_hours, max, BAR_WIDTH)),
                h.total_hours
            );
        }
    }

    println!("\nActivity tags");
    let t = &r.tags;
    if t.total_sessions == 0 {
        info("No sessions in this period");
    } else {
        println!(
            "  {} total sessions, {} without tags",
            t.total_sessions, t.sessions_without_tags
        );
        for tag in &t.tag_distribution {
            println!(
                "  {} {:<20} {:>4}  ({:.0}%)",
                paint_hex("●", &tag.color),
                tag.name,
                tag.session_count,
                tag_share(tag.session_count, t.total_sessions)
            );
        }
    }

    println!("\nWhen sessions start");
    let p = &r.patterns;
    if p.hour_distribution.is_empty() {
        info("No data for this period");
        return;
    }
    let grid = hour_grid(p);
    let peak = grid.iter().copied().max().unwrap_or(0);
    let cells: Vec<String> = grid
        .iter()
        .enumerate()
        .map(|(hour, &count)| {
            let shade = match bar_width(count as f64, peak as f64, 4) {
                0 => ' ',
                1 => '░',
                2 => '▒',
                3 => '▓',
                _ => '█',
            };
            format!("{hour:02}{shade}")
        })
        .collect();
    println!("  {}", cells.join(" "));
    if let Some(h) = busiest_hour(p) {
        println!("  Busiest hour: {h:02}:00");
    }
    for d in &p.day_distribution {
        println!("  {:<10} {}", d.day, d.count);
    }
}
