use crate::api::ClockApi;
use crate::cli::parser::{Commands, SessionCmd};
use crate::config::Config;
use crate::core::{JobPicker, SessionChange};
use crate::errors::AppResult;
use crate::models::Session;
use crate::ui::messages::{detail, info, success};
use crate::utils::time::{format_hms, format_local};

use super::{CliSession, audit, session_tracker};

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    let Commands::Session { action } = cmd else {
        return Ok(());
    };
    let mut tracker = session_tracker(cfg)?;

    match action {
        SessionCmd::Name { name, clear } => performer_name(&tracker, name.as_deref(), *clear),
        SessionCmd::Start { role, code, tags } => {
            tracker.refresh()?;
            start(&mut tracker, *role, *code, tags)
        }
        SessionCmd::Stop => {
            tracker.refresh()?;
            let closed = tracker.stop()?;
            audit(tracker.store(), "session_stop", &closed.id.to_string(), &closed.role_label());
            success(format!(
                "Stopped {} after {}",
                closed.role_label(),
                format_hms(closed.duration_seconds as i64)
            ));
            Ok(())
        }
        SessionCmd::Status => {
            tracker.refresh()?;
            match tracker.active() {
                Some(s) => print_session(s, tracker.elapsed_seconds().unwrap_or(0)),
                None => info("No session running. Pick a role with `rtimeclock session start --role <ID>`."),
            }
            Ok(())
        }
        SessionCmd::Tag { tag_id } => {
            tracker.refresh()?;
            let ids = tracker.update_tag(*tag_id)?;
            success(format!("{} tag(s) on the running session", ids.len()));
            Ok(())
        }
    }
}

fn performer_name(tracker: &CliSession, name: Option<&str>, clear: bool) -> AppResult<()> {
    if clear {
        tracker.set_performer_name("")?;
        success("Performer name cleared.");
    } else if let Some(n) = name {
        tracker.set_performer_name(n)?;
        match tracker.performer_name()? {
            Some(saved) => success(format!("Performer name set to '{saved}'")),
            None => success("Performer name cleared."),
        }
    } else {
        match tracker.performer_name()? {
            Some(n) => info(format!("Performer name: {n}")),
            None => info("No performer name set."),
        }
    }
    Ok(())
}

fn start(tracker: &mut CliSession, role: i64, code: Option<i64>, tags: &[i64]) -> AppResult<()> {
    let mut picker = JobPicker::new(tracker.api().job_categories()?);
    let selection = picker.select(role, code)?;

    match tracker.select_role(&selection, tags)? {
        SessionChange::Started(s) => {
            audit(tracker.store(), "session_start", &s.id.to_string(), &s.role_label());
            success(format!("Started {}", s.role_label()));
        }
        SessionChange::Switched { ended, session } => {
            audit(
                tracker.store(),
                "session_start",
                &session.id.to_string(),
                &format!("switched from {} session(s)", ended.len()),
            );
            for e in &ended {
                info(format!(
                    "Ended {} ({})",
                    e.role_label(),
                    format_hms(e.duration_seconds as i64)
                ));
            }
            success(format!("Switched to {}", session.role_label()));
        }
    }
    Ok(())
}

fn print_session(s: &Session, elapsed: i64) {
    success(format!("{} [{}]", s.role_label(), format_hms(elapsed)));
    detail("Started", format_local(s.start_time));
    if let Some(name) = s.employee_name.as_deref().filter(|n| !n.is_empty()) {
        detail("Performer", name);
    }
    if !s.activity_tags.is_empty() {
        let names: Vec<&str> = s.activity_tags.iter().map(|t| t.name.as_str()).collect();
        detail("Tags", names.join(", "));
    }
}
