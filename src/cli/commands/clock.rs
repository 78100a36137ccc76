use crate::api::ClockApi;
use crate::cli::parser::{Commands, JobArgs};
use crate::config::Config;
use crate::core::JobPicker;
use crate::core::photos::PhotoBatch;
use crate::errors::AppResult;
use crate::models::JobSelection;
use crate::ui::messages::{error, info, success, warning};
use crate::utils::table::{Column, Table};

use super::{CliClock, audit, clock_machine, http_api, status};

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    match cmd {
        Commands::Jobs => jobs(cfg),
        Commands::Start {
            job,
            description,
            photos,
            caption,
        } => start(cfg, job, description.as_deref(), photos, caption.as_deref()),
        Commands::Stop => stop(cfg),
        Commands::Switch { job } => switch(cfg, job),
        Commands::Interrupt { job, reason } => interrupt(cfg, job, reason),
        Commands::Resume => resume(cfg),
        Commands::Tag { tag_id } => tag(cfg, *tag_id),
        _ => Ok(()),
    }
}

fn jobs(cfg: &Config) -> AppResult<()> {
    let picker = JobPicker::new(http_api(cfg)?.job_categories()?);
    if picker.categories().is_empty() {
        info("No job categories defined.");
        return Ok(());
    }

    let mut table = Table::new(vec![
        Column::new("Category", 10),
        Column::new("Code", 8),
        Column::new("Name", 30),
    ]);
    for c in picker.categories() {
        table.add_row(vec![c.id.to_string(), String::new(), c.name.clone()]);
        for jc in &c.job_codes {
            table.add_row(vec![
                String::new(),
                jc.id.to_string(),
                format!("  {}", jc.name),
            ]);
        }
    }
    print!("{}", table.render());
    Ok(())
}

fn resolve_job(machine: &CliClock, job: &JobArgs) -> AppResult<JobSelection> {
    let mut picker = JobPicker::new(machine.api().job_categories()?);
    picker.select(job.category, job.code)
}

fn start(
    cfg: &Config,
    job: &JobArgs,
    description: Option<&str>,
    photos: &[String],
    caption: Option<&str>,
) -> AppResult<()> {
    // Photos are checked before anything is sent.
    let batch = PhotoBatch::from_paths(photos)?;

    let mut machine = clock_machine(cfg)?;
    let selection = resolve_job(&machine, job)?;
    let outcome = machine.start_job(&selection, description, &batch, caption)?;

    audit(
        machine.store(),
        "clock_in",
        &outcome.entry.id.to_string(),
        &selection.display_name(),
    );
    success(format!("Clocked in on {}", selection.display_name()));

    for p in &outcome.photos {
        match &p.result {
            Ok(_) => info(format!("Photo uploaded: {}", p.file_name)),
            Err(e) => error(format!("Photo '{}' failed: {e}", p.file_name)),
        }
    }
    let failed = outcome.photos.iter().filter(|p| !p.is_ok()).count();
    if failed > 0 {
        warning(format!(
            "{failed} photo(s) failed; the entry was created. Retry with `rtimeclock photo add {}`.",
            outcome.entry.id
        ));
    }
    Ok(())
}

fn stop(cfg: &Config) -> AppResult<()> {
    let mut machine = clock_machine(cfg)?;
    let closed = machine.stop()?;

    audit(
        machine.store(),
        "clock_out",
        &closed.id.to_string(),
        &closed.job_display_name,
    );
    success(format!("Clocked out of {}", closed.job_display_name));
    status::print_state(&machine.state(), machine.elapsed_seconds());
    Ok(())
}

fn switch(cfg: &Config, job: &JobArgs) -> AppResult<()> {
    let mut machine = clock_machine(cfg)?;
    let selection = resolve_job(&machine, job)?;
    let entry = machine.switch_job(&selection)?;

    audit(machine.store(), "switch", &entry.id.to_string(), &selection.display_name());
    success(format!("Switched to {}", selection.display_name()));
    Ok(())
}

fn interrupt(cfg: &Config, job: &JobArgs, reason: &str) -> AppResult<()> {
    let mut machine = clock_machine(cfg)?;
    let selection = resolve_job(&machine, job)?;
    machine.start_interruption(&selection, reason)?;

    let state = machine.state();
    if let Some(e) = state.entry() {
        audit(machine.store(), "interrupt", &e.id.to_string(), reason.trim());
    }
    success(format!("Interruption started on {}", selection.display_name()));
    status::print_state(&state, machine.elapsed_seconds());
    Ok(())
}

fn resume(cfg: &Config) -> AppResult<()> {
    let mut machine = clock_machine(cfg)?;
    let resp = machine.stop_interruption()?;

    audit(
        machine.store(),
        "resume",
        &resp.closed_interruption.id.to_string(),
        &resp
            .resumed_entry
            .as_ref()
            .map(|e| format!("resumed {}", e.id))
            .unwrap_or_else(|| "nothing to resume".into()),
    );
    match &resp.resumed_entry {
        Some(e) => success(format!("Interruption ended; back on {}", e.job_display_name)),
        None => success("Interruption ended."),
    }
    status::print_state(&machine.state(), machine.elapsed_seconds());
    Ok(())
}

fn tag(cfg: &Config, tag_id: i64) -> AppResult<()> {
    let mut machine = clock_machine(cfg)?;
    let ids = machine.update_tag(tag_id)?;
    let names: Vec<String> = machine
        .current_entry()
        .map(|e| {
            e.activity_tags
                .iter()
                .filter(|t| ids.contains(&t.id))
                .map(|t| t.name.clone())
                .collect()
        })
        .unwrap_or_default();

    if names.is_empty() {
        success("No tags on the running entry.");
    } else {
        success(format!("Tags: {}", names.join(", ")));
    }
    Ok(())
}
