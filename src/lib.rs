//! rTimeclock library root.
//! Exposes the CLI parser, the high-level run() function and the clock
//! state machines behind it.

pub mod api;
pub mod cli;
pub mod config;
pub mod core;
pub mod errors;
pub mod export;
pub mod models;
pub mod store;
pub mod ui;
pub mod utils;

use clap::Parser;
use cli::parser::{Cli, Commands};
use config::Config;
use errors::AppResult;
use tracing_subscriber::EnvFilter;
use utils::path::expand_tilde;

/// Central command dispatcher
pub fn dispatch(cli: &Cli, cfg: &Config) -> AppResult<()> {
    use cli::commands as cmd;

    match &cli.command {
        Commands::Init => cmd::init::handle(cli),
        Commands::Config { .. } => cmd::config::handle(&cli.command, cfg),
        Commands::Log { .. } => cmd::log::handle(&cli.command, cfg),
        Commands::Employees
        | Commands::Select { .. }
        | Commands::Login { .. }
        | Commands::Logout => cmd::employees::handle(&cli.command, cfg),
        Commands::Status | Commands::Watch { .. } => cmd::status::handle(&cli.command, cfg),
        Commands::Jobs
        | Commands::Start { .. }
        | Commands::Stop
        | Commands::Switch { .. }
        | Commands::Interrupt { .. }
        | Commands::Resume
        | Commands::Tag { .. } => cmd::clock::handle(&cli.command, cfg),
        Commands::Session { .. } => cmd::session::handle(&cli.command, cfg),
        Commands::Tags { .. } => cmd::tags::handle(&cli.command, cfg),
        Commands::Photo { .. } => cmd::photo::handle(&cli.command, cfg),
        Commands::Insights { .. } => cmd::insights::handle(&cli.command, cfg),
        Commands::Entries { .. } => cmd::entries::handle(&cli.command, cfg),
        Commands::Admin { .. } => cmd::admin::handle(&cli.command, cfg),
    }
}

/// Diagnostics go to stderr; `RUST_LOG` overrides the default level.
fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("rtimeclock=warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Entry point used by main.rs
pub fn run() -> AppResult<()> {
    init_tracing();

    let cli = Cli::parse();

    let mut cfg = Config::load();

    if let Some(custom_store) = &cli.store {
        cfg.store = expand_tilde(custom_store).to_string_lossy().to_string();
    }
    if let Some(api) = &cli.api {
        cfg.api_override = Some(api.clone());
    }

    dispatch(&cli, &cfg)
}
