use crate::cli::parser::Cli;
use crate::config::Config;
use crate::errors::AppResult;
use crate::store::SqliteStore;

use super::audit;

/// Handle the `init` command
///
/// Creates the config directory, the configuration file (skipped with
/// `--test`) and the local store with its tables.
pub fn handle(cli: &Cli) -> AppResult<()> {
    let cfg = Config::init_all(cli.store.clone(), cli.test)?;

    println!("⚙️  Initializing rTimeclock…");
    if !cli.test {
        println!("📄 Config file : {}", Config::config_file().display());
    }
    println!("🗄️  Store       : {}", &cfg.store);

    let store = SqliteStore::open(&cfg.store)?;
    audit(
        &store,
        "init",
        "Store initialized",
        &format!("Store initialized at {}", &cfg.store),
    );

    println!("🎉 rTimeclock initialization completed!");
    Ok(())
}
