//! Config and database bootstrap commands

use crate::config::Config;
use crate::db::Store;

pub fn cmd_init() -> anyhow::Result<()> {
    if Config::create_default_if_missing()? {
        println!("✓ Config file created. Edit config.toml and run again.");
    } else {
        println!("config.toml already exists, leaving it untouched.");
    }
    Ok(())
}

pub async fn cmd_migrate(config: &Config) -> anyhow::Result<()> {
    Store::migrate(&config.general.database_path).await?;
    println!("✓ Database is up to date: {}", config.general.database_path);
    Ok(())
}
