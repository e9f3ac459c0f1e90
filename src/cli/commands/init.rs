//! Init command handler

use super::open_store;
use crate::config::Config;

pub async fn cmd_init(config: &Config) -> anyhow::Result<()> {
    if Config::create_default_if_missing()? {
        println!("✓ Config file created. Edit config.toml and run again.");
    } else {
        println!("Config file already exists, leaving it untouched.");
    }

    let store = open_store(config).await?;
    store.ping().await?;
    println!("✓ Database ready at {}", config.general.database_path);

    Ok(())
}
