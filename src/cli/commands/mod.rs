mod import;
mod init;
mod query;

use std::sync::Arc;

use tokio::sync::{RwLock, broadcast};

use crate::config::Config;
use crate::db::Store;
use crate::services::SeaOrmImportService;

pub use import::{
    cmd_import_catalog, cmd_import_ranking, cmd_import_snapshots, cmd_resolve_names,
    cmd_update_streaks,
};
pub use init::cmd_init;
pub use query::{cmd_ranking, cmd_song};

async fn open_store(config: &Config) -> anyhow::Result<Store> {
    Store::with_pool_options(
        &config.general.database_path,
        config.general.max_db_connections,
        config.general.min_db_connections,
    )
    .await
}

fn import_service(store: Store, config: &Config) -> Arc<SeaOrmImportService> {
    let (event_bus, _) = broadcast::channel(config.general.event_bus_buffer_size.max(1));
    Arc::new(SeaOrmImportService::new(
        store,
        Arc::new(RwLock::new(config.clone())),
        event_bus,
    ))
}
