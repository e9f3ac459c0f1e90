use anyhow::Result;
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DatabaseTransaction, DbErr,
    Statement, TransactionTrait,
};
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub mod migrator;
pub mod repositories;

pub use repositories::artist::{ArtistRepository, ArtistRow};
pub use repositories::credit::{CreditRepository, Edge};
pub use repositories::ranking::{NewRanking, RankingOrder, RankingRepository};
pub use repositories::snapshot::{SnapshotCounters, SnapshotPoint, SnapshotRepository};
pub use repositories::song::{SongRepository, SongUpsert};
pub use repositories::video::{VideoRecord, VideoRepository, VideoWriteMode};

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        let in_memory = db_url.contains(":memory:");

        let mut opt = ConnectOptions::new(db_url.to_string());
        if in_memory {
            // Every pooled connection to `:memory:` is a separate database.
            opt.max_connections(1).min_connections(1);
        } else {
            let path_str = db_url
                .trim_start_matches("sqlite://")
                .trim_start_matches("sqlite:");
            let path_str = path_str.split('?').next().unwrap_or(path_str);
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }

            opt.max_connections(max_connections)
                .min_connections(min_connections)
                .idle_timeout(Duration::from_secs(300))
                .max_lifetime(Duration::from_secs(600));
        }
        opt.connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            if in_memory { 1 } else { min_connections },
            if in_memory { 1 } else { max_connections }
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    pub async fn begin(&self) -> Result<DatabaseTransaction, DbErr> {
        self.conn.begin().await
    }

    #[must_use]
    pub const fn artists(&self) -> ArtistRepository<'_, DatabaseConnection> {
        ArtistRepository::new(&self.conn)
    }

    #[must_use]
    pub const fn songs(&self) -> SongRepository<'_, DatabaseConnection> {
        SongRepository::new(&self.conn)
    }

    #[must_use]
    pub const fn credits(&self) -> CreditRepository<'_, DatabaseConnection> {
        CreditRepository::new(&self.conn)
    }

    #[must_use]
    pub const fn videos(&self) -> VideoRepository<'_, DatabaseConnection> {
        VideoRepository::new(&self.conn)
    }

    #[must_use]
    pub const fn snapshots(&self) -> SnapshotRepository<'_, DatabaseConnection> {
        SnapshotRepository::new(&self.conn)
    }

    #[must_use]
    pub const fn rankings(&self) -> RankingRepository<'_, DatabaseConnection> {
        RankingRepository::new(&self.conn)
    }
}
