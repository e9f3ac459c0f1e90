//! `SeaORM` implementation of the `ImportService` trait.

use std::ops::RangeInclusive;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use futures::StreamExt;
use futures::stream::BoxStream;
use tokio::sync::{RwLock, broadcast};
use tracing::{debug, error, info, warn};

use crate::config::{Config, ImportConfig};
use crate::db::Store;
use crate::domain::events::{ImportEvent, progress_stream};
use crate::domain::{Board, IssueKey, Part};
use crate::import::{ImportCache, MigrationSummary, Orchestrator, Progress, StreakSummary};
use crate::services::import_service::{ImportError, ImportService, ImportSummary};
use crate::sheet::{
    CatalogRow, RankingRow, SnapshotRow, SongAssignment, data_sheet_path, ranking_sheet_path,
    read_file,
};

/// Headroom for the private progress channel of a streamed import:
/// the started and terminal events plus slack.
const STREAM_EVENT_SLACK: usize = 4;

pub struct SeaOrmImportService {
    store: Store,
    config: Arc<RwLock<Config>>,
    event_bus: broadcast::Sender<ImportEvent>,
}

impl SeaOrmImportService {
    #[must_use]
    pub const fn new(
        store: Store,
        config: Arc<RwLock<Config>>,
        event_bus: broadcast::Sender<ImportEvent>,
    ) -> Self {
        Self {
            store,
            config,
            event_bus,
        }
    }

    async fn import_config(&self) -> ImportConfig {
        self.config.read().await.import.clone()
    }

    async fn data_dir(&self) -> PathBuf {
        self.config.read().await.data_dir().to_path_buf()
    }

    fn progress(&self) -> Progress {
        Progress::new(self.event_bus.clone())
    }

    async fn run_rankings(
        &self,
        key: IssueKey,
        rows: &[RankingRow],
        strict: bool,
        progress: Progress,
    ) -> Result<ImportSummary, ImportError> {
        let config = self.import_config().await;
        let mut cache = ImportCache::new();
        Orchestrator::new(&self.store, &config, progress)
            .import_rankings(&mut cache, key, rows, strict)
            .await
    }
}

#[async_trait]
impl ImportService for SeaOrmImportService {
    async fn import_rankings(
        &self,
        key: IssueKey,
        rows: Vec<RankingRow>,
        strict: bool,
    ) -> Result<ImportSummary, ImportError> {
        self.run_rankings(key, &rows, strict, self.progress()).await
    }

    fn start_ranking_import(
        self: Arc<Self>,
        key: IssueKey,
        rows: Vec<RankingRow>,
        strict: bool,
    ) -> BoxStream<'static, ImportEvent> {
        let (tx, rx) = broadcast::channel(rows.len() + STREAM_EVENT_SLACK);
        let stream = progress_stream(rx);

        tokio::spawn(async move {
            let progress = self.progress().with(tx);
            if let Err(e) = self.run_rankings(key, &rows, strict, progress).await {
                error!(event = "import_failed", issue = %key, error = %e, "Ranking import failed");
            }
        });

        stream.boxed()
    }

    async fn import_ranking_range(
        &self,
        board: Board,
        part: Part,
        issues: RangeInclusive<i32>,
        strict: bool,
    ) -> Result<Vec<(IssueKey, ImportSummary)>, ImportError> {
        let config = self.import_config().await;
        let data_dir = self.data_dir().await;
        let orchestrator = Orchestrator::new(&self.store, &config, self.progress());
        let mut cache = ImportCache::new();
        let mut results = Vec::new();
        let mut total = ImportSummary::default();

        for issue in issues {
            let key = IssueKey::new(board, part, issue);
            let Some(path) = ranking_sheet_path(&data_dir, key) else {
                warn!(issue = %key, "Issue predates the board, skipping");
                continue;
            };
            if !path.exists() {
                debug!(issue = %key, path = %path.display(), "No sheet for issue");
                continue;
            }

            let rows: Vec<RankingRow> = read_file(&path)?;
            let summary = orchestrator
                .import_rankings(&mut cache, key, &rows, strict)
                .await?;
            total.absorb(summary);
            results.push((key, summary));
        }

        info!(
            board = %board,
            part = %part,
            imported = results.len(),
            written = total.written,
            dropped = total.dropped,
            "Ranking range imported"
        );
        Ok(results)
    }

    async fn import_snapshots(
        &self,
        date: NaiveDate,
        rows: Vec<SnapshotRow>,
        strict: bool,
    ) -> Result<ImportSummary, ImportError> {
        let config = self.import_config().await;
        let mut cache = ImportCache::new();
        Orchestrator::new(&self.store, &config, self.progress())
            .import_snapshots(&mut cache, date, &rows, strict)
            .await
    }

    async fn import_snapshot_range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
        strict: bool,
    ) -> Result<Vec<(NaiveDate, ImportSummary)>, ImportError> {
        let config = self.import_config().await;
        let data_dir = self.data_dir().await;
        let orchestrator = Orchestrator::new(&self.store, &config, self.progress());
        let mut cache = ImportCache::new();
        let mut results = Vec::new();
        let mut total = ImportSummary::default();

        for date in from.iter_days().take_while(|d| *d <= to) {
            let path = data_sheet_path(&data_dir, date);
            if !path.exists() {
                debug!(date = %date, path = %path.display(), "No data sheet for date");
                continue;
            }

            let rows: Vec<SnapshotRow> = read_file(&path)?;
            let summary = orchestrator
                .import_snapshots(&mut cache, date, &rows, strict)
                .await?;
            total.absorb(summary);
            results.push((date, summary));
        }

        info!(
            from = %from,
            to = %to,
            imported = results.len(),
            written = total.written,
            dropped = total.dropped,
            "Snapshot range imported"
        );
        Ok(results)
    }

    async fn import_catalog(
        &self,
        rows: Vec<CatalogRow>,
        strict: bool,
    ) -> Result<ImportSummary, ImportError> {
        let config = self.import_config().await;
        let mut cache = ImportCache::new();
        Orchestrator::new(&self.store, &config, self.progress())
            .import_catalog(&mut cache, &rows, strict)
            .await
    }

    async fn resolve_changed_names(
        &self,
        assignments: Vec<SongAssignment>,
    ) -> Result<MigrationSummary, ImportError> {
        let txn = self.store.begin().await?;
        let mut cache = ImportCache::new();
        let summary =
            crate::import::resolve_changed_names(&txn, &mut cache, &assignments).await?;
        txn.commit().await?;

        info!(
            event = "song_names_resolved",
            created_songs = summary.created_songs,
            updated_videos = summary.updated_videos,
            "Resolved changed song names"
        );
        Ok(summary)
    }

    async fn update_video_streaks(&self, date: NaiveDate) -> Result<StreakSummary, ImportError> {
        let thresholds = self.config.read().await.import.streak;
        let txn = self.store.begin().await?;
        let summary = crate::import::update_video_streaks(&txn, date, thresholds).await?;
        txn.commit().await?;

        metrics::counter!(crate::constants::metrics::STREAK_UPDATED_TOTAL)
            .increment(summary.evaluated as u64);
        Ok(summary)
    }

    fn subscribe(&self) -> broadcast::Receiver<ImportEvent> {
        self.event_bus.subscribe()
    }
}
