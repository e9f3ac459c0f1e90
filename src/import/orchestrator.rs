//! Drives one import run: validation, the scoped delete, the per-batch
//! stages and the commit policy.

use chrono::NaiveDate;
use sea_orm::{DatabaseTransaction, DbErr};
use tokio::sync::broadcast;
use tracing::{info, warn};

use super::artists::upsert_artists;
use super::cache::{CacheSubset, ImportCache};
use super::migration::resolve_changed_names;
use super::relations::{insert_missing_credits, replace_credits};
use super::songs::upsert_songs;
use super::videos::{last_per_video, upsert_videos};
use crate::config::{CommitPolicy, CreditMode, ImportConfig};
use crate::constants::metrics as metric_names;
use crate::db::{
    NewRanking, RankingRepository, SnapshotCounters, SnapshotRepository, Store, VideoWriteMode,
};
use crate::domain::events::ImportEvent;
use crate::domain::{IssueKey, Part};
use crate::services::import_service::{ImportError, ImportSummary};
use crate::sheet::validate::{CATALOG_REQUIRED, SNAPSHOT_REQUIRED, ranking_required};
use crate::sheet::{CatalogRow, Column, RankingRow, SheetRow, SnapshotRow, SongAssignment, validate};

/// Fan-out of progress events to every interested bus.
#[derive(Clone, Default)]
pub struct Progress {
    senders: Vec<broadcast::Sender<ImportEvent>>,
}

impl Progress {
    #[must_use]
    pub fn new(bus: broadcast::Sender<ImportEvent>) -> Self {
        Self { senders: vec![bus] }
    }

    #[must_use]
    pub fn with(mut self, bus: broadcast::Sender<ImportEvent>) -> Self {
        self.senders.push(bus);
        self
    }

    pub fn emit(&self, event: &ImportEvent) {
        for tx in &self.senders {
            // No subscribers is fine.
            let _ = tx.send(event.clone());
        }
    }
}

/// Transaction bookkeeping for a batched run. Per-batch policy commits at
/// every batch boundary; single policy keeps one transaction open until
/// [`Batches::finish`].
struct Batches<'s> {
    store: &'s Store,
    policy: CommitPolicy,
    open: Option<DatabaseTransaction>,
}

impl<'s> Batches<'s> {
    const fn new(store: &'s Store, policy: CommitPolicy) -> Self {
        Self {
            store,
            policy,
            open: None,
        }
    }

    async fn txn(&mut self) -> Result<&DatabaseTransaction, DbErr> {
        let txn = match self.open.take() {
            Some(txn) => txn,
            None => self.store.begin().await?,
        };
        Ok(&*self.open.insert(txn))
    }

    async fn end_batch(&mut self) -> Result<(), DbErr> {
        if self.policy == CommitPolicy::PerBatch
            && let Some(txn) = self.open.take()
        {
            txn.commit().await?;
        }
        Ok(())
    }

    async fn finish(mut self) -> Result<(), DbErr> {
        if let Some(txn) = self.open.take() {
            txn.commit().await?;
        }
        Ok(())
    }
}

fn record_batch(kind: &'static str, written: usize) {
    metrics::counter!(metric_names::BATCHES_TOTAL, "kind" => kind).increment(1);
    metrics::counter!(metric_names::ROWS_TOTAL, "kind" => kind).increment(written as u64);
}

fn check<R: SheetRow>(rows: &[R], required: &[Column]) -> Result<(), ImportError> {
    let errors = validate(rows, required);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ImportError::Validation(errors))
    }
}

pub struct Orchestrator<'a> {
    store: &'a Store,
    config: &'a ImportConfig,
    progress: Progress,
}

impl<'a> Orchestrator<'a> {
    #[must_use]
    pub const fn new(store: &'a Store, config: &'a ImportConfig, progress: Progress) -> Self {
        Self {
            store,
            config,
            progress,
        }
    }

    fn batch_size(&self) -> usize {
        self.config.batch_size.max(1)
    }

    /// Emits the terminal event for `result`. A failed run may have merged
    /// ids from rolled-back writes, so the cache is dropped.
    fn conclude(&self, cache: &mut ImportCache, result: &Result<ImportSummary, ImportError>) {
        match result {
            Ok(summary) => self.progress.emit(&ImportEvent::ImportFinished {
                written: summary.written,
                dropped: summary.dropped,
            }),
            Err(e) => {
                *cache = ImportCache::new();
                self.progress.emit(&ImportEvent::ImportFailed {
                    message: e.to_string(),
                });
            }
        }
    }

    /// Replaces the rows of one ranking issue.
    pub async fn import_rankings(
        &self,
        cache: &mut ImportCache,
        key: IssueKey,
        rows: &[RankingRow],
        strict: bool,
    ) -> Result<ImportSummary, ImportError> {
        let result = self.run_rankings(cache, key, rows, strict).await;
        self.conclude(cache, &result);
        result
    }

    async fn run_rankings(
        &self,
        cache: &mut ImportCache,
        key: IssueKey,
        rows: &[RankingRow],
        strict: bool,
    ) -> Result<ImportSummary, ImportError> {
        if strict {
            check(rows, ranking_required(key.part))?;
        }

        let total = rows.len();
        self.progress.emit(&ImportEvent::RankingImportStarted {
            board: key.board,
            part: key.part,
            issue: key.issue,
            total,
        });

        let mut batches = Batches::new(self.store, self.config.commit_policy);
        let txn = batches.txn().await?;
        cache.ensure_loaded(txn, &CacheSubset::ALL).await?;
        let deleted = RankingRepository::new(txn).delete_issue(key).await?;
        info!(issue = %key, deleted = deleted, rows = total, "Importing ranking issue");

        let mut summary = ImportSummary::default();
        let mut processed = 0;
        for batch in rows.chunks(self.batch_size()) {
            let txn = batches.txn().await?;
            let (written, dropped) = match key.part {
                Part::Main => self.main_ranking_batch(txn, cache, key, batch, strict).await?,
                Part::New => self.new_ranking_batch(txn, cache, key, batch).await?,
            };
            batches.end_batch().await?;

            processed += batch.len();
            summary.written += written;
            summary.dropped += dropped;
            summary.batches += 1;
            record_batch("ranking", written);
            self.progress
                .emit(&ImportEvent::BatchCommitted { processed, total });
        }
        batches.finish().await?;

        info!(
            event = "ranking_imported",
            issue = %key,
            written = summary.written,
            dropped = summary.dropped,
            "Ranking issue imported"
        );
        Ok(summary)
    }

    async fn main_ranking_batch(
        &self,
        txn: &DatabaseTransaction,
        cache: &mut ImportCache,
        key: IssueKey,
        batch: &[RankingRow],
        strict: bool,
    ) -> Result<(usize, usize), ImportError> {
        upsert_artists(txn, cache, batch).await?;
        let new_songs = upsert_songs(txn, cache, batch).await?;
        match self.config.credit_mode_for(key.board) {
            CreditMode::InsertOnly => {
                insert_missing_credits(txn, cache, batch, &new_songs, strict).await?;
            }
            CreditMode::Replace => {
                replace_credits(txn, cache, batch, strict).await?;
            }
        }

        if self.config.migrate_song_names {
            let assignments: Vec<SongAssignment> =
                batch.iter().filter_map(SongAssignment::from_row).collect();
            resolve_changed_names(txn, cache, &assignments).await?;
        }

        upsert_videos(txn, cache, batch, VideoWriteMode::InsertOnly).await?;
        self.write_rankings(txn, cache, key, batch).await
    }

    async fn new_ranking_batch(
        &self,
        txn: &DatabaseTransaction,
        cache: &mut ImportCache,
        key: IssueKey,
        batch: &[RankingRow],
    ) -> Result<(usize, usize), ImportError> {
        upsert_songs(txn, cache, batch).await?;
        upsert_videos(txn, cache, batch, VideoWriteMode::InsertOnly).await?;
        self.write_rankings(txn, cache, key, batch).await
    }

    async fn write_rankings(
        &self,
        txn: &DatabaseTransaction,
        cache: &ImportCache,
        key: IssueKey,
        batch: &[RankingRow],
    ) -> Result<(usize, usize), ImportError> {
        let mut entries = Vec::with_capacity(batch.len());
        let mut dropped = 0;

        for row in batch {
            let Some(song_id) = cache.video_song_id(&row.video.bvid) else {
                dropped += 1;
                warn!(issue = %key, bvid = %row.video.bvid, line = row.line, "Ranked video is unknown, skipping");
                continue;
            };
            entries.push(NewRanking {
                key,
                rank: row.rank,
                song_id,
                bvid: row.video.bvid.clone(),
                count: if key.part == Part::Main { row.count } else { None },
                point: row.point,
                view: row.view,
                favorite: row.favorite,
                coin: row.coin,
                like: row.like,
                view_rank: row.view_rank,
                favorite_rank: row.favorite_rank,
                coin_rank: row.coin_rank,
                like_rank: row.like_rank,
            });
        }

        if dropped > 0 {
            metrics::counter!(
                metric_names::ROWS_DROPPED_TOTAL,
                "kind" => "ranking",
                "reason" => "unresolved_video"
            )
            .increment(dropped as u64);
        }

        let written = entries.len();
        if written > 0 {
            RankingRepository::new(txn).insert(entries).await?;
        }
        Ok((written, dropped))
    }

    /// Replaces the snapshot counters of one date.
    pub async fn import_snapshots(
        &self,
        cache: &mut ImportCache,
        date: NaiveDate,
        rows: &[SnapshotRow],
        strict: bool,
    ) -> Result<ImportSummary, ImportError> {
        let result = self.run_snapshots(cache, date, rows, strict).await;
        self.conclude(cache, &result);
        result
    }

    async fn run_snapshots(
        &self,
        cache: &mut ImportCache,
        date: NaiveDate,
        rows: &[SnapshotRow],
        strict: bool,
    ) -> Result<ImportSummary, ImportError> {
        if strict {
            check(rows, SNAPSHOT_REQUIRED)?;
        }

        let total = rows.len();
        self.progress
            .emit(&ImportEvent::SnapshotImportStarted { date, total });

        let mut batches = Batches::new(self.store, self.config.commit_policy);
        let txn = batches.txn().await?;
        cache.ensure_loaded(txn, &CacheSubset::ALL).await?;
        let deleted = SnapshotRepository::new(txn).delete_date(date).await?;
        info!(date = %date, deleted = deleted, rows = total, "Importing snapshots");

        let mut summary = ImportSummary::default();
        let mut processed = 0;
        for batch in rows.chunks(self.batch_size()) {
            let txn = batches.txn().await?;
            upsert_videos(txn, cache, batch, VideoWriteMode::InsertOnly).await?;

            let mut counters = Vec::with_capacity(batch.len());
            let mut dropped = 0;
            for row in last_per_video(batch) {
                if !cache.has_video(&row.video.bvid) {
                    dropped += 1;
                    continue;
                }
                counters.push(SnapshotCounters {
                    bvid: row.video.bvid.clone(),
                    date,
                    view: row.view,
                    favorite: row.favorite,
                    coin: row.coin,
                    like: row.like,
                });
            }
            let written = counters.len();
            if written > 0 {
                SnapshotRepository::new(txn).upsert(counters).await?;
            }
            batches.end_batch().await?;

            processed += batch.len();
            summary.written += written;
            summary.dropped += dropped;
            summary.batches += 1;
            record_batch("snapshot", written);
            self.progress
                .emit(&ImportEvent::BatchCommitted { processed, total });
        }
        batches.finish().await?;

        info!(
            event = "snapshots_imported",
            date = %date,
            written = summary.written,
            dropped = summary.dropped,
            "Snapshots imported"
        );
        Ok(summary)
    }

    /// Loads the catalog. The whole run is one transaction regardless of
    /// the configured commit policy.
    pub async fn import_catalog(
        &self,
        cache: &mut ImportCache,
        rows: &[CatalogRow],
        strict: bool,
    ) -> Result<ImportSummary, ImportError> {
        let result = self.run_catalog(cache, rows, strict).await;
        self.conclude(cache, &result);
        result
    }

    async fn run_catalog(
        &self,
        cache: &mut ImportCache,
        rows: &[CatalogRow],
        strict: bool,
    ) -> Result<ImportSummary, ImportError> {
        if strict {
            check(rows, CATALOG_REQUIRED)?;
        }

        let total = rows.len();
        self.progress
            .emit(&ImportEvent::CatalogImportStarted { total });

        let mut batches = Batches::new(self.store, CommitPolicy::Single);
        let txn = batches.txn().await?;
        cache.ensure_loaded(txn, &CacheSubset::ALL).await?;

        let mut summary = ImportSummary::default();
        let mut processed = 0;
        for batch in rows.chunks(self.batch_size()) {
            let txn = batches.txn().await?;
            upsert_artists(txn, cache, batch).await?;
            let new_songs = upsert_songs(txn, cache, batch).await?;
            insert_missing_credits(txn, cache, batch, &new_songs, strict).await?;
            let videos = upsert_videos(txn, cache, batch, VideoWriteMode::Update).await?;

            processed += batch.len();
            summary.written += videos.written;
            summary.dropped += videos.dropped;
            summary.batches += 1;
            record_batch("catalog", videos.written);
            self.progress
                .emit(&ImportEvent::BatchCommitted { processed, total });
        }
        batches.finish().await?;

        info!(
            event = "catalog_imported",
            written = summary.written,
            dropped = summary.dropped,
            "Catalog imported"
        );
        Ok(summary)
    }
}
