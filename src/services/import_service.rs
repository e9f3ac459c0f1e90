//! Domain service for spreadsheet imports.
//!
//! This is the boundary the CLI and the scheduler talk to. Each call owns
//! one entity cache for its whole run; range imports share a single cache
//! across every sheet they load.

use std::ops::RangeInclusive;
use std::sync::Arc;

use chrono::NaiveDate;
use futures::stream::BoxStream;
use sea_orm::{DbErr, SqlErr};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::broadcast;

use crate::domain::events::ImportEvent;
use crate::domain::{Board, IssueKey, Part};
use crate::import::{MigrationSummary, StreakSummary};
use crate::sheet::{CatalogRow, RankingRow, SheetError, SnapshotRow, SongAssignment};

/// Errors specific to the import process.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Validation failed:\n{}", .0.join("\n"))]
    Validation(Vec<String>),

    #[error("Integrity violation: {0}")]
    Integrity(String),

    #[error("Database error: {0}")]
    Database(DbErr),

    #[error("Sheet error: {0}")]
    Sheet(#[from] SheetError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<DbErr> for ImportError {
    fn from(err: DbErr) -> Self {
        match err.sql_err() {
            Some(
                SqlErr::UniqueConstraintViolation(message)
                | SqlErr::ForeignKeyConstraintViolation(message),
            ) => Self::Integrity(message),
            _ => Self::Database(err),
        }
    }
}

impl From<anyhow::Error> for ImportError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Outcome of one import run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    /// Fact rows written (rankings, snapshots, or catalog videos).
    pub written: usize,
    /// Rows left out because a reference did not resolve.
    pub dropped: usize,
    pub batches: usize,
}

impl ImportSummary {
    pub fn absorb(&mut self, other: Self) {
        self.written += other.written;
        self.dropped += other.dropped;
        self.batches += other.batches;
    }
}

/// Domain service trait for import operations.
#[async_trait::async_trait]
pub trait ImportService: Send + Sync {
    /// Replaces one ranking issue with the given rows.
    ///
    /// In strict mode the rows are validated first and nothing is written
    /// when any required cell is blank.
    ///
    /// # Errors
    ///
    /// - `ImportError::Validation` if strict validation fails
    /// - `ImportError::Integrity` if a write breaks a constraint
    /// - `ImportError::Database` on any other store failure
    async fn import_rankings(
        &self,
        key: IssueKey,
        rows: Vec<RankingRow>,
        strict: bool,
    ) -> Result<ImportSummary, ImportError>;

    /// Starts a ranking import in the background and returns its progress.
    ///
    /// The stream ends after `ImportFinished` or `ImportFailed`.
    fn start_ranking_import(
        self: Arc<Self>,
        key: IssueKey,
        rows: Vec<RankingRow>,
        strict: bool,
    ) -> BoxStream<'static, ImportEvent>;

    /// Imports a range of issues of one board part from the data directory,
    /// sharing one cache. Issues without a sheet file are skipped.
    ///
    /// # Errors
    ///
    /// Stops at the first failing issue; earlier issues stay imported.
    async fn import_ranking_range(
        &self,
        board: Board,
        part: Part,
        issues: RangeInclusive<i32>,
        strict: bool,
    ) -> Result<Vec<(IssueKey, ImportSummary)>, ImportError>;

    /// Replaces the snapshot counters of one date.
    ///
    /// # Errors
    ///
    /// Same as [`ImportService::import_rankings`].
    async fn import_snapshots(
        &self,
        date: NaiveDate,
        rows: Vec<SnapshotRow>,
        strict: bool,
    ) -> Result<ImportSummary, ImportError>;

    /// Imports the data sheets of every date in `from..=to`, sharing one
    /// cache. Dates without a sheet file are skipped.
    ///
    /// # Errors
    ///
    /// Stops at the first failing date; earlier dates stay imported.
    async fn import_snapshot_range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
        strict: bool,
    ) -> Result<Vec<(NaiveDate, ImportSummary)>, ImportError>;

    /// Loads the raw song catalog. Everything commits at once.
    ///
    /// # Errors
    ///
    /// Same as [`ImportService::import_rankings`].
    async fn import_catalog(
        &self,
        rows: Vec<CatalogRow>,
        strict: bool,
    ) -> Result<ImportSummary, ImportError>;

    /// Moves videos to the song named in each assignment, creating songs as
    /// needed.
    ///
    /// # Errors
    ///
    /// Returns `ImportError::Database` or `ImportError::Integrity` if the
    /// store rejects a write; nothing is kept in that case.
    async fn resolve_changed_names(
        &self,
        assignments: Vec<SongAssignment>,
    ) -> Result<MigrationSummary, ImportError>;

    /// Evaluates video streaks for `date`.
    ///
    /// # Errors
    ///
    /// Returns `ImportError::Database` if the store fails.
    async fn update_video_streaks(&self, date: NaiveDate) -> Result<StreakSummary, ImportError>;

    /// Subscribes to the progress events of every import this service runs.
    fn subscribe(&self) -> broadcast::Receiver<ImportEvent>;
}
