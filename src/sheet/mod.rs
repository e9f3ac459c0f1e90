//! Tabular row source: CSV exports of the ranking and data spreadsheets.
//!
//! Every cell is read as text first. Text columns stay strings, counters
//! must parse, and publish dates degrade to `None` when unparseable.

pub mod cells;
pub mod naming;
pub mod reader;
pub mod rows;
pub mod validate;

use std::path::PathBuf;

pub use cells::{format_duration, join_names, split_names};
pub use naming::{SheetIdentity, data_sheet_path, identify_sheet, ranking_sheet_path};
pub use reader::{FromRecord, read_file, read_rows};
pub use rows::{CatalogRow, Column, RankingRow, SheetRow, SnapshotRow, SongAssignment};
pub use validate::validate;

#[derive(Debug, thiserror::Error)]
pub enum SheetError {
    #[error("Failed to open sheet {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Missing column '{0}'")]
    MissingColumn(&'static str),

    #[error("row {row}: column '{column}' {message}")]
    Cell {
        row: usize,
        column: &'static str,
        message: String,
    },
}
