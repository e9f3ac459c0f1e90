//! Progress events emitted while an import runs.
//!
//! Events go out on a broadcast bus owned by the import service. Callers that
//! want a stream (the routing layer, the CLI) subscribe and wrap the receiver
//! with [`progress_stream`].

use chrono::NaiveDate;
use futures::stream::{self, Stream};
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::warn;

use crate::domain::{Board, Part};

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum ImportEvent {
    RankingImportStarted {
        board: Board,
        part: Part,
        issue: i32,
        total: usize,
    },
    SnapshotImportStarted {
        date: NaiveDate,
        total: usize,
    },
    CatalogImportStarted {
        total: usize,
    },
    BatchCommitted {
        processed: usize,
        total: usize,
    },
    ImportFinished {
        written: usize,
        dropped: usize,
    },
    ImportFailed {
        message: String,
    },
}

impl ImportEvent {
    /// Whether no further events follow this one for the current import.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::ImportFinished { .. } | Self::ImportFailed { .. })
    }
}

/// Adapts a bus subscription into a stream that ends after the first
/// terminal event or when the bus closes.
pub fn progress_stream(rx: broadcast::Receiver<ImportEvent>) -> impl Stream<Item = ImportEvent> {
    stream::unfold((rx, false), |(mut rx, done)| async move {
        if done {
            return None;
        }
        loop {
            match rx.recv().await {
                Ok(event) => {
                    let terminal = event.is_terminal();
                    return Some((event, (rx, terminal)));
                }
                Err(broadcast::error::RecvError::Lagged(count)) => {
                    warn!("Progress subscriber lagged by {} events", count);
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    })
}
