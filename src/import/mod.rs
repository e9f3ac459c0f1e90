//! The reconciliation engine.
//!
//! Each stage reads sheet rows, resolves names through the [`ImportCache`],
//! writes the delta and merges the new ids back into the cache. The
//! [`Orchestrator`] runs the stages batch by batch inside transactions.

pub mod artists;
pub mod cache;
pub mod migration;
pub mod orchestrator;
pub mod relations;
pub mod songs;
pub mod streaks;
pub mod videos;

pub use artists::upsert_artists;
pub use cache::{CacheSubset, ImportCache};
pub use migration::{MigrationSummary, resolve_changed_names};
pub use orchestrator::{Orchestrator, Progress};
pub use relations::{CreditSummary, insert_missing_credits, replace_credits};
pub use songs::upsert_songs;
pub use streaks::{StreakObservation, StreakSummary, next_streak, update_video_streaks};
pub use videos::{VideoSummary, upsert_videos};
