//! Song credit reconciliation.
//!
//! Insert-only mode adds the edges missing from the cached edge set for
//! newly created songs. Replace mode rebuilds the edge set of every touched
//! song directly against the store.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use sea_orm::{ConnectionTrait, DbErr};
use tracing::{debug, warn};

use super::cache::{CacheSubset, ImportCache};
use crate::constants::metrics as metric_names;
use crate::db::{CreditRepository, Edge};
use crate::domain::CreditKind;
use crate::sheet::{SheetRow, split_names};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CreditSummary {
    pub inserted: usize,
    pub removed: u64,
    /// Credited names that did not resolve to an artist.
    pub unresolved: usize,
}

/// Edges a set of rows implies for one relation, grouped by song. Rows are
/// skipped when their song is unknown, when `include` rejects them, or (in
/// non-strict mode) when any credit cell is blank.
fn candidate_edges<R: SheetRow>(
    cache: &ImportCache,
    rows: &[R],
    kind: CreditKind,
    strict: bool,
    include: impl Fn(&str) -> bool,
    unresolved: &mut usize,
) -> BTreeMap<i32, BTreeSet<i32>> {
    let artist_kind = kind.artist_kind();
    let mut by_song: BTreeMap<i32, BTreeSet<i32>> = BTreeMap::new();

    for row in rows {
        let song = row.song();
        let Some(name) = song.name.as_deref() else {
            continue;
        };
        if !include(name) || (!strict && !song.has_full_credits()) {
            continue;
        }
        let Some(song_id) = cache.song_id(name) else {
            continue;
        };

        let artists = by_song.entry(song_id).or_default();
        let Some(cell) = song.credit_cell(artist_kind) else {
            continue;
        };
        for artist in split_names(cell) {
            match cache.artist_id(artist_kind, artist) {
                Some(artist_id) => {
                    artists.insert(artist_id);
                }
                None => {
                    *unresolved += 1;
                    warn!(kind = %kind, artist = artist, song = name, "Credited artist did not resolve, skipping");
                }
            }
        }
    }

    by_song
}

fn record_unresolved(count: usize) {
    if count > 0 {
        metrics::counter!(
            metric_names::ROWS_DROPPED_TOTAL,
            "kind" => "credit",
            "reason" => "unresolved_artist"
        )
        .increment(count as u64);
    }
}

/// Adds missing credit edges for `new_songs`.
pub async fn insert_missing_credits<C: ConnectionTrait, R: SheetRow>(
    conn: &C,
    cache: &mut ImportCache,
    rows: &[R],
    new_songs: &[String],
    strict: bool,
) -> Result<CreditSummary, DbErr> {
    let mut summary = CreditSummary::default();
    if new_songs.is_empty() {
        return Ok(summary);
    }

    cache.ensure_loaded(conn, &[CacheSubset::Credits]).await?;
    let repo = CreditRepository::new(conn);
    let new_songs: HashSet<&str> = new_songs.iter().map(String::as_str).collect();

    for kind in CreditKind::ALL {
        let candidates = candidate_edges(
            cache,
            rows,
            kind,
            strict,
            |name| new_songs.contains(name),
            &mut summary.unresolved,
        );

        let delta: Vec<Edge> = candidates
            .into_iter()
            .flat_map(|(song_id, artists)| artists.into_iter().map(move |a| (song_id, a)))
            .filter(|edge| !cache.has_credit(kind, *edge))
            .collect();
        if delta.is_empty() {
            continue;
        }

        repo.insert(kind, &delta).await?;
        debug!(kind = %kind, edges = delta.len(), "Inserted credit edges");
        summary.inserted += delta.len();
        cache.merge_credits(kind, delta);
    }

    record_unresolved(summary.unresolved);
    Ok(summary)
}

/// Rebuilds the credits of every song named in `rows` from the sheet.
pub async fn replace_credits<C: ConnectionTrait, R: SheetRow>(
    conn: &C,
    cache: &mut ImportCache,
    rows: &[R],
    strict: bool,
) -> Result<CreditSummary, DbErr> {
    let mut summary = CreditSummary::default();
    let repo = CreditRepository::new(conn);

    for kind in CreditKind::ALL {
        let candidates = candidate_edges(cache, rows, kind, strict, |_| true, &mut summary.unresolved);
        if candidates.is_empty() {
            continue;
        }

        let song_ids: Vec<i32> = candidates.keys().copied().collect();
        summary.removed += repo.delete_for_songs(kind, &song_ids).await?;

        let edges: Vec<Edge> = candidates
            .into_iter()
            .flat_map(|(song_id, artists)| artists.into_iter().map(move |a| (song_id, a)))
            .collect();
        repo.insert(kind, &edges).await?;
        debug!(kind = %kind, songs = song_ids.len(), edges = edges.len(), "Replaced credit edges");
        summary.inserted += edges.len();
    }

    cache.invalidate(CacheSubset::Credits);
    record_unresolved(summary.unresolved);
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ArtistKind;
    use crate::sheet::CatalogRow;

    fn row(name: &str, author: Option<&str>, synth: Option<&str>, vocal: Option<&str>) -> CatalogRow {
        let mut row = CatalogRow::default();
        row.song.name = Some(name.to_string());
        row.song.author = author.map(str::to_string);
        row.song.synthesizer = synth.map(str::to_string);
        row.song.vocal = vocal.map(str::to_string);
        row
    }

    fn cache() -> ImportCache {
        let mut cache = ImportCache::new();
        cache.merge_songs([("S".to_string(), 1), ("T".to_string(), 2)]);
        cache.merge_artists(
            ArtistKind::Producer,
            [("A".to_string(), 10), ("B".to_string(), 11)],
        );
        cache.merge_artists(ArtistKind::Synthesizer, [("SV".to_string(), 20)]);
        cache.merge_artists(ArtistKind::Vocalist, [("V".to_string(), 30)]);
        cache
    }

    #[test]
    fn candidates_group_by_song_and_skip_unresolved() {
        let cache = cache();
        let rows = vec![
            row("S", Some("A、Ghost"), Some("SV"), Some("V")),
            row("S", Some("B"), Some("SV"), Some("V")),
        ];
        let mut unresolved = 0;
        let edges = candidate_edges(&cache, &rows, CreditKind::Producer, false, |_| true, &mut unresolved);

        assert_eq!(edges.len(), 1);
        assert_eq!(edges[&1], BTreeSet::from([10, 11]));
        assert_eq!(unresolved, 1);
    }

    #[test]
    fn non_strict_skips_rows_with_blank_credits() {
        let cache = cache();
        let rows = vec![
            row("S", Some("A"), Some("SV"), None),
            row("T", Some("B"), Some("SV"), Some("V")),
        ];
        let mut unresolved = 0;

        let lenient = candidate_edges(&cache, &rows, CreditKind::Producer, false, |_| true, &mut unresolved);
        assert_eq!(lenient.keys().copied().collect::<Vec<_>>(), vec![2]);

        let strict = candidate_edges(&cache, &rows, CreditKind::Producer, true, |_| true, &mut unresolved);
        assert_eq!(strict.keys().copied().collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn include_filter_limits_songs() {
        let cache = cache();
        let rows = vec![
            row("S", Some("A"), Some("SV"), Some("V")),
            row("T", Some("B"), Some("SV"), Some("V")),
        ];
        let mut unresolved = 0;
        let edges = candidate_edges(&cache, &rows, CreditKind::Vocalist, false, |n| n == "T", &mut unresolved);
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[&2], BTreeSet::from([30]));
    }
}
