//! Session-scoped lookup maps for one import run.
//!
//! Every stage resolves names through this cache instead of re-reading the
//! store, and merges what it wrote back in right away so later stages of the
//! same batch see it.

use std::collections::{HashMap, HashSet};

use sea_orm::{ConnectionTrait, DbErr};
use tracing::debug;

use crate::db::{ArtistRepository, CreditRepository, Edge, SongRepository, VideoRepository};
use crate::domain::{ArtistKind, CreditKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheSubset {
    Videos,
    Songs,
    Artists,
    Credits,
}

impl CacheSubset {
    pub const ALL: [Self; 4] = [Self::Videos, Self::Songs, Self::Artists, Self::Credits];
}

#[derive(Debug, Default)]
pub struct ImportCache {
    loaded: HashSet<CacheSubset>,
    videos: HashMap<String, i32>,
    songs: HashMap<String, i32>,
    artists: HashMap<ArtistKind, HashMap<String, i32>>,
    credits: HashMap<CreditKind, HashSet<Edge>>,
}

impl ImportCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_loaded(&self, subset: CacheSubset) -> bool {
        self.loaded.contains(&subset)
    }

    /// Loads the requested subsets that are not loaded yet, one bulk read
    /// each. A failed read leaves that subset untouched and unloaded.
    pub async fn ensure_loaded<C: ConnectionTrait>(
        &mut self,
        conn: &C,
        subsets: &[CacheSubset],
    ) -> Result<(), DbErr> {
        for &subset in subsets {
            if self.is_loaded(subset) {
                continue;
            }

            match subset {
                CacheSubset::Videos => {
                    let map = VideoRepository::new(conn).song_map().await?;
                    debug!(videos = map.len(), "Loaded video cache");
                    self.videos.extend(map);
                }
                CacheSubset::Songs => {
                    let map = SongRepository::new(conn).name_map().await?;
                    debug!(songs = map.len(), "Loaded song cache");
                    self.songs.extend(map);
                }
                CacheSubset::Artists => {
                    let repo = ArtistRepository::new(conn);
                    let mut loaded = HashMap::new();
                    for kind in ArtistKind::ALL {
                        loaded.insert(kind, repo.name_map(kind).await?);
                    }
                    for (kind, map) in loaded {
                        debug!(kind = %kind, artists = map.len(), "Loaded artist cache");
                        self.artists.entry(kind).or_default().extend(map);
                    }
                }
                CacheSubset::Credits => {
                    let repo = CreditRepository::new(conn);
                    let mut loaded = HashMap::new();
                    for kind in CreditKind::ALL {
                        loaded.insert(kind, repo.edges(kind).await?);
                    }
                    for (kind, edges) in loaded {
                        self.credits.entry(kind).or_default().extend(edges);
                    }
                }
            }

            self.loaded.insert(subset);
        }
        Ok(())
    }

    /// Drops a subset so the next `ensure_loaded` re-reads it.
    pub fn invalidate(&mut self, subset: CacheSubset) {
        self.loaded.remove(&subset);
        match subset {
            CacheSubset::Videos => self.videos.clear(),
            CacheSubset::Songs => self.songs.clear(),
            CacheSubset::Artists => self.artists.clear(),
            CacheSubset::Credits => self.credits.clear(),
        }
    }

    // ========================================================================
    // Lookups
    // ========================================================================

    #[must_use]
    pub fn song_id(&self, name: &str) -> Option<i32> {
        self.songs.get(name).copied()
    }

    #[must_use]
    pub fn video_song_id(&self, bvid: &str) -> Option<i32> {
        self.videos.get(bvid).copied()
    }

    #[must_use]
    pub fn has_video(&self, bvid: &str) -> bool {
        self.videos.contains_key(bvid)
    }

    #[must_use]
    pub fn artist_id(&self, kind: ArtistKind, name: &str) -> Option<i32> {
        self.artists.get(&kind).and_then(|m| m.get(name)).copied()
    }

    #[must_use]
    pub fn has_credit(&self, kind: CreditKind, edge: Edge) -> bool {
        self.credits.get(&kind).is_some_and(|s| s.contains(&edge))
    }

    #[must_use]
    pub fn credit_count(&self, kind: CreditKind) -> usize {
        self.credits.get(&kind).map_or(0, HashSet::len)
    }

    // ========================================================================
    // Merges
    // ========================================================================

    pub fn merge_songs(&mut self, songs: impl IntoIterator<Item = (String, i32)>) {
        self.songs.extend(songs);
    }

    pub fn merge_artists(&mut self, kind: ArtistKind, names: impl IntoIterator<Item = (String, i32)>) {
        self.artists.entry(kind).or_default().extend(names);
    }

    /// Records videos written by an upsert. Known videos keep their song,
    /// since upserts never move a video.
    pub fn merge_videos(&mut self, videos: impl IntoIterator<Item = (String, i32)>) {
        for (bvid, song_id) in videos {
            self.videos.entry(bvid).or_insert(song_id);
        }
    }

    /// Records a video moved to another song.
    pub fn set_video_song(&mut self, bvid: &str, song_id: i32) {
        self.videos.insert(bvid.to_string(), song_id);
    }

    pub fn merge_credits(&mut self, kind: CreditKind, edges: impl IntoIterator<Item = Edge>) {
        self.credits.entry(kind).or_default().extend(edges);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merged_names_resolve() {
        let mut cache = ImportCache::new();
        cache.merge_artists(ArtistKind::Producer, [("DECO*27".to_string(), 3)]);
        cache.merge_songs([("ヴァンパイア".to_string(), 11)]);

        assert_eq!(cache.artist_id(ArtistKind::Producer, "DECO*27"), Some(3));
        assert_eq!(cache.artist_id(ArtistKind::Vocalist, "DECO*27"), None);
        assert_eq!(cache.song_id("ヴァンパイア"), Some(11));
    }

    #[test]
    fn video_merge_keeps_existing_song() {
        let mut cache = ImportCache::new();
        cache.merge_videos([("BV1".to_string(), 1)]);
        cache.merge_videos([("BV1".to_string(), 2), ("BV2".to_string(), 2)]);
        assert_eq!(cache.video_song_id("BV1"), Some(1));
        assert_eq!(cache.video_song_id("BV2"), Some(2));

        cache.set_video_song("BV1", 5);
        assert_eq!(cache.video_song_id("BV1"), Some(5));
    }

    #[test]
    fn invalidate_clears_subset() {
        let mut cache = ImportCache::new();
        cache.loaded.insert(CacheSubset::Credits);
        cache.merge_credits(CreditKind::Vocalist, [(1, 2)]);
        assert!(cache.has_credit(CreditKind::Vocalist, (1, 2)));

        cache.invalidate(CacheSubset::Credits);
        assert!(!cache.is_loaded(CacheSubset::Credits));
        assert_eq!(cache.credit_count(CreditKind::Vocalist), 0);
    }
}
