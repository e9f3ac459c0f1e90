//! `SeaORM` implementation of the `QueryService` trait.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::constants::limits::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::db::{ArtistRow, SnapshotPoint, Store};
use crate::domain::{ArtistKind, Board, CreditKind, IssueKey, Part};
use crate::services::query_service::{
    IssueSelector, Page, PreviousEntry, QueryError, QueryService, RankingDto, RankingQuery,
    RankingWithContext, SongDetail, SongDto, VideoDto,
};

/// Clamps caller paging input to `page >= 1` and `1..=MAX_PAGE_SIZE`.
/// A zero page size falls back to the default.
#[must_use]
pub fn normalize_paging(page: u64, page_size: u64) -> (u64, u64) {
    let page_size = match page_size {
        0 => DEFAULT_PAGE_SIZE,
        n => n.min(MAX_PAGE_SIZE),
    };
    (page.max(1), page_size)
}

pub struct SeaOrmQueryService {
    store: Store,
}

impl SeaOrmQueryService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    async fn require_song(&self, id: i32) -> Result<SongDto, QueryError> {
        self.store
            .songs()
            .get(id)
            .await?
            .map(SongDto::from)
            .ok_or_else(|| QueryError::NotFound(format!("song {id}")))
    }

    /// Names credited on one song for one relation, ordered by name.
    async fn credited(&self, kind: CreditKind, song_id: i32) -> Result<Vec<String>, QueryError> {
        let ids = self.store.credits().artists_of(kind, song_id).await?;
        Ok(self.store.artists().names_for(kind.artist_kind(), &ids).await?)
    }

    async fn require_artist(&self, kind: ArtistKind, id: i32) -> Result<ArtistRow, QueryError> {
        self.store
            .artists()
            .get(kind, id)
            .await?
            .ok_or_else(|| QueryError::NotFound(format!("{kind} {id}")))
    }
}

#[async_trait]
impl QueryService for SeaOrmQueryService {
    async fn ranking(&self, query: RankingQuery) -> Result<Page<RankingWithContext>, QueryError> {
        let (page, page_size) = normalize_paging(query.page, query.page_size);
        let issue = match query.issue {
            IssueSelector::Number(issue) => issue,
            IssueSelector::Latest => self
                .store
                .rankings()
                .latest_issue(query.board, query.part)
                .await?
                .ok_or_else(|| {
                    QueryError::NotFound(format!("issues of {}/{}", query.board, query.part))
                })?,
        };
        let key = IssueKey::new(query.board, query.part, issue);

        let (rows, total) = self
            .store
            .rankings()
            .page(key, query.order, page, page_size)
            .await?;

        let bvids: Vec<String> = rows.iter().map(|r| r.bvid.clone()).collect();
        let mut song_ids: Vec<i32> = rows.iter().map(|r| r.song_id).collect();
        song_ids.sort_unstable();
        song_ids.dedup();

        let mut videos: HashMap<String, VideoDto> = self
            .store
            .videos()
            .get_many(&bvids)
            .await?
            .into_iter()
            .map(|v| (v.bvid.clone(), VideoDto::from(v)))
            .collect();
        let songs: HashMap<i32, SongDto> = self
            .store
            .songs()
            .get_many(&song_ids)
            .await?
            .into_iter()
            .map(|s| (s.id, SongDto::from(s)))
            .collect();
        let previous = if issue > 1 {
            let prev_key = IssueKey::new(query.board, query.part, issue - 1);
            self.store.rankings().entries_for(prev_key, &bvids).await?
        } else {
            HashMap::new()
        };

        let items = rows
            .into_iter()
            .filter_map(|row| {
                let video = videos.remove(&row.bvid)?;
                let song = songs.get(&row.song_id)?.clone();
                let previous = previous.get(&row.bvid).map(PreviousEntry::from);
                Some(RankingWithContext {
                    ranking: RankingDto::from(row),
                    song,
                    video,
                    previous,
                })
            })
            .collect();

        Ok(Page {
            items,
            total,
            page,
            page_size,
        })
    }

    async fn latest_issue(&self, board: Board, part: Part) -> Result<Option<i32>, QueryError> {
        Ok(self.store.rankings().latest_issue(board, part).await?)
    }

    async fn song(&self, id: i32) -> Result<SongDetail, QueryError> {
        let song = self.require_song(id).await?;

        let videos = self
            .store
            .videos()
            .for_song(id)
            .await?
            .into_iter()
            .map(VideoDto::from)
            .collect();

        Ok(SongDetail {
            song,
            producers: self.credited(CreditKind::Producer, id).await?,
            synthesizers: self.credited(CreditKind::Synthesizer, id).await?,
            vocalists: self.credited(CreditKind::Vocalist, id).await?,
            videos,
        })
    }

    async fn artist(&self, kind: ArtistKind, id: i32) -> Result<ArtistRow, QueryError> {
        self.require_artist(kind, id).await
    }

    async fn artist_songs(
        &self,
        kind: ArtistKind,
        id: i32,
        page: u64,
        page_size: u64,
    ) -> Result<Page<SongDto>, QueryError> {
        self.require_artist(kind, id).await?;
        let (page, page_size) = normalize_paging(page, page_size);

        let mut song_ids = match kind.credit() {
            Some(credit) => self.store.credits().songs_of(credit, id).await?,
            None => self.store.videos().songs_by_uploader(id).await?,
        };
        song_ids.sort_unstable();
        song_ids.dedup();

        let total = song_ids.len() as u64;
        let start = usize::try_from((page - 1).saturating_mul(page_size)).unwrap_or(usize::MAX);
        let window: Vec<i32> = song_ids
            .into_iter()
            .skip(start)
            .take(usize::try_from(page_size).unwrap_or(usize::MAX))
            .collect();

        let mut items: Vec<SongDto> = self
            .store
            .songs()
            .get_many(&window)
            .await?
            .into_iter()
            .map(SongDto::from)
            .collect();
        items.sort_by_key(|s| s.id);

        Ok(Page {
            items,
            total,
            page,
            page_size,
        })
    }

    async fn song_rankings(
        &self,
        song_id: i32,
        board: Option<Board>,
        page: u64,
        page_size: u64,
    ) -> Result<Page<RankingDto>, QueryError> {
        self.require_song(song_id).await?;
        let (page, page_size) = normalize_paging(page, page_size);

        let (rows, total) = self
            .store
            .rankings()
            .for_song(song_id, board, page, page_size)
            .await?;

        Ok(Page {
            items: rows.into_iter().map(RankingDto::from).collect(),
            total,
            page,
            page_size,
        })
    }

    async fn video_snapshots(
        &self,
        bvid: &str,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<SnapshotPoint>, QueryError> {
        if self.store.videos().get(bvid).await?.is_none() {
            return Err(QueryError::NotFound(format!("video {bvid}")));
        }
        Ok(self.store.snapshots().for_video(bvid, from, to).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paging_is_clamped() {
        assert_eq!(normalize_paging(0, 0), (1, DEFAULT_PAGE_SIZE));
        assert_eq!(normalize_paging(3, 10), (3, 10));
        assert_eq!(normalize_paging(1, 10_000), (1, MAX_PAGE_SIZE));
    }
}
