//! Read-side service over the imported leaderboard data.

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use thiserror::Error;

use crate::db::{ArtistRow, RankingOrder, SnapshotPoint};
use crate::domain::{ArtistKind, Board, Part, SongType};
use crate::entities::{ranking, song, video};

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

/// One page of results. `page` is 1-based.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SongDto {
    pub id: i32,
    pub name: String,
    #[serde(rename = "type")]
    pub song_type: Option<SongType>,
    pub display_name: Option<String>,
}

impl From<song::Model> for SongDto {
    fn from(m: song::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            song_type: m.r#type,
            display_name: m.display_name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VideoDto {
    pub bvid: String,
    pub title: String,
    pub pubdate: Option<NaiveDateTime>,
    pub uploader_id: Option<i32>,
    pub song_id: i32,
    pub copyright: Option<i16>,
    pub thumbnail: Option<String>,
    pub duration: Option<i32>,
    pub page: Option<i32>,
    pub streak: i32,
}

impl From<video::Model> for VideoDto {
    fn from(m: video::Model) -> Self {
        Self {
            bvid: m.bvid,
            title: m.title,
            pubdate: m.pubdate,
            uploader_id: m.uploader_id,
            song_id: m.song_id,
            copyright: m.copyright,
            thumbnail: m.thumbnail,
            duration: m.duration,
            page: m.page,
            streak: m.streak,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankingDto {
    pub board: Board,
    pub part: Part,
    pub issue: i32,
    pub rank: i32,
    pub bvid: String,
    pub song_id: i32,
    pub count: Option<i32>,
    pub point: i64,
    pub view: i64,
    pub favorite: i64,
    pub coin: i64,
    pub like: i64,
    pub view_rank: i32,
    pub favorite_rank: i32,
    pub coin_rank: i32,
    pub like_rank: i32,
}

impl From<ranking::Model> for RankingDto {
    fn from(m: ranking::Model) -> Self {
        Self {
            board: m.board,
            part: m.part,
            issue: m.issue,
            rank: m.rank,
            bvid: m.bvid,
            song_id: m.song_id,
            count: m.count,
            point: m.point,
            view: m.view,
            favorite: m.favorite,
            coin: m.coin,
            like: m.like,
            view_rank: m.view_rank,
            favorite_rank: m.favorite_rank,
            coin_rank: m.coin_rank,
            like_rank: m.like_rank,
        }
    }
}

/// The same video's placement in the preceding issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PreviousEntry {
    pub issue: i32,
    pub rank: i32,
    pub point: i64,
}

impl From<&ranking::Model> for PreviousEntry {
    fn from(m: &ranking::Model) -> Self {
        Self {
            issue: m.issue,
            rank: m.rank,
            point: m.point,
        }
    }
}

/// A ranking row together with the rows it references.
#[derive(Debug, Clone, Serialize)]
pub struct RankingWithContext {
    pub ranking: RankingDto,
    pub song: SongDto,
    pub video: VideoDto,
    pub previous: Option<PreviousEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SongDetail {
    pub song: SongDto,
    pub producers: Vec<String>,
    pub synthesizers: Vec<String>,
    pub vocalists: Vec<String>,
    pub videos: Vec<VideoDto>,
}

/// Which issue of a board part to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueSelector {
    Latest,
    Number(i32),
}

#[derive(Debug, Clone, Copy)]
pub struct RankingQuery {
    pub board: Board,
    pub part: Part,
    pub issue: IssueSelector,
    pub order: RankingOrder,
    pub page: u64,
    pub page_size: u64,
}

/// Domain service trait for read queries.
#[async_trait::async_trait]
pub trait QueryService: Send + Sync {
    /// One page of an issue, ordered by the requested sub-rank.
    ///
    /// # Errors
    ///
    /// - [`QueryError::NotFound`] if the board part has no issue yet
    /// - [`QueryError::Database`] on store failures
    async fn ranking(&self, query: RankingQuery) -> Result<Page<RankingWithContext>, QueryError>;

    /// Highest imported issue of a board part.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::Database`] on store failures.
    async fn latest_issue(&self, board: Board, part: Part) -> Result<Option<i32>, QueryError>;

    /// # Errors
    ///
    /// - [`QueryError::NotFound`] if no song has this id
    /// - [`QueryError::Database`] on store failures
    async fn song(&self, id: i32) -> Result<SongDetail, QueryError>;

    /// # Errors
    ///
    /// - [`QueryError::NotFound`] if no artist of this kind has this id
    /// - [`QueryError::Database`] on store failures
    async fn artist(&self, kind: ArtistKind, id: i32) -> Result<ArtistRow, QueryError>;

    /// Songs credited to an artist. For uploaders, the songs of their videos.
    ///
    /// # Errors
    ///
    /// Same as [`QueryService::artist`].
    async fn artist_songs(
        &self,
        kind: ArtistKind,
        id: i32,
        page: u64,
        page_size: u64,
    ) -> Result<Page<SongDto>, QueryError>;

    /// Ranking history of one song, newest issue first.
    ///
    /// # Errors
    ///
    /// Same as [`QueryService::song`].
    async fn song_rankings(
        &self,
        song_id: i32,
        board: Option<Board>,
        page: u64,
        page_size: u64,
    ) -> Result<Page<RankingDto>, QueryError>;

    /// Daily counters of one video within the optional bounds.
    ///
    /// # Errors
    ///
    /// - [`QueryError::NotFound`] if the video is unknown
    /// - [`QueryError::Database`] on store failures
    async fn video_snapshots(
        &self,
        bvid: &str,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<SnapshotPoint>, QueryError>;
}
