use chrono::NaiveDateTime;
use serde::Serialize;

use crate::domain::{ArtistKind, SongType};

/// Song identity and credits as printed on a row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SongCells {
    pub name: Option<String>,
    pub song_type: Option<SongType>,
    pub author: Option<String>,
    pub synthesizer: Option<String>,
    pub vocal: Option<String>,
}

impl SongCells {
    /// The raw multi-value cell of a credited kind.
    #[must_use]
    pub fn credit_cell(&self, kind: ArtistKind) -> Option<&str> {
        match kind {
            ArtistKind::Producer => self.author.as_deref(),
            ArtistKind::Synthesizer => self.synthesizer.as_deref(),
            ArtistKind::Vocalist => self.vocal.as_deref(),
            ArtistKind::Uploader => None,
        }
    }

    /// Whether every credit cell is filled.
    #[must_use]
    pub const fn has_full_credits(&self) -> bool {
        self.author.is_some() && self.synthesizer.is_some() && self.vocal.is_some()
    }
}

/// Video metadata as printed on a row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VideoCells {
    pub bvid: String,
    pub title: String,
    pub pubdate: Option<NaiveDateTime>,
    pub uploader: Option<String>,
    pub copyright: Option<i16>,
    pub image_url: Option<String>,
    pub duration: Option<i32>,
    pub page: Option<i32>,
}

/// Nullable cells that strict mode checks. `title` is never checked: a
/// blank title reads as `""`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Name,
    Type,
    Author,
    Synthesizer,
    Vocal,
    Uploader,
    Copyright,
    Pubdate,
    ImageUrl,
    Duration,
    Page,
    Count,
}

impl Column {
    #[must_use]
    pub const fn header(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Type => "type",
            Self::Author => "author",
            Self::Synthesizer => "synthesizer",
            Self::Vocal => "vocal",
            Self::Uploader => "uploader",
            Self::Copyright => "copyright",
            Self::Pubdate => "pubdate",
            Self::ImageUrl => "image_url",
            Self::Duration => "duration",
            Self::Page => "page",
            Self::Count => "count",
        }
    }
}

/// Shared view over the three sheet row kinds.
pub trait SheetRow {
    /// 1-based spreadsheet row, header included.
    fn line(&self) -> usize;
    fn song(&self) -> &SongCells;
    fn video(&self) -> &VideoCells;

    fn is_blank(&self, column: Column) -> bool {
        shared_cell_blank(self.song(), self.video(), column)
    }
}

fn shared_cell_blank(song: &SongCells, video: &VideoCells, column: Column) -> bool {
    match column {
        Column::Name => song.name.is_none(),
        Column::Type => song.song_type.is_none(),
        Column::Author => song.author.is_none(),
        Column::Synthesizer => song.synthesizer.is_none(),
        Column::Vocal => song.vocal.is_none(),
        Column::Uploader => video.uploader.is_none(),
        Column::Copyright => video.copyright.is_none(),
        Column::Pubdate => video.pubdate.is_none(),
        Column::ImageUrl => video.image_url.is_none(),
        Column::Duration => video.duration.is_none(),
        Column::Page => video.page.is_none(),
        Column::Count => false,
    }
}

/// One line of a ranking sheet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RankingRow {
    pub line: usize,
    pub song: SongCells,
    pub video: VideoCells,
    pub rank: i32,
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

impl SheetRow for RankingRow {
    fn line(&self) -> usize {
        self.line
    }

    fn song(&self) -> &SongCells {
        &self.song
    }

    fn video(&self) -> &VideoCells {
        &self.video
    }

    fn is_blank(&self, column: Column) -> bool {
        match column {
            Column::Count => self.count.is_none(),
            other => shared_cell_blank(&self.song, &self.video, other),
        }
    }
}

/// One line of a daily data sheet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SnapshotRow {
    pub line: usize,
    pub song: SongCells,
    pub video: VideoCells,
    pub view: i64,
    pub favorite: i64,
    pub coin: i64,
    pub like: i64,
}

impl SheetRow for SnapshotRow {
    fn line(&self) -> usize {
        self.line
    }

    fn song(&self) -> &SongCells {
        &self.song
    }

    fn video(&self) -> &VideoCells {
        &self.video
    }
}

/// One line of the raw song catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CatalogRow {
    pub line: usize,
    pub song: SongCells,
    pub video: VideoCells,
}

impl SheetRow for CatalogRow {
    fn line(&self) -> usize {
        self.line
    }

    fn song(&self) -> &SongCells {
        &self.song
    }

    fn video(&self) -> &VideoCells {
        &self.video
    }
}

/// A video and the song name it should now belong to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, serde::Deserialize)]
pub struct SongAssignment {
    pub bvid: String,
    pub name: String,
}

impl SongAssignment {
    /// Builds the assignment a row implies, if it names a song.
    pub fn from_row<R: SheetRow>(row: &R) -> Option<Self> {
        row.song().name.as_ref().map(|name| Self {
            bvid: row.video().bvid.clone(),
            name: name.clone(),
        })
    }
}
