//! Domain types for the leaderboard store.
//!
//! Boards, parts, issues and the artist kinds are closed sets; they are
//! modelled as enums so every lookup site names the kind it means instead of
//! passing table names around as strings.

pub mod events;

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Cadence family of a ranking.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum Board {
    #[sea_orm(string_value = "vocaloid-daily")]
    #[serde(rename = "vocaloid-daily")]
    Daily,
    #[sea_orm(string_value = "vocaloid-weekly")]
    #[serde(rename = "vocaloid-weekly")]
    Weekly,
    #[sea_orm(string_value = "vocaloid-monthly")]
    #[serde(rename = "vocaloid-monthly")]
    Monthly,
}

impl Board {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "vocaloid-daily",
            Self::Weekly => "vocaloid-weekly",
            Self::Monthly => "vocaloid-monthly",
        }
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Board {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "vocaloid-daily" | "daily" => Ok(Self::Daily),
            "vocaloid-weekly" | "weekly" => Ok(Self::Weekly),
            "vocaloid-monthly" | "monthly" => Ok(Self::Monthly),
            other => Err(UnknownValue::new("board", other)),
        }
    }
}

/// Sub-list of a board.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "lowercase")]
pub enum Part {
    #[sea_orm(string_value = "main")]
    Main,
    #[sea_orm(string_value = "new")]
    New,
}

impl Part {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Main => "main",
            Self::New => "new",
        }
    }
}

impl fmt::Display for Part {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Part {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "main" => Ok(Self::Main),
            "new" => Ok(Self::New),
            other => Err(UnknownValue::new("part", other)),
        }
    }
}

/// One published edition of a board part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IssueKey {
    pub board: Board,
    pub part: Part,
    pub issue: i32,
}

impl IssueKey {
    #[must_use]
    pub const fn new(board: Board, part: Part, issue: i32) -> Self {
        Self { board, part, issue }
    }
}

impl fmt::Display for IssueKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}#{}", self.board, self.part, self.issue)
    }
}

/// Editorial classification of a song.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
#[serde(rename_all = "lowercase")]
pub enum SongType {
    #[sea_orm(string_value = "original")]
    Original,
    #[sea_orm(string_value = "cover")]
    Cover,
    #[sea_orm(string_value = "remaster")]
    Remaster,
    #[sea_orm(string_value = "medley")]
    Medley,
}

impl SongType {
    /// Label used by the spreadsheet exports.
    #[must_use]
    pub const fn sheet_label(self) -> &'static str {
        match self {
            Self::Original => "原创",
            Self::Cover => "翻唱",
            Self::Remaster => "本家重置",
            Self::Medley => "串烧",
        }
    }
}

impl FromStr for SongType {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "原创" | "original" => Ok(Self::Original),
            "翻唱" | "cover" => Ok(Self::Cover),
            "本家重置" | "remaster" => Ok(Self::Remaster),
            "串烧" | "medley" => Ok(Self::Medley),
            other => Err(UnknownValue::new("song type", other)),
        }
    }
}

/// The four disjoint artist tables.
///
/// A name is unique within one kind only; the same person can exist once per
/// kind without any link between the rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtistKind {
    Producer,
    Synthesizer,
    Vocalist,
    Uploader,
}

impl ArtistKind {
    pub const ALL: [Self; 4] = [
        Self::Producer,
        Self::Synthesizer,
        Self::Vocalist,
        Self::Uploader,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Producer => "producer",
            Self::Synthesizer => "synthesizer",
            Self::Vocalist => "vocalist",
            Self::Uploader => "uploader",
        }
    }

    /// The credit relation for this kind, if songs can be credited to it.
    #[must_use]
    pub const fn credit(self) -> Option<CreditKind> {
        match self {
            Self::Producer => Some(CreditKind::Producer),
            Self::Synthesizer => Some(CreditKind::Synthesizer),
            Self::Vocalist => Some(CreditKind::Vocalist),
            Self::Uploader => None,
        }
    }
}

impl fmt::Display for ArtistKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArtistKind {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "producer" | "author" => Ok(Self::Producer),
            "synthesizer" => Ok(Self::Synthesizer),
            "vocalist" | "vocal" => Ok(Self::Vocalist),
            "uploader" => Ok(Self::Uploader),
            other => Err(UnknownValue::new("artist kind", other)),
        }
    }
}

/// Artist kinds that songs are credited to through a join table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CreditKind {
    Producer,
    Synthesizer,
    Vocalist,
}

impl CreditKind {
    pub const ALL: [Self; 3] = [Self::Producer, Self::Synthesizer, Self::Vocalist];

    #[must_use]
    pub const fn artist_kind(self) -> ArtistKind {
        match self {
            Self::Producer => ArtistKind::Producer,
            Self::Synthesizer => ArtistKind::Synthesizer,
            Self::Vocalist => ArtistKind::Vocalist,
        }
    }
}

impl fmt::Display for CreditKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.artist_kind().fmt(f)
    }
}

/// A string that does not name any member of a closed set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown {what}: '{value}'")]
pub struct UnknownValue {
    pub what: &'static str,
    pub value: String,
}

impl UnknownValue {
    fn new(what: &'static str, value: &str) -> Self {
        Self {
            what,
            value: value.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn board_accepts_tag_and_short_form() {
        assert_eq!("vocaloid-weekly".parse::<Board>().unwrap(), Board::Weekly);
        assert_eq!("daily".parse::<Board>().unwrap(), Board::Daily);
        assert!("hourly".parse::<Board>().is_err());
    }

    #[test]
    fn song_type_parses_sheet_labels() {
        assert_eq!("翻唱".parse::<SongType>().unwrap(), SongType::Cover);
        assert_eq!("medley".parse::<SongType>().unwrap(), SongType::Medley);
        assert_eq!(SongType::Remaster.sheet_label(), "本家重置");
    }

    #[test]
    fn only_credit_kinds_have_join_tables() {
        assert_eq!(ArtistKind::Uploader.credit(), None);
        for kind in CreditKind::ALL {
            assert_eq!(kind.artist_kind().credit(), Some(kind));
        }
    }

    #[test]
    fn issue_key_display() {
        let key = IssueKey::new(Board::Monthly, Part::New, 17);
        assert_eq!(key.to_string(), "vocaloid-monthly/new#17");
    }
}
