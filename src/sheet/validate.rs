use super::rows::{Column, SheetRow};
use crate::domain::Part;

/// Every nullable cell a catalog or main ranking sheet carries.
pub const CATALOG_REQUIRED: &[Column] = &[
    Column::Name,
    Column::Type,
    Column::Author,
    Column::Synthesizer,
    Column::Vocal,
    Column::Uploader,
    Column::Copyright,
    Column::Pubdate,
    Column::ImageUrl,
    Column::Duration,
    Column::Page,
];

pub const RANKING_MAIN_REQUIRED: &[Column] = &[
    Column::Name,
    Column::Type,
    Column::Author,
    Column::Synthesizer,
    Column::Vocal,
    Column::Uploader,
    Column::Copyright,
    Column::Pubdate,
    Column::ImageUrl,
    Column::Duration,
    Column::Page,
    Column::Count,
];

/// New-song sheets carry no credits and no `count`.
pub const RANKING_NEW_REQUIRED: &[Column] = &[
    Column::Name,
    Column::Type,
    Column::Uploader,
    Column::Copyright,
    Column::Pubdate,
    Column::ImageUrl,
    Column::Duration,
    Column::Page,
];

/// Data sheets carry the song name and the video cells.
pub const SNAPSHOT_REQUIRED: &[Column] = &[
    Column::Name,
    Column::Uploader,
    Column::Copyright,
    Column::Pubdate,
    Column::ImageUrl,
    Column::Duration,
    Column::Page,
];

#[must_use]
pub const fn ranking_required(part: Part) -> &'static [Column] {
    match part {
        Part::Main => RANKING_MAIN_REQUIRED,
        Part::New => RANKING_NEW_REQUIRED,
    }
}

/// Lists every blank required cell, in row order. An empty list passes.
pub fn validate<R: SheetRow>(rows: &[R], required: &[Column]) -> Vec<String> {
    rows.iter()
        .flat_map(|row| {
            required
                .iter()
                .filter(|column| row.is_blank(**column))
                .map(move |column| {
                    format!("row {}: column '{}' is empty", row.line(), column.header())
                })
        })
        .collect()
}
