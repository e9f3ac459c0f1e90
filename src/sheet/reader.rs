use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};

use super::SheetError;
use super::cells::{parse_duration, parse_int, parse_pubdate};
use super::rows::{CatalogRow, RankingRow, SnapshotRow, SongAssignment, SongCells, VideoCells};
use crate::domain::SongType;

/// A sheet kind that can be decoded from one CSV record.
pub trait FromRecord: Sized {
    /// Columns that must exist in the header.
    const REQUIRED_HEADERS: &'static [&'static str];

    fn from_record(record: &Record<'_>) -> Result<Self, SheetError>;
}

/// One data line with its header lookup.
pub struct Record<'a> {
    headers: &'a HashMap<String, usize>,
    fields: &'a StringRecord,
    line: usize,
}

impl Record<'_> {
    #[must_use]
    pub const fn line(&self) -> usize {
        self.line
    }

    fn raw(&self, column: &str) -> Option<&str> {
        self.headers
            .get(column)
            .and_then(|&idx| self.fields.get(idx))
            .map(str::trim)
            .filter(|cell| !cell.is_empty())
    }

    /// A text cell read verbatim; blank cells are `None`.
    #[must_use]
    pub fn text(&self, column: &str) -> Option<String> {
        self.raw(column).map(ToString::to_string)
    }

    fn cell_error(&self, column: &'static str, message: String) -> SheetError {
        SheetError::Cell {
            row: self.line,
            column,
            message,
        }
    }

    fn invalid(&self, column: &'static str, reason: &str) -> SheetError {
        self.cell_error(column, format!("is invalid: {reason}"))
    }

    pub fn required_text(&self, column: &'static str) -> Result<String, SheetError> {
        self.text(column)
            .ok_or_else(|| self.cell_error(column, "is empty".to_string()))
    }

    pub fn int<T: TryFrom<i64>>(&self, column: &'static str) -> Result<Option<T>, SheetError> {
        let Some(cell) = self.raw(column) else {
            return Ok(None);
        };
        let value = parse_int(cell).map_err(|message| self.invalid(column, &message))?;
        T::try_from(value)
            .map(Some)
            .map_err(|_| self.cell_error(column, format!("is out of range ({value})")))
    }

    pub fn required_int<T: TryFrom<i64>>(&self, column: &'static str) -> Result<T, SheetError> {
        self.int(column)?
            .ok_or_else(|| self.cell_error(column, "is empty".to_string()))
    }

    pub fn duration(&self, column: &'static str) -> Result<Option<i32>, SheetError> {
        self.raw(column)
            .map(|cell| parse_duration(cell).map_err(|message| self.invalid(column, &message)))
            .transpose()
    }

    pub fn song_type(&self, column: &'static str) -> Result<Option<SongType>, SheetError> {
        self.raw(column)
            .map(|cell| {
                cell.parse::<SongType>()
                    .map_err(|e| self.invalid(column, &e.to_string()))
            })
            .transpose()
    }

    fn song_cells(&self) -> Result<SongCells, SheetError> {
        Ok(SongCells {
            name: self.text("name"),
            song_type: self.song_type("type")?,
            author: self.text("author"),
            synthesizer: self.text("synthesizer"),
            vocal: self.text("vocal"),
        })
    }

    fn video_cells(&self) -> Result<VideoCells, SheetError> {
        Ok(VideoCells {
            bvid: self.required_text("bvid")?,
            title: self.text("title").unwrap_or_default(),
            pubdate: self.raw("pubdate").and_then(parse_pubdate),
            uploader: self.text("uploader"),
            copyright: self.int("copyright")?,
            image_url: self.text("image_url"),
            duration: self.duration("duration")?,
            page: self.int("page")?,
        })
    }
}

impl FromRecord for RankingRow {
    const REQUIRED_HEADERS: &'static [&'static str] = &[
        "rank",
        "bvid",
        "point",
        "view",
        "favorite",
        "coin",
        "like",
        "view_rank",
        "favorite_rank",
        "coin_rank",
        "like_rank",
    ];

    fn from_record(record: &Record<'_>) -> Result<Self, SheetError> {
        Ok(Self {
            line: record.line(),
            song: record.song_cells()?,
            video: record.video_cells()?,
            rank: record.required_int("rank")?,
            count: record.int("count")?,
            point: record.required_int("point")?,
            view: record.required_int("view")?,
            favorite: record.required_int("favorite")?,
            coin: record.required_int("coin")?,
            like: record.required_int("like")?,
            view_rank: record.required_int("view_rank")?,
            favorite_rank: record.required_int("favorite_rank")?,
            coin_rank: record.required_int("coin_rank")?,
            like_rank: record.required_int("like_rank")?,
        })
    }
}

impl FromRecord for SnapshotRow {
    const REQUIRED_HEADERS: &'static [&'static str] = &["bvid", "view", "favorite", "coin", "like"];

    fn from_record(record: &Record<'_>) -> Result<Self, SheetError> {
        Ok(Self {
            line: record.line(),
            song: record.song_cells()?,
            video: record.video_cells()?,
            view: record.required_int("view")?,
            favorite: record.required_int("favorite")?,
            coin: record.required_int("coin")?,
            like: record.required_int("like")?,
        })
    }
}

impl FromRecord for CatalogRow {
    const REQUIRED_HEADERS: &'static [&'static str] = &["bvid", "name"];

    fn from_record(record: &Record<'_>) -> Result<Self, SheetError> {
        Ok(Self {
            line: record.line(),
            song: record.song_cells()?,
            video: record.video_cells()?,
        })
    }
}

impl FromRecord for SongAssignment {
    const REQUIRED_HEADERS: &'static [&'static str] = &["bvid", "name"];

    fn from_record(record: &Record<'_>) -> Result<Self, SheetError> {
        Ok(Self {
            bvid: record.required_text("bvid")?,
            name: record.required_text("name")?,
        })
    }
}

/// Decodes every data line of a CSV sheet.
pub fn read_rows<T: FromRecord, R: Read>(reader: R) -> Result<Vec<T>, SheetError> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::None)
        .from_reader(reader);

    let headers: HashMap<String, usize> = rdr
        .headers()?
        .iter()
        .enumerate()
        .map(|(idx, name)| (name.trim().trim_start_matches('\u{feff}').to_string(), idx))
        .collect();

    for column in T::REQUIRED_HEADERS {
        if !headers.contains_key(*column) {
            return Err(SheetError::MissingColumn(*column));
        }
    }

    let mut rows = Vec::new();
    let mut fields = StringRecord::new();
    let mut index = 0;
    while rdr.read_record(&mut fields)? {
        if fields.iter().all(|cell| cell.trim().is_empty()) {
            index += 1;
            continue;
        }
        let record = Record {
            headers: &headers,
            fields: &fields,
            line: index + 2,
        };
        rows.push(T::from_record(&record)?);
        index += 1;
    }

    Ok(rows)
}

/// Opens and decodes a CSV sheet from disk.
pub fn read_file<T: FromRecord>(path: &Path) -> Result<Vec<T>, SheetError> {
    let file = File::open(path).map_err(|source| SheetError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    read_rows(BufReader::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;

    const RANKING: &str = "\
rank,bvid,title,name,type,author,synthesizer,vocal,uploader,pubdate,copyright,image_url,duration,page,count,point,view,favorite,coin,like,view_rank,favorite_rank,coin_rank,like_rank
1,BV1xx411c7mD,Song A,Song A,原创,P1、P2,Synth V,初音ミク,Up1,2024-09-01 18:00:00,1,http://i0/a.jpg,3分35秒,1,4,98765,120000,5000,3000,8000,1,1,1,1
2,BV1yy411c7mE,,Song B,,,,,,not a date,,,,,,500,900,10,5,20,2,2,2,2
";

    #[test]
    fn decodes_ranking_rows() {
        let rows: Vec<RankingRow> = read_rows(RANKING.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);

        let first = &rows[0];
        assert_eq!(first.line, 2);
        assert_eq!(first.song.name.as_deref(), Some("Song A"));
        assert_eq!(first.song.song_type, Some(SongType::Original));
        assert_eq!(first.song.author.as_deref(), Some("P1、P2"));
        assert_eq!(first.video.duration, Some(215));
        assert_eq!(first.video.copyright, Some(1));
        assert_eq!(first.count, Some(4));
        assert_eq!(first.point, 98765);

        let second = &rows[1];
        assert_eq!(second.line, 3);
        assert_eq!(second.video.title, "");
        assert!(second.video.pubdate.is_none());
        assert!(second.song.song_type.is_none());
        assert!(second.count.is_none());
    }

    #[test]
    fn text_cells_stay_text() {
        let sheet = "bvid,name,view,favorite,coin,like\nBV1,0123,1,1,1,1\n";
        let rows: Vec<SnapshotRow> = read_rows(sheet.as_bytes()).unwrap();
        assert_eq!(rows[0].song.name.as_deref(), Some("0123"));
    }

    #[test]
    fn malformed_counter_reports_cell() {
        let sheet = "bvid,view,favorite,coin,like\nBV1,12,x,1,1\n";
        let err = read_rows::<SnapshotRow, _>(sheet.as_bytes()).unwrap_err();
        match err {
            SheetError::Cell { row, column, .. } => {
                assert_eq!(row, 2);
                assert_eq!(column, "favorite");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_header_is_rejected() {
        let sheet = "bvid,view\nBV1,1\n";
        let err = read_rows::<SnapshotRow, _>(sheet.as_bytes()).unwrap_err();
        assert!(matches!(err, SheetError::MissingColumn("favorite")));
    }

    #[test]
    fn blank_lines_keep_row_numbers() {
        let sheet = "bvid,name\nBV1,A\n,\nBV2,B\n";
        let rows: Vec<CatalogRow> = read_rows(sheet.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].line, 4);
    }
}
