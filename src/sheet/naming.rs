//! Where sheets live inside the data directory, and how a file name maps
//! back to the board issue or data date it holds.

use std::path::{Path, PathBuf};

use chrono::{Datelike, Days, Months, NaiveDate};

use crate::domain::{Board, IssueKey, Part};

const EXTENSION: &str = "csv";
const DATA_FOLDER: &str = "数据";

/// What a sheet file contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetIdentity {
    Ranking(IssueKey),
    Data(NaiveDate),
}

fn daily_origin() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 7, 3).unwrap_or_default()
}

fn weekly_origin() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 8, 31).unwrap_or_default()
}

fn monthly_origin() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 1).unwrap_or_default()
}

const fn board_folder(board: Board) -> &'static str {
    match board {
        Board::Daily => "日刊",
        Board::Weekly => "周刊",
        Board::Monthly => "月刊",
    }
}

const fn part_folder(part: Part) -> &'static str {
    match part {
        Part::Main => "总榜",
        Part::New => "新曲榜",
    }
}

const fn new_prefix(board: Board) -> &'static str {
    match board {
        Board::Daily => "新曲榜",
        Board::Weekly | Board::Monthly => "新曲",
    }
}

fn shift_days(origin: NaiveDate, days: i64) -> Option<NaiveDate> {
    if days >= 0 {
        origin.checked_add_days(Days::new(days.unsigned_abs()))
    } else {
        origin.checked_sub_days(Days::new(days.unsigned_abs()))
    }
}

fn shift_months(origin: NaiveDate, months: i32) -> Option<NaiveDate> {
    if months >= 0 {
        origin.checked_add_months(Months::new(months.unsigned_abs()))
    } else {
        origin.checked_sub_months(Months::new(months.unsigned_abs()))
    }
}

/// File stem of a ranking sheet, without directory or extension.
#[must_use]
pub fn ranking_stem(key: IssueKey) -> Option<String> {
    let stamp = match key.board {
        Board::Daily => {
            let end = shift_days(daily_origin(), i64::from(key.issue))?;
            let start = end.checked_sub_days(Days::new(1))?;
            format!("{}与{}", end.format("%Y%m%d"), start.format("%Y%m%d"))
        }
        Board::Weekly => {
            let end = shift_days(weekly_origin(), i64::from(key.issue) * 7)?;
            end.format("%Y-%m-%d").to_string()
        }
        Board::Monthly => {
            let month = shift_months(monthly_origin(), key.issue)?;
            month.format("%Y-%m").to_string()
        }
    };

    let prefix = match key.part {
        Part::Main => "",
        Part::New => new_prefix(key.board),
    };
    Some(format!("{prefix}{stamp}"))
}

/// Path of a ranking sheet below `data_dir`.
#[must_use]
pub fn ranking_sheet_path(data_dir: &Path, key: IssueKey) -> Option<PathBuf> {
    let stem = ranking_stem(key)?;
    Some(
        data_dir
            .join(board_folder(key.board))
            .join(part_folder(key.part))
            .join(format!("{stem}.{EXTENSION}")),
    )
}

/// Path of a daily data sheet below `data_dir`.
#[must_use]
pub fn data_sheet_path(data_dir: &Path, date: NaiveDate) -> PathBuf {
    data_dir
        .join(DATA_FOLDER)
        .join(format!("{}.{EXTENSION}", date.format("%Y%m%d")))
}

/// Recovers what a sheet holds from its file stem.
#[must_use]
pub fn identify_sheet(stem: &str) -> Option<SheetIdentity> {
    let (part, body) = if let Some(rest) = stem.strip_prefix("新曲榜") {
        (Part::New, rest)
    } else if let Some(rest) = stem.strip_prefix("新曲") {
        (Part::New, rest)
    } else {
        (Part::Main, stem)
    };

    let hyphens = body.matches('-').count();
    let key = if hyphens == 1 {
        let month = NaiveDate::parse_from_str(&format!("{body}-01"), "%Y-%m-%d").ok()?;
        let issue = (month.year() - 2024) * 12 + month.month0() as i32 - 5;
        IssueKey::new(Board::Monthly, part, issue)
    } else if hyphens > 1 {
        let end = NaiveDate::parse_from_str(body, "%Y-%m-%d").ok()?;
        let days = (end - weekly_origin()).num_days();
        let issue = i32::try_from(days.div_euclid(7)).ok()?;
        IssueKey::new(Board::Weekly, part, issue)
    } else if let Some((end, _)) = body.split_once('与') {
        let end = NaiveDate::parse_from_str(end, "%Y%m%d").ok()?;
        let issue = i32::try_from((end - daily_origin()).num_days()).ok()?;
        IssueKey::new(Board::Daily, part, issue)
    } else if part == Part::Main {
        let date = NaiveDate::parse_from_str(body, "%Y%m%d").ok()?;
        return Some(SheetIdentity::Data(date));
    } else {
        return None;
    };

    Some(SheetIdentity::Ranking(key))
}
