//! Cell-level parsing shared by every sheet kind.

use chrono::{NaiveDate, NaiveDateTime};

use crate::constants::NAME_SEPARATOR;

const PUBDATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Splits a multi-value artist cell into trimmed, non-empty names.
pub fn split_names(cell: &str) -> impl Iterator<Item = &str> {
    cell.split(NAME_SEPARATOR)
        .map(str::trim)
        .filter(|name| !name.is_empty())
}

/// Parses a publish date. Anything unparseable becomes `None`.
#[must_use]
pub fn parse_pubdate(cell: &str) -> Option<NaiveDateTime> {
    let cell = cell.trim();
    NaiveDateTime::parse_from_str(cell, PUBDATE_FORMAT)
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(cell, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Parses an integer cell, accepting spreadsheet renderings like `12.0`.
pub fn parse_int(cell: &str) -> Result<i64, String> {
    let cell = cell.trim();
    if let Ok(value) = cell.parse::<i64>() {
        return Ok(value);
    }
    match cell.parse::<f64>() {
        Ok(value) if value.fract() == 0.0 && value.is_finite() => {
            #[allow(clippy::cast_possible_truncation)]
            Ok(value as i64)
        }
        _ => Err(format!("'{cell}' is not an integer")),
    }
}

/// Parses a duration given either as seconds or as `M分S秒` / `S秒`.
pub fn parse_duration(cell: &str) -> Result<i32, String> {
    let cell = cell.trim();
    let invalid = || format!("'{cell}' is not a duration");

    if let Ok(secs) = cell.parse::<i32>() {
        return Ok(secs);
    }

    let body = cell.strip_suffix('秒').ok_or_else(invalid)?;
    match body.split_once('分') {
        Some((minutes, seconds)) => {
            let minutes: i32 = minutes.trim().parse().map_err(|_| invalid())?;
            let seconds: i32 = if seconds.trim().is_empty() {
                0
            } else {
                seconds.trim().parse().map_err(|_| invalid())?
            };
            Ok(minutes * 60 + seconds)
        }
        None => body.trim().parse().map_err(|_| invalid()),
    }
}

/// Renders seconds the way the sheets write durations.
#[must_use]
pub fn format_duration(secs: i32) -> String {
    if secs < 60 {
        format!("{secs}秒")
    } else {
        format!("{}分{}秒", secs / 60, secs % 60)
    }
}

/// Joins artist names back into a single cell.
#[must_use]
pub fn join_names<S: AsRef<str>>(names: &[S]) -> String {
    names
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(NAME_SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_drops_blank_tokens() {
        let names: Vec<&str> = split_names(" 初音ミク、、 鏡音リン 、").collect();
        assert_eq!(names, vec!["初音ミク", "鏡音リン"]);
        assert_eq!(split_names("   ").count(), 0);
    }

    #[test]
    fn split_keeps_ascii_commas() {
        let names: Vec<&str> = split_names("A, B、C").collect();
        assert_eq!(names, vec!["A, B", "C"]);
    }

    #[test]
    fn pubdate_formats() {
        let full = parse_pubdate("2024-09-01 18:30:05").unwrap();
        assert_eq!(full.to_string(), "2024-09-01 18:30:05");

        let bare = parse_pubdate("2024-09-01").unwrap();
        assert_eq!(bare.to_string(), "2024-09-01 00:00:00");

        assert!(parse_pubdate("yesterday").is_none());
        assert!(parse_pubdate("2024/09/01 18:30").is_none());
    }

    #[test]
    fn int_cells() {
        assert_eq!(parse_int("42"), Ok(42));
        assert_eq!(parse_int(" 42.0 "), Ok(42));
        assert!(parse_int("42.5").is_err());
        assert!(parse_int("n/a").is_err());
    }

    #[test]
    fn durations() {
        assert_eq!(parse_duration("215"), Ok(215));
        assert_eq!(parse_duration("45秒"), Ok(45));
        assert_eq!(parse_duration("3分35秒"), Ok(215));
        assert_eq!(parse_duration("3分秒"), Ok(180));
        assert!(parse_duration("3:35").is_err());
        assert!(parse_duration("分秒").is_err());
    }

    #[test]
    fn duration_display_round_trips() {
        assert_eq!(format_duration(45), "45秒");
        assert_eq!(format_duration(215), "3分35秒");
        assert_eq!(parse_duration(&format_duration(3601)), Ok(3601));
    }

    #[test]
    fn join_uses_separator() {
        assert_eq!(join_names(&["A", "B"]), "A、B");
        assert_eq!(join_names::<&str>(&[]), "");
    }
}
