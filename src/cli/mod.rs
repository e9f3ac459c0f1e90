//! CLI module - Command-line interface for vocabili
//!
//! This module provides a structured CLI using clap for argument parsing.

mod commands;

use std::ops::RangeInclusive;
use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use crate::db::RankingOrder;
use crate::domain::{Board, Part};

/// vocabili - Vocaloid leaderboard store
/// Imports ranking and data spreadsheets and serves the results
#[derive(Parser)]
#[command(name = "vocabili")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run as background daemon with the nightly streak job
    #[command(alias = "-d", alias = "--daemon")]
    Daemon,

    /// Create default config file
    #[command(alias = "--init")]
    Init,

    /// Import one issue or a range of issues of a ranking
    #[command(alias = "ir")]
    ImportRanking {
        /// Board (daily, weekly, monthly)
        board: Board,
        /// Part (main, new)
        #[arg(default_value = "main")]
        part: Part,
        /// Single issue number
        #[arg(long, conflicts_with = "issues")]
        issue: Option<i32>,
        /// Issue range, e.g. 10..=20
        #[arg(long, value_parser = parse_issue_range)]
        issues: Option<RangeInclusive<i32>>,
        /// Sheet to read instead of the data directory layout
        #[arg(long, requires = "issue")]
        file: Option<PathBuf>,
        /// Reject the sheet when a required cell is blank
        #[arg(long)]
        strict: bool,
    },

    /// Import the daily data sheets of one date or a date range
    #[command(alias = "is")]
    ImportSnapshots {
        #[arg(long, conflicts_with_all = ["from", "to"])]
        date: Option<NaiveDate>,
        #[arg(long, requires = "to")]
        from: Option<NaiveDate>,
        #[arg(long, requires = "from")]
        to: Option<NaiveDate>,
        /// Sheet to read instead of the data directory layout
        #[arg(long, requires = "date")]
        file: Option<PathBuf>,
        #[arg(long)]
        strict: bool,
    },

    /// Import the raw song catalog
    ImportCatalog {
        /// Catalog sheet
        file: PathBuf,
        #[arg(long)]
        strict: bool,
    },

    /// Move videos to the song names listed in a sheet (bvid, name)
    ResolveNames {
        file: PathBuf,
    },

    /// Evaluate video streaks
    UpdateStreaks {
        /// Evaluation date (default: today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Show one page of a ranking issue
    #[command(alias = "r")]
    Ranking {
        board: Board,
        #[arg(default_value = "main")]
        part: Part,
        /// Issue number (default: latest)
        #[arg(long)]
        issue: Option<i32>,
        #[arg(long, default_value = "1")]
        page: u64,
        #[arg(long, default_value = "20")]
        page_size: u64,
        /// Sort key (score, view, favorite, coin, like)
        #[arg(long, default_value = "score")]
        order: RankingOrder,
    },

    /// Show details about a song
    #[command(alias = "s")]
    Song {
        id: i32,
    },
}

/// Parses `a..=b`, `a..b` (exclusive end), `a-b`, or a single issue `n`.
fn parse_issue_range(s: &str) -> Result<RangeInclusive<i32>, String> {
    let number = |v: &str| {
        v.trim()
            .parse::<i32>()
            .map_err(|e| format!("invalid issue '{v}': {e}"))
    };

    let (start, end) = if let Some((a, b)) = s.split_once("..=") {
        (number(a)?, number(b)?)
    } else if let Some((a, b)) = s.split_once("..") {
        (number(a)?, number(b)? - 1)
    } else if let Some((a, b)) = s.split_once('-') {
        (number(a)?, number(b)?)
    } else {
        let n = number(s)?;
        (n, n)
    };

    if start > end {
        return Err(format!("empty issue range '{s}'"));
    }
    Ok(start..=end)
}

pub use commands::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issue_ranges_parse() {
        assert_eq!(parse_issue_range("10..=12").unwrap(), 10..=12);
        assert_eq!(parse_issue_range("10..12").unwrap(), 10..=11);
        assert_eq!(parse_issue_range("3-5").unwrap(), 3..=5);
        assert_eq!(parse_issue_range("7").unwrap(), 7..=7);
        assert!(parse_issue_range("5..=3").is_err());
        assert!(parse_issue_range("x..=3").is_err());
    }

    #[test]
    fn cli_parses_ranking_import() {
        let cli = Cli::try_parse_from([
            "vocabili",
            "import-ranking",
            "weekly",
            "new",
            "--issues",
            "1..=4",
            "--strict",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::ImportRanking {
                board,
                part,
                issues,
                strict,
                ..
            }) => {
                assert_eq!(board, Board::Weekly);
                assert_eq!(part, Part::New);
                assert_eq!(issues, Some(1..=4));
                assert!(strict);
            }
            _ => panic!("expected import-ranking"),
        }
    }
}
