//! Import command handlers

use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use chrono::{Local, NaiveDate};
use futures::StreamExt;

use super::{import_service, open_store};
use crate::config::Config;
use crate::domain::events::ImportEvent;
use crate::domain::{Board, IssueKey, Part};
use crate::services::{ImportService, ImportSummary};
use crate::sheet::{
    CatalogRow, FromRecord, SnapshotRow, SongAssignment, data_sheet_path, ranking_sheet_path,
    read_file,
};

fn load_sheet<T: FromRecord>(path: &Path) -> anyhow::Result<Vec<T>> {
    read_file(path).with_context(|| format!("Failed to read sheet {}", path.display()))
}

fn print_summary(label: &str, summary: &ImportSummary) {
    println!(
        "✓ {label}: {} written, {} dropped, {} batches",
        summary.written, summary.dropped, summary.batches
    );
}

fn print_range_total<K>(results: &[(K, ImportSummary)]) {
    if results.len() < 2 {
        return;
    }
    let mut total = ImportSummary::default();
    for (_, summary) in results {
        total.absorb(*summary);
    }
    print_summary(&format!("{} sheets", results.len()), &total);
}

fn print_event(event: &ImportEvent) {
    match event {
        ImportEvent::RankingImportStarted {
            board,
            part,
            issue,
            total,
        } => println!("Importing {board}/{part} issue {issue} ({total} rows)"),
        ImportEvent::SnapshotImportStarted { date, total } => {
            println!("Importing snapshots of {date} ({total} rows)");
        }
        ImportEvent::CatalogImportStarted { total } => {
            println!("Importing catalog ({total} rows)");
        }
        ImportEvent::BatchCommitted { processed, total } => {
            println!("  {processed}/{total}");
        }
        ImportEvent::ImportFinished { written, dropped } => {
            println!("✓ Done: {written} written, {dropped} dropped");
        }
        ImportEvent::ImportFailed { message } => println!("✗ Failed: {message}"),
    }
}

pub async fn cmd_import_ranking(
    config: &Config,
    board: Board,
    part: Part,
    issue: Option<i32>,
    issues: Option<RangeInclusive<i32>>,
    file: Option<PathBuf>,
    strict: bool,
) -> anyhow::Result<()> {
    let store = open_store(config).await?;
    let service = import_service(store, config);

    if let Some(range) = issues {
        let results = service
            .import_ranking_range(board, part, range.clone(), strict)
            .await?;
        if results.is_empty() {
            println!(
                "No sheets found for {board}/{part} issues {}..={}",
                range.start(),
                range.end()
            );
        }
        for (key, summary) in &results {
            print_summary(&format!("issue {}", key.issue), summary);
        }
        print_range_total(&results);
        return Ok(());
    }

    let Some(issue) = issue else {
        println!("Usage: vocabili import-ranking <board> [part] --issue <n> [--file <sheet>]");
        println!("       vocabili import-ranking <board> [part] --issues <a..=b>");
        return Ok(());
    };

    let key = IssueKey::new(board, part, issue);
    let path = match file {
        Some(path) => path,
        None => ranking_sheet_path(config.data_dir(), key)
            .with_context(|| format!("Issue {issue} predates {board}"))?,
    };
    let rows = load_sheet(&path)?;

    let mut progress = Arc::clone(&service).start_ranking_import(key, rows, strict);
    while let Some(event) = progress.next().await {
        print_event(&event);
        if let ImportEvent::ImportFailed { message } = event {
            anyhow::bail!("Import of {key} failed: {message}");
        }
    }

    Ok(())
}

pub async fn cmd_import_snapshots(
    config: &Config,
    date: Option<NaiveDate>,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    file: Option<PathBuf>,
    strict: bool,
) -> anyhow::Result<()> {
    let store = open_store(config).await?;
    let service = import_service(store, config);

    match (date, from, to) {
        (Some(date), _, _) => {
            let path = file.unwrap_or_else(|| data_sheet_path(config.data_dir(), date));
            let rows: Vec<SnapshotRow> = load_sheet(&path)?;
            let summary = service.import_snapshots(date, rows, strict).await?;
            print_summary(&date.to_string(), &summary);
        }
        (None, Some(from), Some(to)) => {
            let results = service.import_snapshot_range(from, to, strict).await?;
            if results.is_empty() {
                println!("No data sheets found between {from} and {to}");
            }
            for (date, summary) in &results {
                print_summary(&date.to_string(), summary);
            }
            print_range_total(&results);
        }
        _ => {
            println!("Usage: vocabili import-snapshots --date <YYYY-MM-DD> [--file <sheet>]");
            println!("       vocabili import-snapshots --from <YYYY-MM-DD> --to <YYYY-MM-DD>");
        }
    }

    Ok(())
}

pub async fn cmd_import_catalog(config: &Config, file: &Path, strict: bool) -> anyhow::Result<()> {
    let rows: Vec<CatalogRow> = load_sheet(file)?;
    let store = open_store(config).await?;
    let service = import_service(store, config);

    let summary = service.import_catalog(rows, strict).await?;
    print_summary("catalog", &summary);
    Ok(())
}

pub async fn cmd_resolve_names(config: &Config, file: &Path) -> anyhow::Result<()> {
    let assignments: Vec<SongAssignment> = load_sheet(file)?;
    let store = open_store(config).await?;
    let service = import_service(store, config);

    let summary = service.resolve_changed_names(assignments).await?;
    println!(
        "✓ Moved {} videos, created {} songs",
        summary.updated_videos, summary.created_songs
    );
    Ok(())
}

pub async fn cmd_update_streaks(config: &Config, date: Option<NaiveDate>) -> anyhow::Result<()> {
    let date = date.unwrap_or_else(|| Local::now().date_naive());
    let store = open_store(config).await?;
    let service = import_service(store, config);

    let summary = service.update_video_streaks(date).await?;
    println!(
        "✓ Streaks for {date}: {} evaluated, {} reset, {} graduated",
        summary.evaluated, summary.reset, summary.graduated
    );
    Ok(())
}
