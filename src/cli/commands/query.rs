//! Read-only command handlers

use super::open_store;
use crate::config::Config;
use crate::db::RankingOrder;
use crate::domain::{Board, Part};
use crate::services::{IssueSelector, QueryService, RankingQuery, SeaOrmQueryService};
use crate::sheet::{format_duration, join_names};

fn signed(delta: i64) -> String {
    match delta {
        0 => "=".to_string(),
        d if d > 0 => format!("+{d}"),
        d => d.to_string(),
    }
}

pub async fn cmd_ranking(
    config: &Config,
    board: Board,
    part: Part,
    issue: Option<i32>,
    page: u64,
    page_size: u64,
    order: RankingOrder,
) -> anyhow::Result<()> {
    let store = open_store(config).await?;
    let queries = SeaOrmQueryService::new(store);

    let result = queries
        .ranking(RankingQuery {
            board,
            part,
            issue: issue.map_or(IssueSelector::Latest, IssueSelector::Number),
            order,
            page,
            page_size,
        })
        .await?;

    let Some(first) = result.items.first() else {
        println!("No entries on page {}.", result.page);
        return Ok(());
    };

    println!(
        "{}/{} issue {} (page {}, {} entries total)",
        board, part, first.ranking.issue, result.page, result.total
    );
    println!("{:-<70}", "");

    for entry in &result.items {
        // A lower rank than last issue is a climb.
        let movement = entry.previous.map_or_else(
            || "NEW".to_string(),
            |prev| signed(i64::from(prev.rank) - i64::from(entry.ranking.rank)),
        );
        println!(
            "#{:<4} {:>6} {}  [{}]",
            entry.ranking.rank, movement, entry.song.name, entry.video.bvid
        );
        println!(
            "      point {} | view {} | favorite {} | coin {} | like {}",
            entry.ranking.point,
            entry.ranking.view,
            entry.ranking.favorite,
            entry.ranking.coin,
            entry.ranking.like
        );
    }

    Ok(())
}

pub async fn cmd_song(config: &Config, id: i32) -> anyhow::Result<()> {
    let store = open_store(config).await?;
    let queries = SeaOrmQueryService::new(store);
    let detail = queries.song(id).await?;

    println!("{} (ID: {})", detail.song.name, detail.song.id);
    if let Some(song_type) = detail.song.song_type {
        println!("  Type:         {}", song_type.sheet_label());
    }
    println!("  Producers:    {}", join_names(&detail.producers));
    println!("  Synthesizers: {}", join_names(&detail.synthesizers));
    println!("  Vocalists:    {}", join_names(&detail.vocalists));
    println!();
    println!("Videos ({}):", detail.videos.len());
    for video in &detail.videos {
        let pubdate = video
            .pubdate
            .map_or_else(|| "unknown date".to_string(), |d| d.to_string());
        let duration = video
            .duration
            .map(format_duration)
            .unwrap_or_default();
        println!("  {} {} ({pubdate}) {duration}", video.bvid, video.title);
    }

    let history = queries.song_rankings(id, None, 1, 10).await?;
    if !history.items.is_empty() {
        println!();
        println!("Recent rankings ({} total):", history.total);
        for entry in &history.items {
            println!(
                "  {}/{} #{}: rank {}",
                entry.board, entry.part, entry.issue, entry.rank
            );
        }
    }

    Ok(())
}
