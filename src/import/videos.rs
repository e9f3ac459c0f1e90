use std::collections::HashMap;

use sea_orm::{ConnectionTrait, DbErr};
use tracing::{debug, warn};

use super::cache::ImportCache;
use crate::constants::metrics as metric_names;
use crate::db::{VideoRecord, VideoRepository, VideoWriteMode};
use crate::domain::ArtistKind;
use crate::sheet::SheetRow;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VideoSummary {
    pub written: usize,
    /// Rows whose song did not resolve.
    pub dropped: usize,
}

/// Keeps the last row per video id, in first-seen order.
pub(super) fn last_per_video<R: SheetRow>(rows: &[R]) -> Vec<&R> {
    let mut order: Vec<&R> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for row in rows {
        let bvid = row.video().bvid.as_str();
        match index.get(bvid) {
            Some(&at) => order[at] = row,
            None => {
                index.insert(bvid, order.len());
                order.push(row);
            }
        }
    }
    order
}

/// Writes the videos of `rows`. Insert-only mode skips videos the cache
/// already knows; update mode refreshes their metadata.
pub async fn upsert_videos<C: ConnectionTrait, R: SheetRow>(
    conn: &C,
    cache: &mut ImportCache,
    rows: &[R],
    mode: VideoWriteMode,
) -> Result<VideoSummary, DbErr> {
    let mut summary = VideoSummary::default();
    let mut records = Vec::new();

    for row in last_per_video(rows) {
        let video = row.video();
        if mode == VideoWriteMode::InsertOnly && cache.has_video(&video.bvid) {
            continue;
        }

        let song_id = row.song().name.as_deref().and_then(|name| cache.song_id(name));
        let Some(song_id) = song_id else {
            summary.dropped += 1;
            warn!(
                bvid = %video.bvid,
                song = row.song().name.as_deref().unwrap_or(""),
                line = row.line(),
                "Video song did not resolve, skipping"
            );
            continue;
        };

        let uploader_id = video
            .uploader
            .as_deref()
            .and_then(|name| cache.artist_id(ArtistKind::Uploader, name));
        if uploader_id.is_none() && video.uploader.is_some() {
            debug!(bvid = %video.bvid, "Uploader did not resolve, leaving it unset");
        }

        records.push(VideoRecord {
            bvid: video.bvid.clone(),
            title: video.title.clone(),
            pubdate: video.pubdate,
            uploader_id,
            song_id,
            copyright: video.copyright,
            thumbnail: video.image_url.clone(),
            duration: video.duration,
            page: video.page,
        });
    }

    if summary.dropped > 0 {
        metrics::counter!(
            metric_names::ROWS_DROPPED_TOTAL,
            "kind" => "video",
            "reason" => "unresolved_song"
        )
        .increment(summary.dropped as u64);
    }

    if records.is_empty() {
        return Ok(summary);
    }

    let written: Vec<(String, i32)> = records
        .iter()
        .map(|r| (r.bvid.clone(), r.song_id))
        .collect();
    summary.written = written.len();

    VideoRepository::new(conn).write(records, mode).await?;
    debug!(videos = summary.written, mode = ?mode, "Wrote videos");
    cache.merge_videos(written);

    Ok(summary)
}
