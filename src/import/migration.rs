//! Moves videos to another song when the sheet prints a different song name
//! than the one they currently belong to.
//!
//! Song rows are never renamed: two unrelated videos may share a song name
//! by coincidence, so a rename is a move to a (possibly new) song row. The
//! song left behind stays in place even if nothing references it anymore.

use std::collections::{BTreeSet, HashMap};

use sea_orm::{ConnectionTrait, DbErr};
use serde::Serialize;
use tracing::{debug, info};

use super::cache::{CacheSubset, ImportCache};
use crate::db::{SongRepository, VideoRepository};
use crate::sheet::SongAssignment;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MigrationSummary {
    pub created_songs: usize,
    pub updated_videos: usize,
}

/// Keeps the last assignment per video, in first-seen order.
fn last_per_video(assignments: &[SongAssignment]) -> Vec<&SongAssignment> {
    let mut order: Vec<&SongAssignment> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for assignment in assignments {
        match index.get(assignment.bvid.as_str()) {
            Some(&at) => order[at] = assignment,
            None => {
                index.insert(assignment.bvid.as_str(), order.len());
                order.push(assignment);
            }
        }
    }
    order
}

pub async fn resolve_changed_names<C: ConnectionTrait>(
    conn: &C,
    cache: &mut ImportCache,
    assignments: &[SongAssignment],
) -> Result<MigrationSummary, DbErr> {
    cache
        .ensure_loaded(conn, &[CacheSubset::Videos, CacheSubset::Songs])
        .await?;

    let assignments = last_per_video(assignments);
    let mut moves: Vec<(&str, i32)> = Vec::new();
    let mut missing: BTreeSet<&str> = BTreeSet::new();
    let mut pending: Vec<&SongAssignment> = Vec::new();

    for &assignment in &assignments {
        let Some(current) = cache.video_song_id(&assignment.bvid) else {
            continue;
        };
        match cache.song_id(&assignment.name) {
            Some(target) if target != current => moves.push((assignment.bvid.as_str(), target)),
            Some(_) => {}
            None => {
                missing.insert(assignment.name.as_str());
                pending.push(assignment);
            }
        }
    }

    let mut summary = MigrationSummary::default();

    if !missing.is_empty() {
        let names: Vec<String> = missing.iter().map(ToString::to_string).collect();
        let (ids, inserted) = SongRepository::new(conn).ensure_names(&names).await?;
        summary.created_songs = usize::try_from(inserted).unwrap_or(usize::MAX);
        info!(
            songs = summary.created_songs,
            resolved = ids.len(),
            "Created songs for renamed videos"
        );
        cache.merge_songs(ids);

        for assignment in pending {
            if let Some(target) = cache.song_id(&assignment.name) {
                moves.push((assignment.bvid.as_str(), target));
            }
        }
    }

    let videos = VideoRepository::new(conn);
    for (bvid, song_id) in moves {
        let updated = videos.set_song(bvid, song_id).await?;
        if updated > 0 {
            debug!(bvid = bvid, song_id = song_id, "Moved video to song");
            cache.set_video_song(bvid, song_id);
            summary.updated_videos += 1;
        }
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assign(bvid: &str, name: &str) -> SongAssignment {
        SongAssignment {
            bvid: bvid.to_string(),
            name: name.to_string(),
        }
    }

    #[test]
    fn last_assignment_per_video_wins() {
        let input = vec![assign("BV1", "A"), assign("BV2", "B"), assign("BV1", "C")];
        let kept = last_per_video(&input);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].name, "C");
        assert_eq!(kept[1].name, "B");
    }
}
