//! Daily streak bookkeeping.
//!
//! A video's streak counts consecutive evaluations with slow view growth.
//! Fast growth resets it, and a video that ever reached the graduation
//! threshold is pinned at zero for good.

use chrono::NaiveDate;
use sea_orm::{ConnectionTrait, DbErr};
use serde::Serialize;
use tracing::{debug, info};

use crate::config::StreakConfig;
use crate::db::{SnapshotRepository, VideoRepository};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StreakSummary {
    /// Graduated videos whose streak was forced back to zero.
    pub graduated: u64,
    pub evaluated: usize,
    pub reset: usize,
}

/// What is known about one video on the evaluation date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreakObservation {
    pub streak: i32,
    /// Views on the evaluation date, if a snapshot exists.
    pub today: Option<i64>,
    /// Latest snapshot before the evaluation date.
    pub prior: Option<(NaiveDate, i64)>,
}

/// Next streak value of a video that has not graduated.
#[must_use]
pub fn next_streak(obs: StreakObservation, date: NaiveDate, growth_per_day: i64) -> i32 {
    let Some(today) = obs.today else {
        return obs.streak.saturating_add(1);
    };
    let Some((prior_date, prior_view)) = obs.prior else {
        return 0;
    };

    let days = (date - prior_date).num_days().max(1);
    if today - prior_view >= growth_per_day.saturating_mul(days) {
        0
    } else {
        obs.streak.saturating_add(1)
    }
}

/// Evaluates every video not yet evaluated on `date`.
pub async fn update_video_streaks<C: ConnectionTrait>(
    conn: &C,
    date: NaiveDate,
    thresholds: StreakConfig,
) -> Result<StreakSummary, DbErr> {
    let videos = VideoRepository::new(conn);
    let snapshots = SnapshotRepository::new(conn);

    let mut summary = StreakSummary {
        graduated: videos.reset_graduated(thresholds.graduation_views).await?,
        ..StreakSummary::default()
    };

    let candidates = videos
        .streak_candidates(date, thresholds.graduation_views)
        .await?;
    if candidates.is_empty() {
        debug!(date = %date, "No videos to evaluate");
        return Ok(summary);
    }

    let today = snapshots.views_on(date).await?;
    let prior = snapshots.latest_before(date).await?;

    for (bvid, streak) in candidates {
        let obs = StreakObservation {
            streak,
            today: today.get(&bvid).copied(),
            prior: prior.get(&bvid).copied(),
        };
        let next = next_streak(obs, date, thresholds.growth_per_day);
        if next == 0 && streak != 0 {
            summary.reset += 1;
        }
        videos.set_streak(&bvid, next, date).await?;
        summary.evaluated += 1;
    }

    info!(
        event = "streaks_updated",
        date = %date,
        evaluated = summary.evaluated,
        reset = summary.reset,
        graduated = summary.graduated,
        "Video streaks updated"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 9, d).unwrap()
    }

    #[test]
    fn first_snapshot_starts_at_zero() {
        let obs = StreakObservation {
            streak: 4,
            today: Some(1000),
            prior: None,
        };
        assert_eq!(next_streak(obs, day(1), 100), 0);
    }

    #[test]
    fn slow_growth_increments() {
        let obs = StreakObservation {
            streak: 0,
            today: Some(1050),
            prior: Some((day(1), 1000)),
        };
        assert_eq!(next_streak(obs, day(2), 100), 1);
    }

    #[test]
    fn fast_growth_resets() {
        let obs = StreakObservation {
            streak: 1,
            today: Some(1300),
            prior: Some((day(2), 1050)),
        };
        assert_eq!(next_streak(obs, day(3), 100), 0);
    }

    #[test]
    fn growth_is_averaged_over_gap() {
        // 250 views over 3 days is below 100/day.
        let obs = StreakObservation {
            streak: 2,
            today: Some(1250),
            prior: Some((day(1), 1000)),
        };
        assert_eq!(next_streak(obs, day(4), 100), 3);
    }

    #[test]
    fn exact_threshold_resets() {
        let obs = StreakObservation {
            streak: 2,
            today: Some(1100),
            prior: Some((day(1), 1000)),
        };
        assert_eq!(next_streak(obs, day(2), 100), 0);
    }

    #[test]
    fn missing_snapshot_increments() {
        let obs = StreakObservation {
            streak: 3,
            today: None,
            prior: Some((day(1), 1000)),
        };
        assert_eq!(next_streak(obs, day(5), 100), 4);
    }
}
