use std::collections::HashMap;

use chrono::{NaiveDate, NaiveDateTime};
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};

use crate::entities::{prelude::*, video};

/// Conflict policy of a video write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoWriteMode {
    /// Existing rows are kept as they are.
    InsertOnly,
    /// Existing rows get their mutable metadata refreshed. The song
    /// reference is never touched here.
    Update,
}

/// Optional columns refreshed in update mode. A `NULL` in the incoming row
/// keeps the stored value.
const COALESCED_COLUMNS: [(video::Column, &str); 6] = [
    (video::Column::Pubdate, "pubdate"),
    (video::Column::UploaderId, "uploader_id"),
    (video::Column::Copyright, "copyright"),
    (video::Column::Thumbnail, "thumbnail"),
    (video::Column::Duration, "duration"),
    (video::Column::Page, "page"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoRecord {
    pub bvid: String,
    pub title: String,
    pub pubdate: Option<NaiveDateTime>,
    pub uploader_id: Option<i32>,
    pub song_id: i32,
    pub copyright: Option<i16>,
    pub thumbnail: Option<String>,
    pub duration: Option<i32>,
    pub page: Option<i32>,
}

impl VideoRecord {
    fn into_active_model(self) -> video::ActiveModel {
        video::ActiveModel {
            bvid: Set(self.bvid),
            title: Set(self.title),
            pubdate: Set(self.pubdate),
            uploader_id: Set(self.uploader_id),
            song_id: Set(self.song_id),
            copyright: Set(self.copyright),
            thumbnail: Set(self.thumbnail),
            duration: Set(self.duration),
            page: Set(self.page),
            streak: Set(0),
            streak_date: Set(None),
        }
    }
}

pub struct VideoRepository<'c, C> {
    conn: &'c C,
}

impl<'c, C: ConnectionTrait> VideoRepository<'c, C> {
    #[must_use]
    pub const fn new(conn: &'c C) -> Self {
        Self { conn }
    }

    /// Every `bvid -> song_id` pair.
    pub async fn song_map(&self) -> Result<HashMap<String, i32>, DbErr> {
        let rows: Vec<(String, i32)> = Video::find()
            .select_only()
            .column(video::Column::Bvid)
            .column(video::Column::SongId)
            .into_tuple()
            .all(self.conn)
            .await?;
        Ok(rows.into_iter().collect())
    }

    pub async fn write(&self, records: Vec<VideoRecord>, mode: VideoWriteMode) -> Result<(), DbErr> {
        if records.is_empty() {
            return Ok(());
        }

        let on_conflict = match mode {
            VideoWriteMode::InsertOnly => OnConflict::column(video::Column::Bvid)
                .do_nothing()
                .to_owned(),
            VideoWriteMode::Update => {
                let mut on_conflict = OnConflict::column(video::Column::Bvid);
                on_conflict.update_column(video::Column::Title);
                for (column, name) in COALESCED_COLUMNS {
                    on_conflict.value(
                        column,
                        Expr::cust(format!(
                            r#"COALESCE("excluded"."{name}", "video"."{name}")"#
                        )),
                    );
                }
                on_conflict
            }
        };

        Video::insert_many(records.into_iter().map(VideoRecord::into_active_model))
            .on_conflict(on_conflict)
            .exec_without_returning(self.conn)
            .await?;
        Ok(())
    }

    /// Re-points a video to another song. Snapshots and rankings keep
    /// referring to the video by `bvid`.
    pub async fn set_song(&self, bvid: &str, song_id: i32) -> Result<u64, DbErr> {
        let res = Video::update_many()
            .col_expr(video::Column::SongId, Expr::value(song_id))
            .filter(video::Column::Bvid.eq(bvid))
            .exec(self.conn)
            .await?;
        Ok(res.rows_affected)
    }

    pub async fn get(&self, bvid: &str) -> Result<Option<video::Model>, DbErr> {
        Video::find_by_id(bvid.to_string()).one(self.conn).await
    }

    pub async fn get_many(&self, bvids: &[String]) -> Result<Vec<video::Model>, DbErr> {
        if bvids.is_empty() {
            return Ok(Vec::new());
        }
        Video::find()
            .filter(video::Column::Bvid.is_in(bvids.iter().cloned()))
            .all(self.conn)
            .await
    }

    pub async fn for_song(&self, song_id: i32) -> Result<Vec<video::Model>, DbErr> {
        Video::find()
            .filter(video::Column::SongId.eq(song_id))
            .order_by_asc(video::Column::Pubdate)
            .all(self.conn)
            .await
    }

    /// Distinct songs of the videos one uploader published, ascending.
    pub async fn songs_by_uploader(&self, uploader_id: i32) -> Result<Vec<i32>, DbErr> {
        Video::find()
            .select_only()
            .column(video::Column::SongId)
            .distinct()
            .filter(video::Column::UploaderId.eq(uploader_id))
            .order_by_asc(video::Column::SongId)
            .into_tuple::<i32>()
            .all(self.conn)
            .await
    }

    // ========================================================================
    // Streak bookkeeping
    // ========================================================================

    /// Forces the streak of every video that ever reached `threshold` views
    /// back to zero. Returns the number of rows touched.
    pub async fn reset_graduated(&self, threshold: i64) -> Result<u64, DbErr> {
        let backend = self.conn.get_database_backend();
        let res = self
            .conn
            .execute(sea_orm::Statement::from_sql_and_values(
                backend,
                r#"UPDATE video SET streak = 0
                   WHERE streak <> 0
                     AND EXISTS (SELECT 1 FROM snapshot s WHERE s.bvid = video.bvid AND s.view >= ?)"#,
                [threshold.into()],
            ))
            .await?;
        Ok(res.rows_affected())
    }

    /// Videos not yet evaluated on `date` that never crossed `threshold`.
    pub async fn streak_candidates(
        &self,
        date: NaiveDate,
        threshold: i64,
    ) -> Result<Vec<(String, i32)>, DbErr> {
        let backend = self.conn.get_database_backend();
        let rows = self
            .conn
            .query_all(sea_orm::Statement::from_sql_and_values(
                backend,
                r#"SELECT bvid, streak FROM video
                   WHERE (streak_date IS NULL OR streak_date < ?)
                     AND NOT EXISTS (SELECT 1 FROM snapshot s WHERE s.bvid = video.bvid AND s.view >= ?)"#,
                [date.into(), threshold.into()],
            ))
            .await?;

        rows.iter()
            .map(|row| Ok((row.try_get("", "bvid")?, row.try_get("", "streak")?)))
            .collect()
    }

    pub async fn set_streak(&self, bvid: &str, streak: i32, date: NaiveDate) -> Result<(), DbErr> {
        Video::update_many()
            .col_expr(video::Column::Streak, Expr::value(streak))
            .col_expr(video::Column::StreakDate, Expr::value(date))
            .filter(video::Column::Bvid.eq(bvid))
            .exec(self.conn)
            .await?;
        Ok(())
    }
}
