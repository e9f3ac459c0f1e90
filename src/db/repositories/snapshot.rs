use std::collections::HashMap;

use chrono::NaiveDate;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DbErr, EntityTrait, FromQueryResult, QueryFilter, QueryOrder,
    Set, Statement,
};
use serde::Serialize;

use crate::entities::{prelude::*, snapshot};

/// Counters of one video on one date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotCounters {
    pub bvid: String,
    pub date: NaiveDate,
    pub view: i64,
    pub favorite: i64,
    pub coin: i64,
    pub like: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SnapshotPoint {
    pub date: NaiveDate,
    pub view: i64,
    pub favorite: i64,
    pub coin: i64,
    pub like: i64,
}

impl From<snapshot::Model> for SnapshotPoint {
    fn from(m: snapshot::Model) -> Self {
        Self {
            date: m.date,
            view: m.view,
            favorite: m.favorite,
            coin: m.coin,
            like: m.like,
        }
    }
}

#[derive(Debug, FromQueryResult)]
struct PriorView {
    bvid: String,
    date: NaiveDate,
    view: i64,
}

pub struct SnapshotRepository<'c, C> {
    conn: &'c C,
}

impl<'c, C: ConnectionTrait> SnapshotRepository<'c, C> {
    #[must_use]
    pub const fn new(conn: &'c C) -> Self {
        Self { conn }
    }

    pub async fn delete_date(&self, date: NaiveDate) -> Result<u64, DbErr> {
        let res = Snapshot::delete_many()
            .filter(snapshot::Column::Date.eq(date))
            .exec(self.conn)
            .await?;
        Ok(res.rows_affected)
    }

    /// Writes counters keyed by `(bvid, date)`, overwriting all four on
    /// conflict.
    pub async fn upsert(&self, rows: Vec<SnapshotCounters>) -> Result<(), DbErr> {
        if rows.is_empty() {
            return Ok(());
        }

        let models = rows.into_iter().map(|r| snapshot::ActiveModel {
            bvid: Set(r.bvid),
            date: Set(r.date),
            view: Set(r.view),
            favorite: Set(r.favorite),
            coin: Set(r.coin),
            like: Set(r.like),
        });

        Snapshot::insert_many(models)
            .on_conflict(
                OnConflict::columns([snapshot::Column::Bvid, snapshot::Column::Date])
                    .update_columns([
                        snapshot::Column::View,
                        snapshot::Column::Favorite,
                        snapshot::Column::Coin,
                        snapshot::Column::Like,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(self.conn)
            .await?;
        Ok(())
    }

    /// View counts of every video with a snapshot on `date`.
    pub async fn views_on(&self, date: NaiveDate) -> Result<HashMap<String, i64>, DbErr> {
        let rows = Snapshot::find()
            .filter(snapshot::Column::Date.eq(date))
            .all(self.conn)
            .await?;
        Ok(rows.into_iter().map(|m| (m.bvid, m.view)).collect())
    }

    /// The most recent snapshot strictly before `date`, per video.
    pub async fn latest_before(
        &self,
        date: NaiveDate,
    ) -> Result<HashMap<String, (NaiveDate, i64)>, DbErr> {
        let backend = self.conn.get_database_backend();
        let rows = PriorView::find_by_statement(Statement::from_sql_and_values(
            backend,
            r#"SELECT bvid, date, view FROM (
                   SELECT bvid, date, view,
                          ROW_NUMBER() OVER (PARTITION BY bvid ORDER BY date DESC) AS rn
                   FROM snapshot
                   WHERE date < ?
               ) WHERE rn = 1"#,
            [date.into()],
        ))
        .all(self.conn)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| (r.bvid, (r.date, r.view)))
            .collect())
    }

    pub async fn for_video(
        &self,
        bvid: &str,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<SnapshotPoint>, DbErr> {
        let mut query = Snapshot::find().filter(snapshot::Column::Bvid.eq(bvid));
        if let Some(from) = from {
            query = query.filter(snapshot::Column::Date.gte(from));
        }
        if let Some(to) = to {
            query = query.filter(snapshot::Column::Date.lte(to));
        }

        let rows = query
            .order_by_asc(snapshot::Column::Date)
            .all(self.conn)
            .await?;
        Ok(rows.into_iter().map(SnapshotPoint::from).collect())
    }

    pub async fn count_on(&self, date: NaiveDate) -> Result<u64, DbErr> {
        use sea_orm::PaginatorTrait;

        Snapshot::find()
            .filter(snapshot::Column::Date.eq(date))
            .count(self.conn)
            .await
    }
}
