use std::collections::HashMap;

use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveValue::NotSet, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde::{Deserialize, Serialize};

use crate::domain::{Board, IssueKey, Part};
use crate::entities::{prelude::*, ranking};

/// Sort key of a ranking page. Each maps to the matching sub-rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RankingOrder {
    #[default]
    Score,
    View,
    Favorite,
    Coin,
    Like,
}

impl RankingOrder {
    const fn column(self) -> ranking::Column {
        match self {
            Self::Score => ranking::Column::Rank,
            Self::View => ranking::Column::ViewRank,
            Self::Favorite => ranking::Column::FavoriteRank,
            Self::Coin => ranking::Column::CoinRank,
            Self::Like => ranking::Column::LikeRank,
        }
    }
}

impl std::str::FromStr for RankingOrder {
    type Err = crate::domain::UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "score" | "rank" => Ok(Self::Score),
            "view" => Ok(Self::View),
            "favorite" => Ok(Self::Favorite),
            "coin" => Ok(Self::Coin),
            "like" => Ok(Self::Like),
            other => Err(crate::domain::UnknownValue {
                what: "ranking order",
                value: other.to_string(),
            }),
        }
    }
}

/// A ranking row ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRanking {
    pub key: IssueKey,
    pub rank: i32,
    pub song_id: i32,
    pub bvid: String,
    pub count: Option<i32>,
    pub point: i64,
    pub view: i64,
    pub favorite: i64,
    pub coin: i64,
    pub like: i64,
    pub view_rank: i32,
    pub favorite_rank: i32,
    pub coin_rank: i32,
    pub like_rank: i32,
}

impl NewRanking {
    fn into_active_model(self) -> ranking::ActiveModel {
        ranking::ActiveModel {
            id: NotSet,
            board: Set(self.key.board),
            part: Set(self.key.part),
            issue: Set(self.key.issue),
            rank: Set(self.rank),
            song_id: Set(self.song_id),
            bvid: Set(self.bvid),
            count: Set(self.count),
            point: Set(self.point),
            view: Set(self.view),
            favorite: Set(self.favorite),
            coin: Set(self.coin),
            like: Set(self.like),
            view_rank: Set(self.view_rank),
            favorite_rank: Set(self.favorite_rank),
            coin_rank: Set(self.coin_rank),
            like_rank: Set(self.like_rank),
        }
    }
}

pub struct RankingRepository<'c, C> {
    conn: &'c C,
}

impl<'c, C: ConnectionTrait> RankingRepository<'c, C> {
    #[must_use]
    pub const fn new(conn: &'c C) -> Self {
        Self { conn }
    }

    pub async fn delete_issue(&self, key: IssueKey) -> Result<u64, DbErr> {
        let res = Ranking::delete_many()
            .filter(ranking::Column::Board.eq(key.board))
            .filter(ranking::Column::Part.eq(key.part))
            .filter(ranking::Column::Issue.eq(key.issue))
            .exec(self.conn)
            .await?;
        Ok(res.rows_affected)
    }

    /// Inserts rows, ignoring any that collide on `(board, part, issue, bvid)`.
    pub async fn insert(&self, rows: Vec<NewRanking>) -> Result<(), DbErr> {
        if rows.is_empty() {
            return Ok(());
        }

        Ranking::insert_many(rows.into_iter().map(NewRanking::into_active_model))
            .on_conflict(
                OnConflict::columns([
                    ranking::Column::Board,
                    ranking::Column::Part,
                    ranking::Column::Issue,
                    ranking::Column::Bvid,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(self.conn)
            .await?;
        Ok(())
    }

    pub async fn count_issue(&self, key: IssueKey) -> Result<u64, DbErr> {
        Ranking::find()
            .filter(ranking::Column::Board.eq(key.board))
            .filter(ranking::Column::Part.eq(key.part))
            .filter(ranking::Column::Issue.eq(key.issue))
            .count(self.conn)
            .await
    }

    pub async fn latest_issue(&self, board: Board, part: Part) -> Result<Option<i32>, DbErr> {
        Ranking::find()
            .select_only()
            .column_as(ranking::Column::Issue.max(), "issue")
            .filter(ranking::Column::Board.eq(board))
            .filter(ranking::Column::Part.eq(part))
            .into_tuple::<Option<i32>>()
            .one(self.conn)
            .await
            .map(Option::flatten)
    }

    /// One page of an issue plus the total row count of that issue.
    pub async fn page(
        &self,
        key: IssueKey,
        order: RankingOrder,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<ranking::Model>, u64), DbErr> {
        let paginator = Ranking::find()
            .filter(ranking::Column::Board.eq(key.board))
            .filter(ranking::Column::Part.eq(key.part))
            .filter(ranking::Column::Issue.eq(key.issue))
            .order_by_asc(order.column())
            .order_by_asc(ranking::Column::Rank)
            .paginate(self.conn, page_size);

        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((items, total))
    }

    /// Entries of one issue for the given videos, keyed by `bvid`.
    pub async fn entries_for(
        &self,
        key: IssueKey,
        bvids: &[String],
    ) -> Result<HashMap<String, ranking::Model>, DbErr> {
        if bvids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows = Ranking::find()
            .filter(ranking::Column::Board.eq(key.board))
            .filter(ranking::Column::Part.eq(key.part))
            .filter(ranking::Column::Issue.eq(key.issue))
            .filter(ranking::Column::Bvid.is_in(bvids.iter().cloned()))
            .all(self.conn)
            .await?;
        Ok(rows.into_iter().map(|m| (m.bvid.clone(), m)).collect())
    }

    /// Entries of one song, newest issue first.
    pub async fn for_song(
        &self,
        song_id: i32,
        board: Option<Board>,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<ranking::Model>, u64), DbErr> {
        let mut query = Ranking::find().filter(ranking::Column::SongId.eq(song_id));
        if let Some(board) = board {
            query = query.filter(ranking::Column::Board.eq(board));
        }

        let paginator = query
            .order_by_desc(ranking::Column::Issue)
            .order_by_asc(ranking::Column::Board)
            .order_by_asc(ranking::Column::Part)
            .paginate(self.conn, page_size);

        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((items, total))
    }
}
