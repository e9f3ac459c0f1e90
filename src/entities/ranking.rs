use sea_orm::entity::prelude::*;

use crate::domain::{Board, Part};

/// One entry of a published issue. Unique per (board, part, issue, bvid);
/// see the migration for the index.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "ranking")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub board: Board,
    pub part: Part,
    pub issue: i32,
    pub rank: i32,
    pub song_id: i32,
    pub bvid: String,
    /// Times on the board; main part only.
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

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::song::Entity",
        from = "Column::SongId",
        to = "super::song::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Song,
    #[sea_orm(
        belongs_to = "super::video::Entity",
        from = "Column::Bvid",
        to = "super::video::Column::Bvid",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Video,
}

impl Related<super::song::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Song.def()
    }
}

impl Related<super::video::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Video.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
