use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "video")]
pub struct Model {
    /// Platform-issued short code, immutable.
    #[sea_orm(primary_key, auto_increment = false)]
    pub bvid: String,
    pub title: String,
    pub pubdate: Option<DateTime>,
    pub uploader_id: Option<i32>,
    pub song_id: i32,
    pub copyright: Option<i16>,
    pub thumbnail: Option<String>,
    /// Seconds.
    pub duration: Option<i32>,
    pub page: Option<i32>,
    pub streak: i32,
    /// Last date the streak was evaluated; `None` until the first run.
    pub streak_date: Option<Date>,
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
        belongs_to = "super::uploader::Entity",
        from = "Column::UploaderId",
        to = "super::uploader::Column::Id",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    Uploader,
    #[sea_orm(has_many = "super::snapshot::Entity")]
    Snapshot,
    #[sea_orm(has_many = "super::ranking::Entity")]
    Ranking,
}

impl Related<super::song::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Song.def()
    }
}

impl Related<super::uploader::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Uploader.def()
    }
}

impl Related<super::snapshot::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Snapshot.def()
    }
}

impl Related<super::ranking::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Ranking.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
