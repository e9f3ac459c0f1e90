use sea_orm::entity::prelude::*;

use crate::domain::SongType;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "song")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Identity of the song. Renames move dependents to another row instead
    /// of editing this column.
    #[sea_orm(unique)]
    pub name: String,
    pub r#type: Option<SongType>,
    /// Curated display title, never touched by imports.
    pub display_name: Option<String>,
    pub vocadb_id: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::video::Entity")]
    Video,
    #[sea_orm(has_many = "super::ranking::Entity")]
    Ranking,
    #[sea_orm(has_many = "super::song_producer::Entity")]
    SongProducer,
    #[sea_orm(has_many = "super::song_synthesizer::Entity")]
    SongSynthesizer,
    #[sea_orm(has_many = "super::song_vocalist::Entity")]
    SongVocalist,
}

impl Related<super::video::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Video.def()
    }
}

impl Related<super::ranking::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Ranking.def()
    }
}

impl Related<super::producer::Entity> for Entity {
    fn to() -> RelationDef {
        super::song_producer::Relation::Artist.def()
    }
    fn via() -> Option<RelationDef> {
        Some(super::song_producer::Relation::Song.def().rev())
    }
}

impl Related<super::synthesizer::Entity> for Entity {
    fn to() -> RelationDef {
        super::song_synthesizer::Relation::Artist.def()
    }
    fn via() -> Option<RelationDef> {
        Some(super::song_synthesizer::Relation::Song.def().rev())
    }
}

impl Related<super::vocalist::Entity> for Entity {
    fn to() -> RelationDef {
        super::song_vocalist::Relation::Artist.def()
    }
    fn via() -> Option<RelationDef> {
        Some(super::song_vocalist::Relation::Song.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
