//! Voice synthesis engine credit target.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "synthesizer")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub name: String,
    pub vocadb_id: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::song_synthesizer::Entity")]
    Credits,
}

impl Related<super::song_synthesizer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Credits.def()
    }
}

impl Related<super::song::Entity> for Entity {
    fn to() -> RelationDef {
        super::song_synthesizer::Relation::Song.def()
    }
    fn via() -> Option<RelationDef> {
        Some(super::song_synthesizer::Relation::Artist.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
