use std::collections::HashMap;

use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveValue::NotSet, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter,
    QuerySelect, Set,
};

use crate::domain::SongType;
use crate::entities::{prelude::*, song};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SongUpsert {
    pub name: String,
    pub song_type: Option<SongType>,
}

pub struct SongRepository<'c, C> {
    conn: &'c C,
}

impl<'c, C: ConnectionTrait> SongRepository<'c, C> {
    #[must_use]
    pub const fn new(conn: &'c C) -> Self {
        Self { conn }
    }

    pub async fn name_map(&self) -> Result<HashMap<String, i32>, DbErr> {
        let rows: Vec<(String, i32)> = Song::find()
            .select_only()
            .column(song::Column::Name)
            .column(song::Column::Id)
            .into_tuple()
            .all(self.conn)
            .await?;
        Ok(rows.into_iter().collect())
    }

    /// Inserts new songs and refreshes the type of existing ones. A missing
    /// type never clears a stored one.
    pub async fn upsert(&self, songs: &[SongUpsert]) -> Result<HashMap<String, i32>, DbErr> {
        if songs.is_empty() {
            return Ok(HashMap::new());
        }

        let models = songs.iter().map(|s| song::ActiveModel {
            id: NotSet,
            name: Set(s.name.clone()),
            r#type: Set(s.song_type),
            display_name: NotSet,
            vocadb_id: NotSet,
        });

        Song::insert_many(models)
            .on_conflict(
                OnConflict::column(song::Column::Name)
                    .value(
                        song::Column::Type,
                        Expr::cust(r#"COALESCE("excluded"."type", "song"."type")"#),
                    )
                    .to_owned(),
            )
            .exec_without_returning(self.conn)
            .await?;

        let names: Vec<String> = songs.iter().map(|s| s.name.clone()).collect();
        self.ids_for(&names).await
    }

    /// Inserts bare song rows for names that do not exist yet; existing rows
    /// are left untouched. Returns the id of every requested name and the
    /// number of rows this call inserted.
    pub async fn ensure_names(
        &self,
        names: &[String],
    ) -> Result<(HashMap<String, i32>, u64), DbErr> {
        if names.is_empty() {
            return Ok((HashMap::new(), 0));
        }

        let models = names.iter().map(|name| song::ActiveModel {
            id: NotSet,
            name: Set(name.clone()),
            r#type: NotSet,
            display_name: NotSet,
            vocadb_id: NotSet,
        });

        let inserted = Song::insert_many(models)
            .on_conflict(OnConflict::column(song::Column::Name).do_nothing().to_owned())
            .exec_without_returning(self.conn)
            .await?;

        Ok((self.ids_for(names).await?, inserted))
    }

    pub async fn ids_for(&self, names: &[String]) -> Result<HashMap<String, i32>, DbErr> {
        if names.is_empty() {
            return Ok(HashMap::new());
        }
        let rows: Vec<(String, i32)> = Song::find()
            .select_only()
            .column(song::Column::Name)
            .column(song::Column::Id)
            .filter(song::Column::Name.is_in(names.iter().cloned()))
            .into_tuple()
            .all(self.conn)
            .await?;
        Ok(rows.into_iter().collect())
    }

    pub async fn get(&self, id: i32) -> Result<Option<song::Model>, DbErr> {
        Song::find_by_id(id).one(self.conn).await
    }

    pub async fn get_many(&self, ids: &[i32]) -> Result<Vec<song::Model>, DbErr> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        Song::find()
            .filter(song::Column::Id.is_in(ids.iter().copied()))
            .all(self.conn)
            .await
    }

    pub async fn find_by_name(&self, name: &str) -> Result<Option<song::Model>, DbErr> {
        Song::find()
            .filter(song::Column::Name.eq(name))
            .one(self.conn)
            .await
    }
}
