use std::collections::HashMap;

use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveValue::NotSet, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, IntoActiveModel,
    QueryFilter, QueryOrder, QuerySelect, Set,
};

use crate::domain::ArtistKind;
use crate::entities::{producer, synthesizer, uploader, vocalist};

/// A name-keyed artist table. All four kinds share the `(id, name)` shape.
pub trait ArtistTable: EntityTrait {
    fn id_column() -> Self::Column;
    fn name_column() -> Self::Column;
    fn new_row(name: String) -> Self::ActiveModel;
}

macro_rules! artist_table {
    ($module:ident) => {
        impl ArtistTable for $module::Entity {
            fn id_column() -> Self::Column {
                $module::Column::Id
            }

            fn name_column() -> Self::Column {
                $module::Column::Name
            }

            fn new_row(name: String) -> Self::ActiveModel {
                $module::ActiveModel {
                    id: NotSet,
                    name: Set(name),
                    vocadb_id: NotSet,
                }
            }
        }
    };
}

artist_table!(producer);
artist_table!(synthesizer);
artist_table!(vocalist);
artist_table!(uploader);

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ArtistRow {
    pub id: i32,
    pub kind: ArtistKind,
    pub name: String,
    pub vocadb_id: Option<i32>,
}

pub struct ArtistRepository<'c, C> {
    conn: &'c C,
}

impl<'c, C: ConnectionTrait> ArtistRepository<'c, C> {
    #[must_use]
    pub const fn new(conn: &'c C) -> Self {
        Self { conn }
    }

    /// Every `name -> id` pair of one kind.
    pub async fn name_map(&self, kind: ArtistKind) -> Result<HashMap<String, i32>, DbErr> {
        match kind {
            ArtistKind::Producer => self.load::<producer::Entity>(None).await,
            ArtistKind::Synthesizer => self.load::<synthesizer::Entity>(None).await,
            ArtistKind::Vocalist => self.load::<vocalist::Entity>(None).await,
            ArtistKind::Uploader => self.load::<uploader::Entity>(None).await,
        }
    }

    /// Inserts the names that do not exist yet and returns the id of every
    /// requested name. Names inserted concurrently by another writer are
    /// resolved to that writer's row.
    pub async fn ensure(
        &self,
        kind: ArtistKind,
        names: &[String],
    ) -> Result<HashMap<String, i32>, DbErr> {
        match kind {
            ArtistKind::Producer => self.ensure_in::<producer::Entity>(names).await,
            ArtistKind::Synthesizer => self.ensure_in::<synthesizer::Entity>(names).await,
            ArtistKind::Vocalist => self.ensure_in::<vocalist::Entity>(names).await,
            ArtistKind::Uploader => self.ensure_in::<uploader::Entity>(names).await,
        }
    }

    pub async fn get(&self, kind: ArtistKind, id: i32) -> Result<Option<ArtistRow>, DbErr> {
        let row = match kind {
            ArtistKind::Producer => producer::Entity::find_by_id(id)
                .one(self.conn)
                .await?
                .map(|m| (m.id, m.name, m.vocadb_id)),
            ArtistKind::Synthesizer => synthesizer::Entity::find_by_id(id)
                .one(self.conn)
                .await?
                .map(|m| (m.id, m.name, m.vocadb_id)),
            ArtistKind::Vocalist => vocalist::Entity::find_by_id(id)
                .one(self.conn)
                .await?
                .map(|m| (m.id, m.name, m.vocadb_id)),
            ArtistKind::Uploader => uploader::Entity::find_by_id(id)
                .one(self.conn)
                .await?
                .map(|m| (m.id, m.name, m.vocadb_id)),
        };

        Ok(row.map(|(id, name, vocadb_id)| ArtistRow {
            id,
            kind,
            name,
            vocadb_id,
        }))
    }

    /// Names for a set of ids, ordered by name.
    pub async fn names_for(&self, kind: ArtistKind, ids: &[i32]) -> Result<Vec<String>, DbErr> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        match kind {
            ArtistKind::Producer => self.names_in::<producer::Entity>(ids).await,
            ArtistKind::Synthesizer => self.names_in::<synthesizer::Entity>(ids).await,
            ArtistKind::Vocalist => self.names_in::<vocalist::Entity>(ids).await,
            ArtistKind::Uploader => self.names_in::<uploader::Entity>(ids).await,
        }
    }

    // ========================================================================
    // Generic helpers
    // ========================================================================

    async fn load<E: ArtistTable>(
        &self,
        names: Option<&[String]>,
    ) -> Result<HashMap<String, i32>, DbErr> {
        let mut query = E::find()
            .select_only()
            .column(E::name_column())
            .column(E::id_column());
        if let Some(names) = names {
            query = query.filter(E::name_column().is_in(names.iter().cloned()));
        }

        let rows: Vec<(String, i32)> = query.into_tuple().all(self.conn).await?;
        Ok(rows.into_iter().collect())
    }

    async fn ensure_in<E: ArtistTable>(
        &self,
        names: &[String],
    ) -> Result<HashMap<String, i32>, DbErr>
    where
        E::Model: IntoActiveModel<E::ActiveModel>,
    {
        if names.is_empty() {
            return Ok(HashMap::new());
        }

        E::insert_many(names.iter().cloned().map(E::new_row))
            .on_conflict(OnConflict::column(E::name_column()).do_nothing().to_owned())
            .exec_without_returning(self.conn)
            .await?;

        self.load::<E>(Some(names)).await
    }

    async fn names_in<E: ArtistTable>(&self, ids: &[i32]) -> Result<Vec<String>, DbErr> {
        E::find()
            .select_only()
            .column(E::name_column())
            .filter(E::id_column().is_in(ids.iter().copied()))
            .order_by_asc(E::name_column())
            .into_tuple()
            .all(self.conn)
            .await
    }
}
