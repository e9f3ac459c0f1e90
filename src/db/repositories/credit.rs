use std::collections::HashSet;

use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DbErr, EntityTrait, IntoActiveModel, QueryFilter, QuerySelect,
    Set,
};

use crate::domain::CreditKind;
use crate::entities::{song_producer, song_synthesizer, song_vocalist};

/// A `(song_id, artist_id)` join table.
pub trait CreditTable: EntityTrait {
    fn song_column() -> Self::Column;
    fn artist_column() -> Self::Column;
    fn new_edge(song_id: i32, artist_id: i32) -> Self::ActiveModel;
}

macro_rules! credit_table {
    ($module:ident) => {
        impl CreditTable for $module::Entity {
            fn song_column() -> Self::Column {
                $module::Column::SongId
            }

            fn artist_column() -> Self::Column {
                $module::Column::ArtistId
            }

            fn new_edge(song_id: i32, artist_id: i32) -> Self::ActiveModel {
                $module::ActiveModel {
                    song_id: Set(song_id),
                    artist_id: Set(artist_id),
                }
            }
        }
    };
}

credit_table!(song_producer);
credit_table!(song_synthesizer);
credit_table!(song_vocalist);

pub type Edge = (i32, i32);

pub struct CreditRepository<'c, C> {
    conn: &'c C,
}

impl<'c, C: ConnectionTrait> CreditRepository<'c, C> {
    #[must_use]
    pub const fn new(conn: &'c C) -> Self {
        Self { conn }
    }

    /// Every edge of one relation.
    pub async fn edges(&self, kind: CreditKind) -> Result<HashSet<Edge>, DbErr> {
        match kind {
            CreditKind::Producer => self.load::<song_producer::Entity>(None).await,
            CreditKind::Synthesizer => self.load::<song_synthesizer::Entity>(None).await,
            CreditKind::Vocalist => self.load::<song_vocalist::Entity>(None).await,
        }
    }

    /// Edges of one relation restricted to the given songs.
    pub async fn edges_for_songs(
        &self,
        kind: CreditKind,
        song_ids: &[i32],
    ) -> Result<HashSet<Edge>, DbErr> {
        if song_ids.is_empty() {
            return Ok(HashSet::new());
        }
        match kind {
            CreditKind::Producer => self.load::<song_producer::Entity>(Some(song_ids)).await,
            CreditKind::Synthesizer => {
                self.load::<song_synthesizer::Entity>(Some(song_ids)).await
            }
            CreditKind::Vocalist => self.load::<song_vocalist::Entity>(Some(song_ids)).await,
        }
    }

    /// Artist ids credited on one song.
    pub async fn artists_of(&self, kind: CreditKind, song_id: i32) -> Result<Vec<i32>, DbErr> {
        let edges = self.edges_for_songs(kind, &[song_id]).await?;
        let mut ids: Vec<i32> = edges.into_iter().map(|(_, artist)| artist).collect();
        ids.sort_unstable();
        Ok(ids)
    }

    /// Song ids credited to one artist.
    pub async fn songs_of(&self, kind: CreditKind, artist_id: i32) -> Result<Vec<i32>, DbErr> {
        match kind {
            CreditKind::Producer => self.songs_in::<song_producer::Entity>(artist_id).await,
            CreditKind::Synthesizer => self.songs_in::<song_synthesizer::Entity>(artist_id).await,
            CreditKind::Vocalist => self.songs_in::<song_vocalist::Entity>(artist_id).await,
        }
    }

    /// Adds edges, ignoring the ones already present.
    pub async fn insert(&self, kind: CreditKind, edges: &[Edge]) -> Result<(), DbErr> {
        if edges.is_empty() {
            return Ok(());
        }
        match kind {
            CreditKind::Producer => self.insert_in::<song_producer::Entity>(edges).await,
            CreditKind::Synthesizer => self.insert_in::<song_synthesizer::Entity>(edges).await,
            CreditKind::Vocalist => self.insert_in::<song_vocalist::Entity>(edges).await,
        }
    }

    /// Deletes every edge of the given songs.
    pub async fn delete_for_songs(&self, kind: CreditKind, song_ids: &[i32]) -> Result<u64, DbErr> {
        if song_ids.is_empty() {
            return Ok(0);
        }
        match kind {
            CreditKind::Producer => self.delete_in::<song_producer::Entity>(song_ids).await,
            CreditKind::Synthesizer => self.delete_in::<song_synthesizer::Entity>(song_ids).await,
            CreditKind::Vocalist => self.delete_in::<song_vocalist::Entity>(song_ids).await,
        }
    }

    // ========================================================================
    // Generic helpers
    // ========================================================================

    async fn load<E: CreditTable>(&self, song_ids: Option<&[i32]>) -> Result<HashSet<Edge>, DbErr> {
        let mut query = E::find()
            .select_only()
            .column(E::song_column())
            .column(E::artist_column());
        if let Some(ids) = song_ids {
            query = query.filter(E::song_column().is_in(ids.iter().copied()));
        }

        let rows: Vec<Edge> = query.into_tuple().all(self.conn).await?;
        Ok(rows.into_iter().collect())
    }

    async fn songs_in<E: CreditTable>(&self, artist_id: i32) -> Result<Vec<i32>, DbErr> {
        E::find()
            .select_only()
            .column(E::song_column())
            .filter(E::artist_column().eq(artist_id))
            .into_tuple()
            .all(self.conn)
            .await
    }

    async fn insert_in<E: CreditTable>(&self, edges: &[Edge]) -> Result<(), DbErr>
    where
        E::Model: IntoActiveModel<E::ActiveModel>,
    {
        E::insert_many(
            edges
                .iter()
                .map(|&(song_id, artist_id)| E::new_edge(song_id, artist_id)),
        )
        .on_conflict(
            OnConflict::columns([E::song_column(), E::artist_column()])
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(self.conn)
        .await?;
        Ok(())
    }

    async fn delete_in<E: CreditTable>(&self, song_ids: &[i32]) -> Result<u64, DbErr> {
        let res = E::delete_many()
            .filter(E::song_column().is_in(song_ids.iter().copied()))
            .exec(self.conn)
            .await?;
        Ok(res.rows_affected)
    }
}
