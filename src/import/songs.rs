use std::collections::HashMap;

use sea_orm::{ConnectionTrait, DbErr};
use tracing::debug;

use super::cache::ImportCache;
use crate::db::{SongRepository, SongUpsert};
use crate::sheet::SheetRow;

/// One upsert value per song name, in first-seen order. A later row's type
/// replaces an earlier one; a blank type never replaces a filled one.
pub fn distinct_songs<R: SheetRow>(rows: &[R]) -> Vec<SongUpsert> {
    let mut order: Vec<SongUpsert> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for row in rows {
        let song = row.song();
        let Some(name) = song.name.as_deref() else {
            continue;
        };

        match index.get(name) {
            Some(&at) => {
                if song.song_type.is_some() {
                    order[at].song_type = song.song_type;
                }
            }
            None => {
                index.insert(name, order.len());
                order.push(SongUpsert {
                    name: name.to_string(),
                    song_type: song.song_type,
                });
            }
        }
    }

    order
}

/// Upserts every song named in `rows` and returns the names that were not
/// in the cache before.
pub async fn upsert_songs<C: ConnectionTrait, R: SheetRow>(
    conn: &C,
    cache: &mut ImportCache,
    rows: &[R],
) -> Result<Vec<String>, DbErr> {
    let songs = distinct_songs(rows);
    if songs.is_empty() {
        return Ok(Vec::new());
    }

    let new_names: Vec<String> = songs
        .iter()
        .filter(|s| cache.song_id(&s.name).is_none())
        .map(|s| s.name.clone())
        .collect();

    let ids = SongRepository::new(conn).upsert(&songs).await?;
    debug!(songs = songs.len(), new = new_names.len(), "Upserted songs");
    cache.merge_songs(ids);

    Ok(new_names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SongType;
    use crate::sheet::CatalogRow;

    fn row(name: Option<&str>, song_type: Option<SongType>) -> CatalogRow {
        let mut row = CatalogRow::default();
        row.song.name = name.map(str::to_string);
        row.song.song_type = song_type;
        row
    }

    #[test]
    fn last_type_wins_per_name() {
        let rows = vec![
            row(Some("A"), Some(SongType::Original)),
            row(Some("B"), None),
            row(Some("A"), Some(SongType::Cover)),
            row(Some("A"), None),
            row(None, Some(SongType::Medley)),
        ];

        let songs = distinct_songs(&rows);
        assert_eq!(
            songs,
            vec![
                SongUpsert {
                    name: "A".into(),
                    song_type: Some(SongType::Cover)
                },
                SongUpsert {
                    name: "B".into(),
                    song_type: None
                },
            ]
        );
    }
}
