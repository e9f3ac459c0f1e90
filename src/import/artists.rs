use std::collections::BTreeSet;

use sea_orm::{ConnectionTrait, DbErr};
use tracing::debug;

use super::cache::ImportCache;
use crate::db::ArtistRepository;
use crate::domain::ArtistKind;
use crate::sheet::{SheetRow, split_names};

/// Distinct names of one kind mentioned anywhere in `rows`.
pub fn names_in_batch<R: SheetRow>(rows: &[R], kind: ArtistKind) -> BTreeSet<String> {
    let mut names = BTreeSet::new();
    for row in rows {
        match kind {
            ArtistKind::Uploader => {
                if let Some(name) = row.video().uploader.as_deref() {
                    names.insert(name.trim().to_string());
                }
            }
            credited => {
                if let Some(cell) = row.song().credit_cell(credited) {
                    names.extend(split_names(cell).map(ToString::to_string));
                }
            }
        }
    }
    names.retain(|name| !name.is_empty());
    names
}

/// Makes every artist named in `rows` resolvable through the cache.
/// Returns how many names were not cached before.
pub async fn upsert_artists<C: ConnectionTrait, R: SheetRow>(
    conn: &C,
    cache: &mut ImportCache,
    rows: &[R],
) -> Result<usize, DbErr> {
    let repo = ArtistRepository::new(conn);
    let mut created = 0;

    for kind in ArtistKind::ALL {
        let unseen: Vec<String> = names_in_batch(rows, kind)
            .into_iter()
            .filter(|name| cache.artist_id(kind, name).is_none())
            .collect();
        if unseen.is_empty() {
            continue;
        }

        let ids = repo.ensure(kind, &unseen).await?;
        debug!(kind = %kind, requested = unseen.len(), resolved = ids.len(), "Upserted artists");
        created += unseen.len();
        cache.merge_artists(kind, ids);
    }

    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheet::CatalogRow;

    fn row(author: Option<&str>, uploader: Option<&str>) -> CatalogRow {
        let mut row = CatalogRow::default();
        row.song.author = author.map(str::to_string);
        row.video.uploader = uploader.map(str::to_string);
        row
    }

    #[test]
    fn collects_union_per_kind() {
        let rows = vec![
            row(Some("A、B"), Some("U1")),
            row(Some("B、 C"), None),
            row(None, Some("U1")),
        ];

        let producers: Vec<_> = names_in_batch(&rows, ArtistKind::Producer).into_iter().collect();
        assert_eq!(producers, vec!["A", "B", "C"]);

        let uploaders: Vec<_> = names_in_batch(&rows, ArtistKind::Uploader).into_iter().collect();
        assert_eq!(uploaders, vec!["U1"]);

        assert!(names_in_batch(&rows, ArtistKind::Vocalist).is_empty());
    }

    #[test]
    fn uploader_is_single_valued() {
        let rows = vec![row(None, Some("Team、Studio"))];
        let uploaders: Vec<_> = names_in_batch(&rows, ArtistKind::Uploader).into_iter().collect();
        assert_eq!(uploaders, vec!["Team、Studio"]);
    }
}
