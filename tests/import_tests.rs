//! End-to-end tests of the import engine against an in-memory store.

mod common;

use std::collections::HashMap;
use std::sync::Arc;

use common::{
    catalog_row, day, ranking_row, snapshot_row, spawn_app, spawn_app_with,
};
use futures::StreamExt;
use vocabili::db::{RankingOrder, Store};
use vocabili::domain::events::ImportEvent;
use vocabili::domain::{ArtistKind, Board, CreditKind, IssueKey, Part};
use vocabili::import::{
    CacheSubset, ImportCache, insert_missing_credits, resolve_changed_names, upsert_artists,
};
use vocabili::services::{ImportError, ImportService};
use vocabili::sheet::SongAssignment;

async fn song_id(store: &Store, name: &str) -> i32 {
    store
        .songs()
        .find_by_name(name)
        .await
        .unwrap()
        .unwrap_or_else(|| panic!("song {name} missing"))
        .id
}

async fn producers_of(store: &Store, song: &str) -> Vec<String> {
    let id = song_id(store, song).await;
    let ids = store
        .credits()
        .artists_of(CreditKind::Producer, id)
        .await
        .unwrap();
    store
        .artists()
        .names_for(ArtistKind::Producer, &ids)
        .await
        .unwrap()
}

async fn issue_rows(store: &Store, key: IssueKey) -> Vec<(i32, String, i32, i64)> {
    let (rows, _) = store
        .rankings()
        .page(key, RankingOrder::Score, 1, 100)
        .await
        .unwrap();
    rows.into_iter()
        .map(|r| (r.rank, r.bvid, r.song_id, r.point))
        .collect()
}

#[tokio::test]
async fn test_ranking_import_is_idempotent() {
    let app = spawn_app().await;
    let key = IssueKey::new(Board::Weekly, Part::Main, 12);
    let rows = vec![
        ranking_row(1, "BV1aa", "Song A", "A"),
        ranking_row(2, "BV1bb", "Song B", "B、C"),
        ranking_row(3, "BV1cc", "Song A", "A"),
    ];

    let first = app
        .service
        .import_rankings(key, rows.clone(), true)
        .await
        .unwrap();
    assert_eq!(first.written, 3);
    assert_eq!(first.dropped, 0);
    assert_eq!(first.batches, 2);

    let before = issue_rows(&app.store, key).await;
    let songs_before = app.store.songs().name_map().await.unwrap();

    app.service.import_rankings(key, rows, true).await.unwrap();

    assert_eq!(issue_rows(&app.store, key).await, before);
    assert_eq!(app.store.songs().name_map().await.unwrap(), songs_before);
    assert_eq!(app.store.rankings().count_issue(key).await.unwrap(), 3);
    assert_eq!(
        app.store
            .credits()
            .edges(CreditKind::Producer)
            .await
            .unwrap()
            .len(),
        3
    );
    assert_eq!(producers_of(&app.store, "Song B").await, vec!["B", "C"]);
}

#[tokio::test]
async fn test_snapshot_import_is_idempotent() {
    let app = spawn_app().await;
    app.service
        .import_catalog(
            vec![catalog_row("BV1aa", "S", "A"), catalog_row("BV1bb", "T", "B")],
            true,
        )
        .await
        .unwrap();

    let rows = vec![
        snapshot_row("BV1aa", "S", 400),
        snapshot_row("BV1bb", "T", 2000),
        snapshot_row("BV1cc", "S", 300),
        snapshot_row("BV1aa", "S", 1000),
    ];

    app.service
        .import_snapshots(day(2), rows.clone(), false)
        .await
        .unwrap();
    let first = app.store.snapshots().views_on(day(2)).await.unwrap();

    app.service
        .import_snapshots(day(2), rows, false)
        .await
        .unwrap();
    let second = app.store.snapshots().views_on(day(2)).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(
        second,
        HashMap::from([
            ("BV1aa".to_string(), 1000),
            ("BV1bb".to_string(), 2000),
            ("BV1cc".to_string(), 300),
        ])
    );
    assert_eq!(app.store.snapshots().count_on(day(2)).await.unwrap(), 3);

    // Unknown videos with a known song are created on the fly.
    let created = app.store.videos().get("BV1cc").await.unwrap().unwrap();
    assert_eq!(created.song_id, song_id(&app.store, "S").await);
}

#[tokio::test]
async fn test_snapshot_rows_with_unknown_song_are_dropped() {
    let app = spawn_app().await;

    let summary = app
        .service
        .import_snapshots(day(3), vec![snapshot_row("BV1zz", "Nowhere", 10)], false)
        .await
        .unwrap();

    assert_eq!(summary.written, 0);
    assert_eq!(summary.dropped, 1);
    assert!(app.store.videos().get("BV1zz").await.unwrap().is_none());
}

#[tokio::test]
async fn test_insert_only_reconciliation_adds_missing_edges() {
    let app = spawn_app().await;
    app.service
        .import_catalog(vec![catalog_row("BV1aa", "S", "A")], true)
        .await
        .unwrap();
    assert_eq!(producers_of(&app.store, "S").await, vec!["A"]);

    let rows = vec![catalog_row("BV1aa", "S", "A、B")];
    let new_songs = vec!["S".to_string()];
    let mut cache = ImportCache::new();
    cache
        .ensure_loaded(&app.store.conn, &CacheSubset::ALL)
        .await
        .unwrap();
    upsert_artists(&app.store.conn, &mut cache, &rows)
        .await
        .unwrap();

    let first = insert_missing_credits(&app.store.conn, &mut cache, &rows, &new_songs, true)
        .await
        .unwrap();
    assert_eq!(first.inserted, 1);
    assert_eq!(producers_of(&app.store, "S").await, vec!["A", "B"]);

    let again = insert_missing_credits(&app.store.conn, &mut cache, &rows, &new_songs, true)
        .await
        .unwrap();
    assert_eq!(again.inserted, 0);
    assert_eq!(producers_of(&app.store, "S").await, vec!["A", "B"]);
}

#[tokio::test]
async fn test_insert_only_mode_keeps_credits_of_existing_songs() {
    let app = spawn_app().await;
    let key = IssueKey::new(Board::Weekly, Part::Main, 1);
    app.service
        .import_rankings(key, vec![ranking_row(1, "BV1aa", "S", "A")], true)
        .await
        .unwrap();

    let next = IssueKey::new(Board::Weekly, Part::Main, 2);
    app.service
        .import_rankings(next, vec![ranking_row(1, "BV1aa", "S", "C")], true)
        .await
        .unwrap();

    assert_eq!(producers_of(&app.store, "S").await, vec!["A"]);
}

#[tokio::test]
async fn test_replace_mode_rebuilds_credits() {
    let app = spawn_app_with(|config| {
        config.import.replace_credit_boards = vec![Board::Daily];
    })
    .await;

    let first = IssueKey::new(Board::Daily, Part::Main, 1);
    app.service
        .import_rankings(first, vec![ranking_row(1, "BV1aa", "S", "A、B")], true)
        .await
        .unwrap();
    assert_eq!(producers_of(&app.store, "S").await, vec!["A", "B"]);

    let second = IssueKey::new(Board::Daily, Part::Main, 2);
    app.service
        .import_rankings(second, vec![ranking_row(1, "BV1aa", "S", "C")], true)
        .await
        .unwrap();
    assert_eq!(producers_of(&app.store, "S").await, vec!["C"]);
}

#[tokio::test]
async fn test_identity_migration_shares_new_song() {
    let app = spawn_app().await;
    app.service
        .import_catalog(
            vec![catalog_row("BV1aa", "Old", "A"), catalog_row("BV1bb", "Other", "B")],
            true,
        )
        .await
        .unwrap();

    let assign = |bvid: &str, name: &str| SongAssignment {
        bvid: bvid.to_string(),
        name: name.to_string(),
    };
    let summary = app
        .service
        .resolve_changed_names(vec![
            assign("BV1aa", "New"),
            assign("BV1bb", "New"),
            assign("BV1unknown", "New"),
        ])
        .await
        .unwrap();

    assert_eq!(summary.created_songs, 1);
    assert_eq!(summary.updated_videos, 2);

    let new_id = song_id(&app.store, "New").await;
    let v = app.store.videos().get("BV1aa").await.unwrap().unwrap();
    let w = app.store.videos().get("BV1bb").await.unwrap().unwrap();
    assert_eq!(v.song_id, new_id);
    assert_eq!(w.song_id, new_id);

    // The song left behind is kept.
    song_id(&app.store, "Old").await;
    assert!(app.store.videos().get("BV1unknown").await.unwrap().is_none());
}

#[tokio::test]
async fn test_ranking_import_moves_renamed_videos() {
    let app = spawn_app().await;
    app.service
        .import_rankings(
            IssueKey::new(Board::Monthly, Part::Main, 1),
            vec![ranking_row(1, "BV1aa", "Draft Title", "A")],
            true,
        )
        .await
        .unwrap();

    let key = IssueKey::new(Board::Monthly, Part::Main, 2);
    app.service
        .import_rankings(key, vec![ranking_row(1, "BV1aa", "Final Title", "A")], true)
        .await
        .unwrap();

    let renamed = song_id(&app.store, "Final Title").await;
    let video = app.store.videos().get("BV1aa").await.unwrap().unwrap();
    assert_eq!(video.song_id, renamed);
    assert_eq!(issue_rows(&app.store, key).await[0].2, renamed);
}

#[tokio::test]
async fn test_streak_transitions() {
    let app = spawn_app().await;
    app.service
        .import_catalog(
            vec![
                catalog_row("BV1xx", "X", "A"),
                catalog_row("BV1yy", "Y", "B"),
                catalog_row("BV1zz", "Z", "C"),
            ],
            true,
        )
        .await
        .unwrap();

    let views = [
        (1, [1_000, 500, 100]),
        (2, [1_050, 520, 120]),
        (3, [1_300, 530, 130]),
        (4, [12_000, 540, 15_000]),
    ];
    let mut graduated_on_day4 = 0;

    for (d, [x, y, z]) in views {
        let rows = vec![
            snapshot_row("BV1xx", "X", x),
            snapshot_row("BV1yy", "Y", y),
            snapshot_row("BV1zz", "Z", z),
        ];
        app.service
            .import_snapshots(day(d), rows, false)
            .await
            .unwrap();
        let summary = app.service.update_video_streaks(day(d)).await.unwrap();
        if d == 4 {
            graduated_on_day4 = summary.graduated;
        }

        let streak = |bvid: &'static str| {
            let store = app.store.clone();
            async move { store.videos().get(bvid).await.unwrap().unwrap().streak }
        };
        match d {
            1 => {
                assert_eq!(streak("BV1xx").await, 0);
                assert_eq!(streak("BV1yy").await, 0);
            }
            2 => {
                assert_eq!(streak("BV1xx").await, 1);
                assert_eq!(streak("BV1zz").await, 1);
            }
            3 => {
                assert_eq!(streak("BV1xx").await, 0);
                assert_eq!(streak("BV1zz").await, 2);
            }
            _ => {
                assert_eq!(streak("BV1xx").await, 0);
                assert_eq!(streak("BV1zz").await, 0);
                assert_eq!(streak("BV1yy").await, 3);
            }
        }
    }
    assert_eq!(graduated_on_day4, 1);

    // Day 5 has no sheet: graduated videos stay at zero, others keep counting.
    app.service.update_video_streaks(day(5)).await.unwrap();
    let x = app.store.videos().get("BV1xx").await.unwrap().unwrap();
    let y = app.store.videos().get("BV1yy").await.unwrap().unwrap();
    assert_eq!(x.streak, 0);
    assert_eq!(y.streak, 4);
    assert_eq!(y.streak_date, Some(day(5)));

    // A second run on the same date is a no-op.
    let rerun = app.service.update_video_streaks(day(5)).await.unwrap();
    assert_eq!(rerun.evaluated, 0);
    let y = app.store.videos().get("BV1yy").await.unwrap().unwrap();
    assert_eq!(y.streak, 4);
}

#[tokio::test]
async fn test_strict_validation_blocks_writes() {
    let app = spawn_app().await;
    let key = IssueKey::new(Board::Weekly, Part::Main, 5);
    let mut incomplete = ranking_row(2, "BV1bb", "T", "B");
    incomplete.song.vocal = None;
    let rows = vec![ranking_row(1, "BV1aa", "S", "A"), incomplete];

    let err = app
        .service
        .import_rankings(key, rows.clone(), true)
        .await
        .unwrap_err();
    match err {
        ImportError::Validation(messages) => {
            assert_eq!(messages, vec!["row 3: column 'vocal' is empty".to_string()]);
        }
        other => panic!("expected validation error, got {other}"),
    }
    assert_eq!(app.store.rankings().count_issue(key).await.unwrap(), 0);
    assert!(app.store.songs().name_map().await.unwrap().is_empty());

    let summary = app.service.import_rankings(key, rows, false).await.unwrap();
    assert_eq!(summary.written, 2);
    assert!(app.store.videos().get("BV1bb").await.unwrap().is_some());
    assert_eq!(producers_of(&app.store, "S").await, vec!["A"]);
    assert!(producers_of(&app.store, "T").await.is_empty());
}

#[tokio::test]
async fn test_strict_validation_keeps_existing_issue() {
    let app = spawn_app().await;
    let key = IssueKey::new(Board::Weekly, Part::Main, 6);
    app.service
        .import_rankings(key, vec![ranking_row(1, "BV1aa", "S", "A")], true)
        .await
        .unwrap();

    let mut broken = ranking_row(1, "BV1aa", "S", "A");
    broken.count = None;
    let result = app.service.import_rankings(key, vec![broken], true).await;

    assert!(matches!(result, Err(ImportError::Validation(_))));
    assert_eq!(app.store.rankings().count_issue(key).await.unwrap(), 1);
}

#[tokio::test]
async fn test_dangling_uploader_left_unset() {
    let app = spawn_app().await;
    app.service
        .import_catalog(vec![catalog_row("BV1aa", "S", "A")], true)
        .await
        .unwrap();

    let key = IssueKey::new(Board::Weekly, Part::New, 3);
    let mut row = ranking_row(1, "BV1new", "S", "A");
    row.video.uploader = Some("Nobody".to_string());
    row.count = None;

    let summary = app
        .service
        .import_rankings(key, vec![row], false)
        .await
        .unwrap();
    assert_eq!(summary.written, 1);

    let video = app.store.videos().get("BV1new").await.unwrap().unwrap();
    assert_eq!(video.uploader_id, None);
    assert_eq!(video.song_id, song_id(&app.store, "S").await);

    let (entries, _) = app
        .store
        .rankings()
        .page(key, RankingOrder::Score, 1, 10)
        .await
        .unwrap();
    assert_eq!(entries[0].count, None);
}

#[tokio::test]
async fn test_new_part_does_not_overwrite_known_videos() {
    let app = spawn_app().await;
    app.service
        .import_catalog(vec![catalog_row("BV1aa", "S", "A")], true)
        .await
        .unwrap();

    let mut row = ranking_row(1, "BV1aa", "S", "A");
    row.video.title = "retitled".to_string();
    app.service
        .import_rankings(IssueKey::new(Board::Daily, Part::New, 9), vec![row], false)
        .await
        .unwrap();

    let video = app.store.videos().get("BV1aa").await.unwrap().unwrap();
    assert_eq!(video.title, "BV1aa title");
}

#[tokio::test]
async fn test_main_part_does_not_overwrite_known_videos() {
    let app = spawn_app().await;
    app.service
        .import_catalog(vec![catalog_row("BV1aa", "S", "A")], true)
        .await
        .unwrap();
    let before = app.store.videos().get("BV1aa").await.unwrap().unwrap();

    let mut row = ranking_row(1, "BV1aa", "S", "A");
    row.video.title = "stale ranking title".to_string();
    row.video.image_url = Some("https://i0.hdslb.com/bfs/archive/stale.jpg".to_string());
    let key = IssueKey::new(Board::Weekly, Part::Main, 4);
    app.service.import_rankings(key, vec![row], true).await.unwrap();

    let after = app.store.videos().get("BV1aa").await.unwrap().unwrap();
    assert_eq!(after.title, "BV1aa title");
    assert_eq!(after.thumbnail, before.thumbnail);
    assert_eq!(app.store.rankings().count_issue(key).await.unwrap(), 1);
}

#[tokio::test]
async fn test_new_part_creates_unseen_songs() {
    let app = spawn_app().await;
    let key = IssueKey::new(Board::Daily, Part::New, 9);
    let mut row = ranking_row(1, "BV1new", "FreshSong", "A");
    row.count = None;

    let summary = app
        .service
        .import_rankings(key, vec![row], true)
        .await
        .unwrap();
    assert_eq!(summary.written, 1);
    assert_eq!(summary.dropped, 0);

    let song = song_id(&app.store, "FreshSong").await;
    let video = app.store.videos().get("BV1new").await.unwrap().unwrap();
    assert_eq!(video.song_id, song);
    assert_eq!(issue_rows(&app.store, key).await[0].2, song);

    // New-song sheets carry no credits to reconcile.
    assert!(producers_of(&app.store, "FreshSong").await.is_empty());
}

#[tokio::test]
async fn test_strict_import_rejects_blank_optional_cell() {
    let app = spawn_app().await;
    let key = IssueKey::new(Board::Weekly, Part::Main, 10);
    let mut row = ranking_row(1, "BV1aa", "S", "A");
    row.video.image_url = None;
    row.video.title = String::new();

    let err = app
        .service
        .import_rankings(key, vec![row], true)
        .await
        .unwrap_err();
    match err {
        ImportError::Validation(messages) => {
            assert_eq!(
                messages,
                vec!["row 2: column 'image_url' is empty".to_string()]
            );
        }
        other => panic!("expected validation error, got {other}"),
    }
    assert_eq!(app.store.rankings().count_issue(key).await.unwrap(), 0);
    assert!(app.store.songs().name_map().await.unwrap().is_empty());
    assert!(app.store.videos().get("BV1aa").await.unwrap().is_none());
}

#[tokio::test]
async fn test_migration_counts_only_songs_it_inserted() {
    let app = spawn_app().await;
    app.service
        .import_catalog(vec![catalog_row("BV1aa", "Old", "A")], true)
        .await
        .unwrap();

    let mut cache = ImportCache::new();
    cache
        .ensure_loaded(&app.store.conn, &CacheSubset::ALL)
        .await
        .unwrap();
    // Another writer creates the target song after the cache was loaded.
    app.store
        .songs()
        .ensure_names(&["New".to_string()])
        .await
        .unwrap();

    let assignments = vec![
        SongAssignment {
            bvid: "BV1aa".to_string(),
            name: "New".to_string(),
        },
    ];
    let summary = resolve_changed_names(&app.store.conn, &mut cache, &assignments)
        .await
        .unwrap();

    assert_eq!(summary.created_songs, 0);
    assert_eq!(summary.updated_videos, 1);
    let video = app.store.videos().get("BV1aa").await.unwrap().unwrap();
    assert_eq!(video.song_id, song_id(&app.store, "New").await);
}

#[tokio::test]
async fn test_snapshot_range_skips_missing_days() {
    let dir = tempfile::tempdir().unwrap();
    let data_dir = dir.path().to_string_lossy().to_string();
    let app = spawn_app_with(move |config| {
        config.general.data_dir = data_dir;
    })
    .await;
    app.service
        .import_catalog(vec![catalog_row("BV1aa", "S", "A")], true)
        .await
        .unwrap();

    let sheets = dir.path().join("数据");
    std::fs::create_dir_all(&sheets).unwrap();
    for (stamp, view) in [("20240902", 1_000), ("20240904", 1_080)] {
        std::fs::write(
            sheets.join(format!("{stamp}.csv")),
            format!("bvid,title,name,view,favorite,coin,like\nBV1aa,t,S,{view},10,5,20\n"),
        )
        .unwrap();
    }

    let results = app
        .service
        .import_snapshot_range(day(2), day(4), false)
        .await
        .unwrap();

    let dates: Vec<_> = results.iter().map(|(date, _)| *date).collect();
    assert_eq!(dates, vec![day(2), day(4)]);
    assert!(results.iter().all(|(_, summary)| summary.written == 1));
    assert_eq!(
        app.store.snapshots().views_on(day(4)).await.unwrap()["BV1aa"],
        1_080
    );
}

#[tokio::test]
async fn test_update_mode_keeps_known_optional_fields() {
    let app = spawn_app().await;
    app.service
        .import_catalog(vec![catalog_row("BV1aa", "S", "A")], true)
        .await
        .unwrap();

    let mut row = catalog_row("BV1aa", "S", "A");
    row.video.title = "Remastered".to_string();
    row.video.pubdate = None;
    row.video.duration = None;
    app.service.import_catalog(vec![row], false).await.unwrap();

    let video = app.store.videos().get("BV1aa").await.unwrap().unwrap();
    assert_eq!(video.title, "Remastered");
    assert_eq!(video.pubdate, Some(common::published()));
    assert_eq!(video.duration, Some(215));
}

#[tokio::test]
async fn test_progress_stream_reports_batches() {
    let app = spawn_app().await;
    let key = IssueKey::new(Board::Weekly, Part::Main, 7);
    let rows = vec![
        ranking_row(1, "BV1aa", "S", "A"),
        ranking_row(2, "BV1bb", "T", "B"),
        ranking_row(3, "BV1cc", "U", "C"),
    ];

    let events: Vec<ImportEvent> = Arc::clone(&app.service)
        .start_ranking_import(key, rows, true)
        .collect()
        .await;

    assert_eq!(
        events,
        vec![
            ImportEvent::RankingImportStarted {
                board: Board::Weekly,
                part: Part::Main,
                issue: 7,
                total: 3,
            },
            ImportEvent::BatchCommitted {
                processed: 2,
                total: 3
            },
            ImportEvent::BatchCommitted {
                processed: 3,
                total: 3
            },
            ImportEvent::ImportFinished {
                written: 3,
                dropped: 0
            },
        ]
    );
}

#[tokio::test]
async fn test_progress_stream_reports_failure() {
    let app = spawn_app().await;
    let mut row = ranking_row(1, "BV1aa", "S", "A");
    row.song.name = None;

    let events: Vec<ImportEvent> = Arc::clone(&app.service)
        .start_ranking_import(IssueKey::new(Board::Weekly, Part::Main, 8), vec![row], true)
        .collect()
        .await;

    assert_eq!(events.len(), 1);
    assert!(matches!(events[0], ImportEvent::ImportFailed { .. }));
}

#[tokio::test]
async fn test_single_commit_policy_imports_everything() {
    let app = spawn_app_with(|config| {
        config.import.commit_policy = vocabili::config::CommitPolicy::Single;
    })
    .await;
    let key = IssueKey::new(Board::Weekly, Part::Main, 9);
    let rows = vec![
        ranking_row(1, "BV1aa", "S", "A"),
        ranking_row(2, "BV1bb", "T", "B"),
        ranking_row(3, "BV1cc", "U", "C"),
    ];

    let summary = app.service.import_rankings(key, rows, true).await.unwrap();
    assert_eq!(summary.batches, 2);
    assert_eq!(app.store.rankings().count_issue(key).await.unwrap(), 3);
}
