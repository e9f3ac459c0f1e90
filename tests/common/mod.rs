//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use tokio::sync::{RwLock, broadcast};
use vocabili::config::Config;
use vocabili::db::Store;
use vocabili::domain::SongType;
use vocabili::services::SeaOrmImportService;
use vocabili::sheet::rows::{SongCells, VideoCells};
use vocabili::sheet::{CatalogRow, RankingRow, SnapshotRow};

pub struct TestApp {
    pub store: Store,
    pub service: Arc<SeaOrmImportService>,
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(|_| {}).await
}

pub async fn spawn_app_with(configure: impl FnOnce(&mut Config)) -> TestApp {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    config.import.batch_size = 2;
    configure(&mut config);

    let store = Store::new(&config.general.database_path)
        .await
        .expect("Failed to open in-memory store");
    let (event_bus, _) = broadcast::channel(64);
    let service = Arc::new(SeaOrmImportService::new(
        store.clone(),
        Arc::new(RwLock::new(config)),
        event_bus,
    ));

    TestApp { store, service }
}

pub fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 9, d).unwrap()
}

pub fn published() -> NaiveDateTime {
    day(1).and_hms_opt(18, 0, 0).unwrap()
}

pub fn song_cells(name: &str, author: &str) -> SongCells {
    SongCells {
        name: Some(name.to_string()),
        song_type: Some(SongType::Original),
        author: Some(author.to_string()),
        synthesizer: Some("VOCALOID".to_string()),
        vocal: Some("初音ミク".to_string()),
    }
}

pub fn video_cells(bvid: &str, uploader: &str) -> VideoCells {
    VideoCells {
        bvid: bvid.to_string(),
        title: format!("{bvid} title"),
        pubdate: Some(published()),
        uploader: Some(uploader.to_string()),
        copyright: Some(1),
        image_url: Some(format!("https://i0.hdslb.com/bfs/archive/{bvid}.jpg")),
        duration: Some(215),
        page: Some(1),
    }
}

pub fn ranking_row(rank: i32, bvid: &str, song: &str, author: &str) -> RankingRow {
    RankingRow {
        line: usize::try_from(rank).unwrap() + 1,
        song: song_cells(song, author),
        video: video_cells(bvid, &format!("{author}_official")),
        rank,
        count: Some(1),
        point: 10_000 - i64::from(rank) * 100,
        view: 50_000,
        favorite: 3_000,
        coin: 1_500,
        like: 4_000,
        view_rank: rank,
        favorite_rank: rank,
        coin_rank: rank,
        like_rank: rank,
    }
}

pub fn catalog_row(bvid: &str, song: &str, author: &str) -> CatalogRow {
    CatalogRow {
        line: 2,
        song: song_cells(song, author),
        video: video_cells(bvid, &format!("{author}_official")),
    }
}

pub fn snapshot_row(bvid: &str, song: &str, view: i64) -> SnapshotRow {
    SnapshotRow {
        line: 2,
        song: SongCells {
            name: Some(song.to_string()),
            ..SongCells::default()
        },
        video: video_cells(bvid, "someone"),
        view,
        favorite: view / 10,
        coin: view / 20,
        like: view / 5,
    }
}
