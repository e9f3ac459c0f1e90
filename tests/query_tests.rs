mod common;

use common::{TestApp, day, ranking_row, snapshot_row, spawn_app};
use vocabili::db::RankingOrder;
use vocabili::domain::{ArtistKind, Board, IssueKey, Part};
use vocabili::services::{
    ImportService, IssueSelector, QueryError, QueryService, RankingQuery, SeaOrmQueryService,
};

async fn seeded() -> (TestApp, SeaOrmQueryService) {
    let app = spawn_app().await;
    app.service
        .import_rankings(
            IssueKey::new(Board::Weekly, Part::Main, 1),
            vec![
                ranking_row(1, "BV1aa", "S", "A"),
                ranking_row(2, "BV1bb", "T", "B"),
            ],
            true,
        )
        .await
        .unwrap();
    app.service
        .import_rankings(
            IssueKey::new(Board::Weekly, Part::Main, 2),
            vec![
                ranking_row(1, "BV1bb", "T", "B"),
                ranking_row(2, "BV1aa", "S", "A"),
                ranking_row(3, "BV1cc", "U", "C"),
            ],
            true,
        )
        .await
        .unwrap();

    let queries = SeaOrmQueryService::new(app.store.clone());
    (app, queries)
}

fn weekly(issue: IssueSelector, page: u64, page_size: u64) -> RankingQuery {
    RankingQuery {
        board: Board::Weekly,
        part: Part::Main,
        issue,
        order: RankingOrder::Score,
        page,
        page_size,
    }
}

#[tokio::test]
async fn test_latest_ranking_carries_previous_issue() {
    let (_app, queries) = seeded().await;

    let page = queries
        .ranking(weekly(IssueSelector::Latest, 1, 20))
        .await
        .unwrap();

    assert_eq!(page.total, 3);
    let ranked: Vec<(&str, i32)> = page
        .items
        .iter()
        .map(|e| (e.video.bvid.as_str(), e.ranking.rank))
        .collect();
    assert_eq!(ranked, vec![("BV1bb", 1), ("BV1aa", 2), ("BV1cc", 3)]);

    let climber = &page.items[0];
    assert_eq!(climber.song.name, "T");
    assert_eq!(climber.previous.map(|p| (p.issue, p.rank)), Some((1, 2)));
    assert!(page.items[2].previous.is_none());
}

#[tokio::test]
async fn test_ranking_pages_are_windowed() {
    let (_app, queries) = seeded().await;

    let page = queries
        .ranking(weekly(IssueSelector::Number(2), 2, 2))
        .await
        .unwrap();

    assert_eq!(page.total, 3);
    assert_eq!(page.page, 2);
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].video.bvid, "BV1cc");
}

#[tokio::test]
async fn test_ranking_of_empty_board_is_not_found() {
    let (_app, queries) = seeded().await;

    let result = queries
        .ranking(RankingQuery {
            board: Board::Daily,
            ..weekly(IssueSelector::Latest, 1, 20)
        })
        .await;

    assert!(matches!(result, Err(QueryError::NotFound(_))));
    assert_eq!(
        queries.latest_issue(Board::Weekly, Part::Main).await.unwrap(),
        Some(2)
    );
    assert_eq!(
        queries.latest_issue(Board::Daily, Part::Main).await.unwrap(),
        None
    );
}

#[tokio::test]
async fn test_song_detail_lists_credits_and_history() {
    let (app, queries) = seeded().await;
    let id = app.store.songs().find_by_name("S").await.unwrap().unwrap().id;

    let detail = queries.song(id).await.unwrap();
    assert_eq!(detail.song.name, "S");
    assert_eq!(detail.producers, vec!["A"]);
    assert_eq!(detail.synthesizers, vec!["VOCALOID"]);
    assert_eq!(detail.vocalists, vec!["初音ミク"]);
    assert_eq!(detail.videos.len(), 1);
    assert_eq!(detail.videos[0].bvid, "BV1aa");

    let history = queries.song_rankings(id, None, 1, 10).await.unwrap();
    assert_eq!(history.total, 2);
    assert_eq!(history.items[0].issue, 2);
    assert_eq!(history.items[0].rank, 2);

    assert!(matches!(
        queries.song(id + 1_000).await,
        Err(QueryError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_artist_songs_cover_credits_and_uploads() {
    let (app, queries) = seeded().await;
    let producers = app.store.artists().name_map(ArtistKind::Producer).await.unwrap();
    let uploaders = app.store.artists().name_map(ArtistKind::Uploader).await.unwrap();

    let produced = queries
        .artist_songs(ArtistKind::Producer, producers["B"], 1, 20)
        .await
        .unwrap();
    assert_eq!(produced.total, 1);
    assert_eq!(produced.items[0].name, "T");

    let uploaded = queries
        .artist_songs(ArtistKind::Uploader, uploaders["C_official"], 1, 20)
        .await
        .unwrap();
    assert_eq!(uploaded.items.len(), 1);
    assert_eq!(uploaded.items[0].name, "U");

    let artist = queries
        .artist(ArtistKind::Producer, producers["A"])
        .await
        .unwrap();
    assert_eq!(artist.name, "A");
    assert!(matches!(
        queries.artist(ArtistKind::Vocalist, -1).await,
        Err(QueryError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_video_snapshots_respect_date_range() {
    let (app, queries) = seeded().await;
    for (d, view) in [(2, 1_000), (3, 1_040), (4, 1_090)] {
        app.service
            .import_snapshots(day(d), vec![snapshot_row("BV1aa", "S", view)], false)
            .await
            .unwrap();
    }

    let all = queries.video_snapshots("BV1aa", None, None).await.unwrap();
    assert_eq!(
        all.iter().map(|p| p.view).collect::<Vec<_>>(),
        vec![1_000, 1_040, 1_090]
    );

    let window = queries
        .video_snapshots("BV1aa", Some(day(3)), Some(day(3)))
        .await
        .unwrap();
    assert_eq!(window.len(), 1);
    assert_eq!(window[0].date, day(3));

    assert!(matches!(
        queries.video_snapshots("BV1missing", None, None).await,
        Err(QueryError::NotFound(_))
    ));
}
