use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let conn = manager.get_connection();

        conn.execute_unprepared(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_ranking_issue_video ON ranking(board, part, issue, bvid)",
        )
        .await?;

        conn.execute_unprepared(
            "CREATE INDEX IF NOT EXISTS idx_ranking_board_part ON ranking(board, part)",
        )
        .await?;

        conn.execute_unprepared("CREATE INDEX IF NOT EXISTS idx_ranking_issue ON ranking(issue)")
            .await?;

        conn.execute_unprepared("CREATE INDEX IF NOT EXISTS idx_ranking_song ON ranking(song_id)")
            .await?;

        conn.execute_unprepared("CREATE INDEX IF NOT EXISTS idx_snapshot_date ON snapshot(date)")
            .await?;

        conn.execute_unprepared("CREATE INDEX IF NOT EXISTS idx_video_song ON video(song_id)")
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let conn = manager.get_connection();

        for index in [
            "idx_video_song",
            "idx_snapshot_date",
            "idx_ranking_song",
            "idx_ranking_issue",
            "idx_ranking_board_part",
            "idx_ranking_issue_video",
        ] {
            conn.execute_unprepared(&format!("DROP INDEX IF EXISTS {index}"))
                .await?;
        }

        Ok(())
    }
}
