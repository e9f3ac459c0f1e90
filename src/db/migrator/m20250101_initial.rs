use crate::entities::prelude::*;
use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::{EntityTrait, Schema};

#[derive(DeriveMigrationName)]
pub struct Migration;

async fn create<E>(manager: &SchemaManager<'_>, schema: &Schema, entity: E) -> Result<(), DbErr>
where
    E: EntityTrait,
{
    manager
        .create_table(
            schema
                .create_table_from_entity(entity)
                .if_not_exists()
                .to_owned(),
        )
        .await
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();
        let schema = Schema::new(backend);

        // Referenced tables first; foreign keys are enforced on SQLite.
        create(manager, &schema, Producer).await?;
        create(manager, &schema, Synthesizer).await?;
        create(manager, &schema, Vocalist).await?;
        create(manager, &schema, Uploader).await?;
        create(manager, &schema, Song).await?;
        create(manager, &schema, Video).await?;
        create(manager, &schema, Snapshot).await?;
        create(manager, &schema, Ranking).await?;
        create(manager, &schema, SongProducer).await?;
        create(manager, &schema, SongSynthesizer).await?;
        create(manager, &schema, SongVocalist).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SongVocalist).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(SongSynthesizer).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(SongProducer).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Ranking).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Snapshot).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Video).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Song).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Uploader).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Vocalist).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Synthesizer).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Producer).to_owned())
            .await?;

        Ok(())
    }
}
