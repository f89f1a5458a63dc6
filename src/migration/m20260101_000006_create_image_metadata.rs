// ABOUTME: Creates the image_metadata analysis cache
// ABOUTME: One row per distinct file hash

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ImageMetadata::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(ImageMetadata::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(ImageMetadata::FileHash).string().not_null())
                    .col(ColumnDef::new(ImageMetadata::Metadata).json().not_null())
                    .col(ColumnDef::new(ImageMetadata::Version).integer().not_null().default(1))
                    .col(ColumnDef::new(ImageMetadata::ImageType).string().not_null().default("unprocessed"))
                    .col(ColumnDef::new(ImageMetadata::CreatedAt).big_integer().not_null())
                    .col(ColumnDef::new(ImageMetadata::UpdatedAt).big_integer().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_image_metadata_file_hash")
                    .table(ImageMetadata::Table)
                    .col(ImageMetadata::FileHash)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ImageMetadata::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ImageMetadata {
    Table,
    Id,
    FileHash,
    Metadata,
    Version,
    ImageType,
    CreatedAt,
    UpdatedAt,
}
