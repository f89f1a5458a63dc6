// ABOUTME: Creates the images table for uploaded photos
// ABOUTME: Indexed by owner, type, analysis status and creation time

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Images::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Images::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Images::UserId).string().not_null())
                    .col(ColumnDef::new(Images::File).string().not_null())
                    .col(ColumnDef::new(Images::OriginalName).string().not_null())
                    .col(ColumnDef::new(Images::ContentType).string().not_null())
                    .col(ColumnDef::new(Images::Size).big_integer().not_null())
                    .col(ColumnDef::new(Images::FileHash).string())
                    .col(ColumnDef::new(Images::ImageType).string().not_null().default("unprocessed"))
                    .col(ColumnDef::new(Images::AnalysisStatus).string().not_null().default("pending"))
                    .col(ColumnDef::new(Images::CreatedAt).big_integer().not_null())
                    .col(ColumnDef::new(Images::UpdatedAt).big_integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_images_user_id")
                            .from(Images::Table, Images::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        for (name, column) in [
            ("idx_images_user_id", Images::UserId),
            ("idx_images_image_type", Images::ImageType),
            ("idx_images_analysis_status", Images::AnalysisStatus),
            ("idx_images_created_at", Images::CreatedAt),
        ] {
            manager
                .create_index(
                    Index::create()
                        .name(name)
                        .table(Images::Table)
                        .col(column)
                        .to_owned(),
                )
                .await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Images::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Images {
    Table,
    Id,
    UserId,
    File,
    OriginalName,
    ContentType,
    Size,
    FileHash,
    ImageType,
    AnalysisStatus,
    CreatedAt,
    UpdatedAt,
}
