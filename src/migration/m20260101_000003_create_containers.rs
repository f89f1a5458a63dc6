// ABOUTME: Creates the containers table
// ABOUTME: The primary image reference is cleared, not cascaded, when the image goes away

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Containers::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Containers::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Containers::UserId).string().not_null())
                    .col(ColumnDef::new(Containers::ContainerLabel).string().not_null())
                    .col(ColumnDef::new(Containers::ContainerNotes).text().not_null().default(""))
                    .col(ColumnDef::new(Containers::PrimaryImage).string())
                    .col(ColumnDef::new(Containers::PrimaryImageBbox).json())
                    .col(ColumnDef::new(Containers::CreatedAt).big_integer().not_null())
                    .col(ColumnDef::new(Containers::UpdatedAt).big_integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_containers_user_id")
                            .from(Containers::Table, Containers::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_containers_primary_image")
                            .from(Containers::Table, Containers::PrimaryImage)
                            .to(Images::Table, Images::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_containers_user_id")
                    .table(Containers::Table)
                    .col(Containers::UserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Containers::Table).to_owned())
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
}

#[derive(DeriveIden)]
enum Containers {
    Table,
    Id,
    UserId,
    ContainerLabel,
    ContainerNotes,
    PrimaryImage,
    PrimaryImageBbox,
    CreatedAt,
    UpdatedAt,
}
