// ABOUTME: Creates the labels table for generated QR labels
// ABOUTME: A label points at one item or one container and cascades with it

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Labels::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Labels::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Labels::ItemId).string())
                    .col(ColumnDef::new(Labels::ContainerId).string())
                    .col(ColumnDef::new(Labels::Format).string().not_null())
                    .col(ColumnDef::new(Labels::Data).json())
                    .col(ColumnDef::new(Labels::CreatedAt).big_integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_labels_item_id")
                            .from(Labels::Table, Labels::ItemId)
                            .to(Items::Table, Items::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_labels_container_id")
                            .from(Labels::Table, Labels::ContainerId)
                            .to(Containers::Table, Containers::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        for (name, column) in [
            ("idx_labels_item_id", Labels::ItemId),
            ("idx_labels_container_id", Labels::ContainerId),
            ("idx_labels_created_at", Labels::CreatedAt),
        ] {
            manager
                .create_index(
                    Index::create()
                        .name(name)
                        .table(Labels::Table)
                        .col(column)
                        .to_owned(),
                )
                .await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Labels::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Items {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Containers {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Labels {
    Table,
    Id,
    ItemId,
    ContainerId,
    Format,
    Data,
    CreatedAt,
}
