// ABOUTME: Creates item_records and container_records, the per-record change history
// ABOUTME: History rows cascade with their record; the acting user is cleared if removed

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ItemRecords::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(ItemRecords::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(ItemRecords::ItemId).string().not_null())
                    .col(ColumnDef::new(ItemRecords::UserId).string())
                    .col(ColumnDef::new(ItemRecords::TransactionType).string().not_null())
                    .col(ColumnDef::new(ItemRecords::FieldName).string())
                    .col(ColumnDef::new(ItemRecords::NewValue).text().not_null())
                    .col(ColumnDef::new(ItemRecords::CreatedAt).big_integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_item_records_item_id")
                            .from(ItemRecords::Table, ItemRecords::ItemId)
                            .to(Items::Table, Items::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_item_records_user_id")
                            .from(ItemRecords::Table, ItemRecords::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ContainerRecords::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(ContainerRecords::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(ContainerRecords::ContainerId).string().not_null())
                    .col(ColumnDef::new(ContainerRecords::UserId).string())
                    .col(ColumnDef::new(ContainerRecords::TransactionType).string().not_null())
                    .col(ColumnDef::new(ContainerRecords::FieldName).string())
                    .col(ColumnDef::new(ContainerRecords::NewValue).text().not_null())
                    .col(ColumnDef::new(ContainerRecords::CreatedAt).big_integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_container_records_container_id")
                            .from(ContainerRecords::Table, ContainerRecords::ContainerId)
                            .to(Containers::Table, Containers::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_container_records_user_id")
                            .from(ContainerRecords::Table, ContainerRecords::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_item_records_item_id")
                    .table(ItemRecords::Table)
                    .col(ItemRecords::ItemId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_container_records_container_id")
                    .table(ContainerRecords::Table)
                    .col(ContainerRecords::ContainerId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ContainerRecords::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(ItemRecords::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
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
enum ItemRecords {
    Table,
    Id,
    ItemId,
    UserId,
    TransactionType,
    FieldName,
    NewValue,
    CreatedAt,
}

#[derive(DeriveIden)]
enum ContainerRecords {
    Table,
    Id,
    ContainerId,
    UserId,
    TransactionType,
    FieldName,
    NewValue,
    CreatedAt,
}
