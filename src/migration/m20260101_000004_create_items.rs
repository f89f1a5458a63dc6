// ABOUTME: Creates the items table with its category columns and JSON attributes
// ABOUTME: Container and primary image references are cleared when their targets are deleted

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Items::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Items::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Items::UserId).string().not_null())
                    .col(ColumnDef::new(Items::ItemLabel).string().not_null())
                    .col(ColumnDef::new(Items::ItemNotes).text().not_null().default(""))
                    .col(ColumnDef::new(Items::CategoryFunctional).string().not_null())
                    .col(ColumnDef::new(Items::CategorySpecific).string().not_null())
                    .col(ColumnDef::new(Items::ItemType).string().not_null())
                    .col(ColumnDef::new(Items::ItemManufacturer).string().not_null().default(""))
                    .col(ColumnDef::new(Items::ItemAttributes).json().not_null())
                    .col(ColumnDef::new(Items::Container).string())
                    .col(ColumnDef::new(Items::PrimaryImage).string())
                    .col(ColumnDef::new(Items::PrimaryImageBbox).json())
                    .col(ColumnDef::new(Items::CreatedAt).big_integer().not_null())
                    .col(ColumnDef::new(Items::UpdatedAt).big_integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_items_user_id")
                            .from(Items::Table, Items::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_items_container")
                            .from(Items::Table, Items::Container)
                            .to(Containers::Table, Containers::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_items_primary_image")
                            .from(Items::Table, Items::PrimaryImage)
                            .to(Images::Table, Images::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        for (name, column) in [
            ("idx_items_user_id", Items::UserId),
            ("idx_items_category_functional", Items::CategoryFunctional),
            ("idx_items_category_specific", Items::CategorySpecific),
            ("idx_items_item_type", Items::ItemType),
            ("idx_items_container", Items::Container),
            ("idx_items_created_at", Items::CreatedAt),
        ] {
            manager
                .create_index(
                    Index::create()
                        .name(name)
                        .table(Items::Table)
                        .col(column)
                        .to_owned(),
                )
                .await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Items::Table).to_owned())
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
}

#[derive(DeriveIden)]
enum Items {
    Table,
    Id,
    UserId,
    ItemLabel,
    ItemNotes,
    CategoryFunctional,
    CategorySpecific,
    ItemType,
    ItemManufacturer,
    ItemAttributes,
    Container,
    PrimaryImage,
    PrimaryImageBbox,
    CreatedAt,
    UpdatedAt,
}
