// ABOUTME: Creates item_images and container_images, the image history of each record
// ABOUTME: Mapping rows cascade with both the record and the image

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ItemImages::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(ItemImages::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(ItemImages::ItemId).string().not_null())
                    .col(ColumnDef::new(ItemImages::ImageId).string().not_null())
                    .col(ColumnDef::new(ItemImages::BoundingBox).json())
                    .col(ColumnDef::new(ItemImages::CreatedAt).big_integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_item_images_item_id")
                            .from(ItemImages::Table, ItemImages::ItemId)
                            .to(Items::Table, Items::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_item_images_image_id")
                            .from(ItemImages::Table, ItemImages::ImageId)
                            .to(Images::Table, Images::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ContainerImages::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(ContainerImages::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(ContainerImages::ContainerId).string().not_null())
                    .col(ColumnDef::new(ContainerImages::ImageId).string().not_null())
                    .col(ColumnDef::new(ContainerImages::BoundingBox).json())
                    .col(ColumnDef::new(ContainerImages::CreatedAt).big_integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_container_images_container_id")
                            .from(ContainerImages::Table, ContainerImages::ContainerId)
                            .to(Containers::Table, Containers::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_container_images_image_id")
                            .from(ContainerImages::Table, ContainerImages::ImageId)
                            .to(Images::Table, Images::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_item_images_item_id")
                    .table(ItemImages::Table)
                    .col(ItemImages::ItemId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_container_images_container_id")
                    .table(ContainerImages::Table)
                    .col(ContainerImages::ContainerId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ContainerImages::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(ItemImages::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Images {
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
enum ItemImages {
    Table,
    Id,
    ItemId,
    ImageId,
    BoundingBox,
    CreatedAt,
}

#[derive(DeriveIden)]
enum ContainerImages {
    Table,
    Id,
    ContainerId,
    ImageId,
    BoundingBox,
    CreatedAt,
}
