// ABOUTME: Adds previous_value to both history tables so updates carry the old value
// ABOUTME: SQLite alters one column per statement, so each table is altered separately

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .alter_table(
                Table::alter()
                    .table(ItemRecords::Table)
                    .add_column(ColumnDef::new(ItemRecords::PreviousValue).text())
                    .to_owned(),
            )
            .await?;

        manager
            .alter_table(
                Table::alter()
                    .table(ContainerRecords::Table)
                    .add_column(ColumnDef::new(ContainerRecords::PreviousValue).text())
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .alter_table(
                Table::alter()
                    .table(ContainerRecords::Table)
                    .drop_column(ContainerRecords::PreviousValue)
                    .to_owned(),
            )
            .await?;

        manager
            .alter_table(
                Table::alter()
                    .table(ItemRecords::Table)
                    .drop_column(ItemRecords::PreviousValue)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum ItemRecords {
    Table,
    PreviousValue,
}

#[derive(DeriveIden)]
enum ContainerRecords {
    Table,
    PreviousValue,
}
