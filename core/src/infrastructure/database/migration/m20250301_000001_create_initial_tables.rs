//! Initial migration to create the sessions and file_mapping tables

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create sessions table with hybrid ID system
        manager
            .create_table(
                Table::create()
                    .table(Sessions::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Sessions::Id).integer().not_null().auto_increment().primary_key())
                    .col(ColumnDef::new(Sessions::Sid).string().not_null().unique_key())
                    .col(ColumnDef::new(Sessions::Name).string().not_null())
                    .col(ColumnDef::new(Sessions::Path).string().not_null().unique_key())
                    .col(ColumnDef::new(Sessions::CreatedAt).timestamp_with_time_zone().not_null())
                    .to_owned(),
            )
            .await?;

        // Create file_mapping table
        manager
            .create_table(
                Table::create()
                    .table(FileMapping::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(FileMapping::Id).integer().not_null().auto_increment().primary_key())
                    .col(ColumnDef::new(FileMapping::Uuid).uuid().not_null().unique_key())
                    .col(ColumnDef::new(FileMapping::RealName).string().not_null())
                    .col(ColumnDef::new(FileMapping::DisplayName).string().not_null())
                    .col(ColumnDef::new(FileMapping::FilePath).string().not_null().unique_key())
                    .col(ColumnDef::new(FileMapping::ParentPath).string().not_null())
                    .col(ColumnDef::new(FileMapping::Position).integer().not_null().default(0))
                    .col(ColumnDef::new(FileMapping::ChildCount).integer().not_null().default(0))
                    .col(ColumnDef::new(FileMapping::Kind).string().not_null())
                    .col(ColumnDef::new(FileMapping::CreatedAt).timestamp_with_time_zone().not_null())
                    .to_owned(),
            )
            .await?;

        // Sibling listings are always keyed on parent_path
        manager
            .create_index(
                Index::create()
                    .name("idx_file_mapping_parent_path")
                    .table(FileMapping::Table)
                    .col(FileMapping::ParentPath)
                    .to_owned(),
            )
            .await?;

        // Display names must stay unique among siblings
        manager
            .create_index(
                Index::create()
                    .name("idx_file_mapping_parent_display")
                    .table(FileMapping::Table)
                    .col(FileMapping::ParentPath)
                    .col(FileMapping::DisplayName)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(FileMapping::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Sessions::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(Iden)]
enum Sessions {
    Table,
    Id,
    Sid,
    Name,
    Path,
    CreatedAt,
}

#[derive(Iden)]
enum FileMapping {
    Table,
    Id,
    Uuid,
    RealName,
    DisplayName,
    FilePath,
    ParentPath,
    Position,
    ChildCount,
    Kind,
    CreatedAt,
}
