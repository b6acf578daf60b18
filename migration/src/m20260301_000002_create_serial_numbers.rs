use sea_orm_migration::prelude::*;

use super::m20260301_000001_create_users::Users;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(SerialNumbers::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(SerialNumbers::Id)
              .integer()
              .not_null()
              .auto_increment()
              .primary_key(),
          )
          .col(
            ColumnDef::new(SerialNumbers::Code).string().not_null().unique_key(),
          )
          .col(
            ColumnDef::new(SerialNumbers::Status)
              .string()
              .not_null()
              .default("AVAILABLE"),
          )
          .col(ColumnDef::new(SerialNumbers::UserId).integer().null().unique_key())
          .col(ColumnDef::new(SerialNumbers::AssignedAt).date_time().null())
          .col(ColumnDef::new(SerialNumbers::CreatedAt).date_time().not_null())
          .foreign_key(
            ForeignKey::create()
              .name("fk_serial_numbers_user")
              .from(SerialNumbers::Table, SerialNumbers::UserId)
              .to(Users::Table, Users::Id)
              .on_delete(ForeignKeyAction::Restrict),
          )
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_serial_numbers_status")
          .table(SerialNumbers::Table)
          .col(SerialNumbers::Status)
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .drop_table(Table::drop().table(SerialNumbers::Table).to_owned())
      .await
  }
}

#[derive(DeriveIden)]
pub enum SerialNumbers {
  Table,
  Id,
  Code,
  Status,
  UserId,
  AssignedAt,
  CreatedAt,
}
