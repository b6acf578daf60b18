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
          .table(PremiumAccounts::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(PremiumAccounts::Id)
              .integer()
              .not_null()
              .auto_increment()
              .primary_key(),
          )
          .col(ColumnDef::new(PremiumAccounts::ServiceName).string().not_null())
          .col(
            ColumnDef::new(PremiumAccounts::AccountType)
              .string()
              .not_null()
              .default("SHARED"),
          )
          .col(
            ColumnDef::new(PremiumAccounts::Status)
              .string()
              .not_null()
              .default("ACTIVE"),
          )
          .col(ColumnDef::new(PremiumAccounts::Credentials).text().not_null())
          .col(ColumnDef::new(PremiumAccounts::CreatedAt).date_time().not_null())
          .to_owned(),
      )
      .await?;

    manager
      .create_table(
        Table::create()
          .table(AccountRequests::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(AccountRequests::Id)
              .integer()
              .not_null()
              .auto_increment()
              .primary_key(),
          )
          .col(ColumnDef::new(AccountRequests::UserId).integer().not_null())
          .col(ColumnDef::new(AccountRequests::ResourceName).string().not_null())
          .col(
            ColumnDef::new(AccountRequests::Status)
              .string()
              .not_null()
              .default("PENDING"),
          )
          .col(ColumnDef::new(AccountRequests::AdminNotes).text().null())
          .col(ColumnDef::new(AccountRequests::DecidedBy).integer().null())
          .col(ColumnDef::new(AccountRequests::DecidedAt).date_time().null())
          .col(ColumnDef::new(AccountRequests::CreatedAt).date_time().not_null())
          .foreign_key(
            ForeignKey::create()
              .name("fk_account_requests_user")
              .from(AccountRequests::Table, AccountRequests::UserId)
              .to(Users::Table, Users::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_account_requests_user")
          .table(AccountRequests::Table)
          .col(AccountRequests::UserId)
          .to_owned(),
      )
      .await?;

    manager
      .create_table(
        Table::create()
          .table(LicenseKeys::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(LicenseKeys::Id)
              .integer()
              .not_null()
              .auto_increment()
              .primary_key(),
          )
          .col(ColumnDef::new(LicenseKeys::SoftwareName).string().not_null())
          .col(ColumnDef::new(LicenseKeys::Key).string().not_null().unique_key())
          .col(
            ColumnDef::new(LicenseKeys::Status)
              .string()
              .not_null()
              .default("AVAILABLE"),
          )
          .col(ColumnDef::new(LicenseKeys::AssignedTo).integer().null())
          .col(ColumnDef::new(LicenseKeys::AssignedAt).date_time().null())
          .col(ColumnDef::new(LicenseKeys::CreatedAt).date_time().not_null())
          .foreign_key(
            ForeignKey::create()
              .name("fk_license_keys_user")
              .from(LicenseKeys::Table, LicenseKeys::AssignedTo)
              .to(Users::Table, Users::Id)
              .on_delete(ForeignKeyAction::Restrict),
          )
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .drop_table(Table::drop().table(LicenseKeys::Table).to_owned())
      .await?;
    manager
      .drop_table(Table::drop().table(AccountRequests::Table).to_owned())
      .await?;
    manager
      .drop_table(Table::drop().table(PremiumAccounts::Table).to_owned())
      .await
  }
}

#[derive(DeriveIden)]
pub enum PremiumAccounts {
  Table,
  Id,
  ServiceName,
  AccountType,
  Status,
  Credentials,
  CreatedAt,
}

#[derive(DeriveIden)]
pub enum AccountRequests {
  Table,
  Id,
  UserId,
  ResourceName,
  Status,
  AdminNotes,
  DecidedBy,
  DecidedAt,
  CreatedAt,
}

#[derive(DeriveIden)]
pub enum LicenseKeys {
  Table,
  Id,
  SoftwareName,
  Key,
  Status,
  AssignedTo,
  AssignedAt,
  CreatedAt,
}
