use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(AuditLogs::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(AuditLogs::Id)
              .integer()
              .not_null()
              .auto_increment()
              .primary_key(),
          )
          .col(ColumnDef::new(AuditLogs::AdminId).integer().not_null())
          .col(ColumnDef::new(AuditLogs::Action).string().not_null())
          .col(ColumnDef::new(AuditLogs::Target).string().null())
          .col(ColumnDef::new(AuditLogs::Details).text().null())
          .col(ColumnDef::new(AuditLogs::IpAddress).string().null())
          .col(ColumnDef::new(AuditLogs::CreatedAt).date_time().not_null())
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_audit_logs_admin")
          .table(AuditLogs::Table)
          .col(AuditLogs::AdminId)
          .to_owned(),
      )
      .await?;

    manager
      .create_table(
        Table::create()
          .table(Announcements::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(Announcements::Id)
              .integer()
              .not_null()
              .auto_increment()
              .primary_key(),
          )
          .col(ColumnDef::new(Announcements::Title).string().not_null())
          .col(ColumnDef::new(Announcements::Body).text().not_null())
          .col(
            ColumnDef::new(Announcements::IsActive)
              .boolean()
              .not_null()
              .default(true),
          )
          .col(ColumnDef::new(Announcements::CreatedBy).integer().not_null())
          .col(ColumnDef::new(Announcements::CreatedAt).date_time().not_null())
          .to_owned(),
      )
      .await?;

    manager
      .create_table(
        Table::create()
          .table(SystemSettings::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(SystemSettings::Key)
              .string()
              .not_null()
              .primary_key(),
          )
          .col(ColumnDef::new(SystemSettings::Value).text().not_null())
          .col(ColumnDef::new(SystemSettings::UpdatedAt).date_time().not_null())
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .drop_table(Table::drop().table(SystemSettings::Table).to_owned())
      .await?;
    manager
      .drop_table(Table::drop().table(Announcements::Table).to_owned())
      .await?;
    manager.drop_table(Table::drop().table(AuditLogs::Table).to_owned()).await
  }
}

#[derive(DeriveIden)]
pub enum AuditLogs {
  Table,
  Id,
  AdminId,
  Action,
  Target,
  Details,
  IpAddress,
  CreatedAt,
}

#[derive(DeriveIden)]
pub enum Announcements {
  Table,
  Id,
  Title,
  Body,
  IsActive,
  CreatedBy,
  CreatedAt,
}

#[derive(DeriveIden)]
pub enum SystemSettings {
  Table,
  Key,
  Value,
  UpdatedAt,
}
