use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(Categories::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(Categories::Id)
              .integer()
              .not_null()
              .auto_increment()
              .primary_key(),
          )
          .col(ColumnDef::new(Categories::Name).string().not_null())
          .col(ColumnDef::new(Categories::Kind).string().not_null())
          .col(ColumnDef::new(Categories::CreatedAt).date_time().not_null())
          .to_owned(),
      )
      .await?;

    manager
      .create_table(
        Table::create()
          .table(Videos::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(Videos::Id)
              .integer()
              .not_null()
              .auto_increment()
              .primary_key(),
          )
          .col(ColumnDef::new(Videos::CategoryId).integer().null())
          .col(ColumnDef::new(Videos::Title).string().not_null())
          .col(ColumnDef::new(Videos::Url).string().not_null())
          .col(ColumnDef::new(Videos::Description).text().null())
          .col(ColumnDef::new(Videos::CreatedAt).date_time().not_null())
          .foreign_key(
            ForeignKey::create()
              .name("fk_videos_category")
              .from(Videos::Table, Videos::CategoryId)
              .to(Categories::Table, Categories::Id)
              .on_delete(ForeignKeyAction::Restrict),
          )
          .to_owned(),
      )
      .await?;

    manager
      .create_table(
        Table::create()
          .table(Software::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(Software::Id)
              .integer()
              .not_null()
              .auto_increment()
              .primary_key(),
          )
          .col(ColumnDef::new(Software::CategoryId).integer().null())
          .col(ColumnDef::new(Software::Name).string().not_null())
          .col(ColumnDef::new(Software::Version).string().null())
          .col(ColumnDef::new(Software::DownloadUrl).string().not_null())
          .col(ColumnDef::new(Software::Description).text().null())
          .col(ColumnDef::new(Software::CreatedAt).date_time().not_null())
          .foreign_key(
            ForeignKey::create()
              .name("fk_software_category")
              .from(Software::Table, Software::CategoryId)
              .to(Categories::Table, Categories::Id)
              .on_delete(ForeignKeyAction::Restrict),
          )
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager.drop_table(Table::drop().table(Software::Table).to_owned()).await?;
    manager.drop_table(Table::drop().table(Videos::Table).to_owned()).await?;
    manager.drop_table(Table::drop().table(Categories::Table).to_owned()).await
  }
}

#[derive(DeriveIden)]
pub enum Categories {
  Table,
  Id,
  Name,
  Kind,
  CreatedAt,
}

#[derive(DeriveIden)]
pub enum Videos {
  Table,
  Id,
  CategoryId,
  Title,
  Url,
  Description,
  CreatedAt,
}

#[derive(DeriveIden)]
pub enum Software {
  Table,
  Id,
  CategoryId,
  Name,
  Version,
  DownloadUrl,
  Description,
  CreatedAt,
}
