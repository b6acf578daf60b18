use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// Partial indexes are not expressible through the index builder.
#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .get_connection()
      .execute_unprepared(
        "CREATE UNIQUE INDEX IF NOT EXISTS uq_account_requests_pending \
         ON account_requests (user_id, resource_name) \
         WHERE status = 'PENDING'",
      )
      .await?;
    Ok(())
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .get_connection()
      .execute_unprepared("DROP INDEX IF EXISTS uq_account_requests_pending")
      .await?;
    Ok(())
  }
}
