//! Portal schema migrations

pub use sea_orm_migration::prelude::*;

mod m20260301_000001_create_users;
mod m20260301_000002_create_serial_numbers;
mod m20260301_000003_create_resources;
mod m20260301_000004_create_support;
mod m20260301_000005_create_content;
mod m20260301_000006_create_admin;
mod m20260315_000007_pending_request_index;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
  fn migrations() -> Vec<Box<dyn MigrationTrait>> {
    vec![
      Box::new(m20260301_000001_create_users::Migration),
      Box::new(m20260301_000002_create_serial_numbers::Migration),
      Box::new(m20260301_000003_create_resources::Migration),
      Box::new(m20260301_000004_create_support::Migration),
      Box::new(m20260301_000005_create_content::Migration),
      Box::new(m20260301_000006_create_admin::Migration),
      Box::new(m20260315_000007_pending_request_index::Migration),
    ]
  }
}
