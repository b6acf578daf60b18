//! Append-only record of admin mutations

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "audit_logs")]
pub struct Model {
  #[sea_orm(primary_key)]
  pub id: i32,
  pub admin_id: i32,
  /// Dotted action name, e.g. `license.assign`
  pub action: String,
  pub target: Option<String>,
  pub details: Option<String>,
  pub ip_address: Option<String>,
  pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
