use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(
  Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "UPPERCASE")]
pub enum AccountType {
  #[sea_orm(string_value = "SHARED")]
  Shared,
  #[sea_orm(string_value = "PRIVATE")]
  Private,
}

#[derive(
  Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "UPPERCASE")]
pub enum PremiumStatus {
  #[sea_orm(string_value = "ACTIVE")]
  Active,
  #[sea_orm(string_value = "INACTIVE")]
  Inactive,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "premium_accounts")]
pub struct Model {
  #[sea_orm(primary_key)]
  pub id: i32,
  pub service_name: String,
  pub account_type: AccountType,
  pub status: PremiumStatus,
  pub credentials: String,
  pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
