use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "software")]
pub struct Model {
  #[sea_orm(primary_key)]
  pub id: i32,
  pub category_id: Option<i32>,
  pub name: String,
  pub version: Option<String>,
  pub download_url: String,
  pub description: Option<String>,
  pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
