use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(
  Clone,
  Copy,
  Debug,
  PartialEq,
  Eq,
  Hash,
  EnumIter,
  DeriveActiveEnum,
  Serialize,
  Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
  #[sea_orm(string_value = "USER")]
  User,
  #[sea_orm(string_value = "ADMIN")]
  Admin,
  #[sea_orm(string_value = "SUPERADMIN")]
  SuperAdmin,
}

impl Role {
  fn rank(self) -> u8 {
    match self {
      Role::User => 0,
      Role::Admin => 1,
      Role::SuperAdmin => 2,
    }
  }

  pub fn at_least(self, required: Role) -> bool {
    self.rank() >= required.rank()
  }

  pub fn is_admin(self) -> bool {
    self.at_least(Role::Admin)
  }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
  #[sea_orm(primary_key)]
  pub id: i32,
  pub name: String,
  #[sea_orm(unique)]
  pub email: String,
  #[serde(skip_serializing)]
  pub password_hash: String,
  pub role: Role,
  pub is_active: bool,
  pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(has_one = "super::serial::Entity")]
  Serial,
  #[sea_orm(has_many = "super::request::Entity")]
  Requests,
  #[sea_orm(has_many = "super::ticket::Entity")]
  Tickets,
}

impl Related<super::serial::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Serial.def()
  }
}

impl Related<super::request::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Requests.def()
  }
}

impl Related<super::ticket::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Tickets.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
