use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::user;

#[derive(
  Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketStatus {
  #[sea_orm(string_value = "OPEN")]
  Open,
  #[sea_orm(string_value = "IN_PROGRESS")]
  InProgress,
  #[sea_orm(string_value = "RESOLVED")]
  Resolved,
  #[sea_orm(string_value = "CLOSED")]
  Closed,
}

impl TicketStatus {
  /// Resolved or closed tickets accept feedback and no longer count as open.
  pub fn is_settled(self) -> bool {
    matches!(self, TicketStatus::Resolved | TicketStatus::Closed)
  }
}

#[derive(
  Clone,
  Copy,
  Debug,
  Default,
  PartialEq,
  Eq,
  EnumIter,
  DeriveActiveEnum,
  Serialize,
  Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "UPPERCASE")]
pub enum TicketPriority {
  #[sea_orm(string_value = "LOW")]
  Low,
  #[default]
  #[sea_orm(string_value = "MEDIUM")]
  Medium,
  #[sea_orm(string_value = "HIGH")]
  High,
  #[sea_orm(string_value = "URGENT")]
  Urgent,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "support_tickets")]
pub struct Model {
  #[sea_orm(primary_key)]
  pub id: i32,
  pub user_id: i32,
  pub subject: String,
  pub status: TicketStatus,
  pub priority: TicketPriority,
  pub created_at: DateTime,
  pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(
    belongs_to = "user::Entity",
    from = "Column::UserId",
    to = "user::Column::Id"
  )]
  User,
  #[sea_orm(has_many = "super::message::Entity")]
  Messages,
}

impl Related<user::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::User.def()
  }
}

impl Related<super::message::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Messages.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
