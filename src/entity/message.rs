use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::ticket;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "ticket_messages")]
pub struct Model {
  #[sea_orm(primary_key)]
  pub id: i32,
  pub ticket_id: i32,
  pub user_id: i32,
  pub message: String,
  pub attachment_url: Option<String>,
  pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(
    belongs_to = "ticket::Entity",
    from = "Column::TicketId",
    to = "ticket::Column::Id"
  )]
  Ticket,
  #[sea_orm(has_many = "super::reaction::Entity")]
  Reactions,
}

impl Related<ticket::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Ticket.def()
  }
}

impl Related<super::reaction::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Reactions.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
