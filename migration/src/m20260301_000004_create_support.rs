use sea_orm_migration::prelude::*;

use super::m20260301_000001_create_users::Users;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(SupportTickets::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(SupportTickets::Id)
              .integer()
              .not_null()
              .auto_increment()
              .primary_key(),
          )
          .col(ColumnDef::new(SupportTickets::UserId).integer().not_null())
          .col(ColumnDef::new(SupportTickets::Subject).string().not_null())
          .col(
            ColumnDef::new(SupportTickets::Status)
              .string()
              .not_null()
              .default("OPEN"),
          )
          .col(
            ColumnDef::new(SupportTickets::Priority)
              .string()
              .not_null()
              .default("MEDIUM"),
          )
          .col(ColumnDef::new(SupportTickets::CreatedAt).date_time().not_null())
          .col(ColumnDef::new(SupportTickets::UpdatedAt).date_time().not_null())
          .foreign_key(
            ForeignKey::create()
              .name("fk_support_tickets_user")
              .from(SupportTickets::Table, SupportTickets::UserId)
              .to(Users::Table, Users::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .to_owned(),
      )
      .await?;

    manager
      .create_table(
        Table::create()
          .table(TicketMessages::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(TicketMessages::Id)
              .integer()
              .not_null()
              .auto_increment()
              .primary_key(),
          )
          .col(ColumnDef::new(TicketMessages::TicketId).integer().not_null())
          .col(ColumnDef::new(TicketMessages::UserId).integer().not_null())
          .col(ColumnDef::new(TicketMessages::Message).text().not_null())
          .col(ColumnDef::new(TicketMessages::AttachmentUrl).string().null())
          .col(ColumnDef::new(TicketMessages::CreatedAt).date_time().not_null())
          .foreign_key(
            ForeignKey::create()
              .name("fk_ticket_messages_ticket")
              .from(TicketMessages::Table, TicketMessages::TicketId)
              .to(SupportTickets::Table, SupportTickets::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_ticket_messages_ticket")
          .table(TicketMessages::Table)
          .col(TicketMessages::TicketId)
          .col(TicketMessages::CreatedAt)
          .to_owned(),
      )
      .await?;

    manager
      .create_table(
        Table::create()
          .table(MessageReactions::Table)
          .if_not_exists()
          .col(ColumnDef::new(MessageReactions::MessageId).integer().not_null())
          .col(ColumnDef::new(MessageReactions::UserId).integer().not_null())
          .col(ColumnDef::new(MessageReactions::Emoji).string().not_null())
          .col(
            ColumnDef::new(MessageReactions::CreatedAt).date_time().not_null(),
          )
          .primary_key(
            Index::create()
              .col(MessageReactions::MessageId)
              .col(MessageReactions::UserId),
          )
          .foreign_key(
            ForeignKey::create()
              .name("fk_message_reactions_message")
              .from(MessageReactions::Table, MessageReactions::MessageId)
              .to(TicketMessages::Table, TicketMessages::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .to_owned(),
      )
      .await?;

    manager
      .create_table(
        Table::create()
          .table(TicketFeedback::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(TicketFeedback::TicketId)
              .integer()
              .not_null()
              .primary_key(),
          )
          .col(ColumnDef::new(TicketFeedback::UserId).integer().not_null())
          .col(ColumnDef::new(TicketFeedback::Rating).integer().not_null())
          .col(ColumnDef::new(TicketFeedback::Comment).text().null())
          .col(ColumnDef::new(TicketFeedback::CreatedAt).date_time().not_null())
          .foreign_key(
            ForeignKey::create()
              .name("fk_ticket_feedback_ticket")
              .from(TicketFeedback::Table, TicketFeedback::TicketId)
              .to(SupportTickets::Table, SupportTickets::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .drop_table(Table::drop().table(TicketFeedback::Table).to_owned())
      .await?;
    manager
      .drop_table(Table::drop().table(MessageReactions::Table).to_owned())
      .await?;
    manager
      .drop_table(Table::drop().table(TicketMessages::Table).to_owned())
      .await?;
    manager
      .drop_table(Table::drop().table(SupportTickets::Table).to_owned())
      .await
  }
}

#[derive(DeriveIden)]
pub enum SupportTickets {
  Table,
  Id,
  UserId,
  Subject,
  Status,
  Priority,
  CreatedAt,
  UpdatedAt,
}

#[derive(DeriveIden)]
pub enum TicketMessages {
  Table,
  Id,
  TicketId,
  UserId,
  Message,
  AttachmentUrl,
  CreatedAt,
}

#[derive(DeriveIden)]
pub enum MessageReactions {
  Table,
  MessageId,
  UserId,
  Emoji,
  CreatedAt,
}

#[derive(DeriveIden)]
pub enum TicketFeedback {
  Table,
  TicketId,
  UserId,
  Rating,
  Comment,
  CreatedAt,
}
