use std::collections::HashMap;

use sea_orm::sea_query::Expr;
use serde::{Deserialize, Serialize};

use super::{Actor, Audit};
use crate::{
  entity::{
    TicketPriority, TicketStatus, feedback, message, reaction, ticket,
  },
  error::is_unique_violation,
  prelude::*,
  sv,
};

const MAX_EMOJI_LEN: usize = 16;

#[derive(Debug, Deserialize)]
pub struct NewTicket {
  pub subject: String,
  pub message: String,
  #[serde(default)]
  pub priority: Option<TicketPriority>,
}

#[derive(Debug, Deserialize)]
pub struct NewMessage {
  pub message: String,
  #[serde(default)]
  pub attachment_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NewFeedback {
  pub rating: i32,
  #[serde(default)]
  pub comment: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MessageView {
  #[serde(flatten)]
  pub message: message::Model,
  pub reactions: Vec<reaction::Model>,
}

#[derive(Debug, Serialize)]
pub struct Thread {
  pub ticket: ticket::Model,
  pub messages: Vec<MessageView>,
  pub feedback: Option<feedback::Model>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Reacted {
  Added,
  Removed,
  Replaced,
}

pub struct Ticket<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> Ticket<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  /// Loads a ticket the viewer may see. Other users' tickets look missing.
  async fn visible<C: ConnectionTrait>(
    conn: &C,
    viewer: &Actor,
    id: i32,
  ) -> Result<ticket::Model> {
    ticket::Entity::find_by_id(id)
      .one(conn)
      .await?
      .filter(|ticket| viewer.is_admin() || ticket.user_id == viewer.id)
      .ok_or(Error::TicketNotFound)
  }

  pub async fn create(&self, user_id: i32, new: NewTicket) -> Result<ticket::Model> {
    let subject = utils::required("Subject", &new.subject)?;
    let body = utils::required("Message", &new.message)?;
    let limit = sv::Settings::new(self.db).get().await?.max_open_tickets;

    let txn = self.db.begin().await?;

    if limit > 0 {
      let open = ticket::Entity::find()
        .filter(ticket::Column::UserId.eq(user_id))
        .filter(
          ticket::Column::Status
            .is_in([TicketStatus::Open, TicketStatus::InProgress]),
        )
        .count(&txn)
        .await?;
      if open >= u64::from(limit) {
        return Err(Error::TooManyOpenTickets);
      }
    }

    let now = utils::now();
    let ticket = ticket::ActiveModel {
      id: NotSet,
      user_id: Set(user_id),
      subject: Set(subject),
      status: Set(TicketStatus::Open),
      priority: Set(new.priority.unwrap_or_default()),
      created_at: Set(now),
      updated_at: Set(now),
    }
    .insert(&txn)
    .await?;

    message::ActiveModel {
      id: NotSet,
      ticket_id: Set(ticket.id),
      user_id: Set(user_id),
      message: Set(body),
      attachment_url: Set(None),
      created_at: Set(now),
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;
    info!("Ticket {} opened by user {}", ticket.id, user_id);

    Ok(ticket)
  }

  pub async fn thread(&self, viewer: &Actor, id: i32) -> Result<Thread> {
    let ticket = Self::visible(self.db, viewer, id).await?;

    let messages = message::Entity::find()
      .filter(message::Column::TicketId.eq(id))
      .order_by_asc(message::Column::CreatedAt)
      .order_by_asc(message::Column::Id)
      .all(self.db)
      .await?;

    let mut reactions: HashMap<i32, Vec<reaction::Model>> = HashMap::new();
    if !messages.is_empty() {
      let rows = reaction::Entity::find()
        .filter(reaction::Column::MessageId.is_in(messages.iter().map(|m| m.id)))
        .order_by_asc(reaction::Column::CreatedAt)
        .all(self.db)
        .await?;
      for row in rows {
        reactions.entry(row.message_id).or_default().push(row);
      }
    }

    let feedback = feedback::Entity::find_by_id(id).one(self.db).await?;

    let messages = messages
      .into_iter()
      .map(|message| MessageView {
        reactions: reactions.remove(&message.id).unwrap_or_default(),
        message,
      })
      .collect();

    Ok(Thread { ticket, messages, feedback })
  }

  /// Appends to the thread unless the ticket is CLOSED. An admin answering
  /// an OPEN ticket takes it IN_PROGRESS.
  pub async fn append(
    &self,
    viewer: &Actor,
    id: i32,
    new: NewMessage,
  ) -> Result<message::Model> {
    let body = utils::required("Message", &new.message)?;
    let now = utils::now();

    let txn = self.db.begin().await?;
    let ticket = Self::visible(&txn, viewer, id).await?;

    let starts_progress = viewer.is_admin() && ticket.status == TicketStatus::Open;

    let mut touch = ticket::Entity::update_many()
      .col_expr(ticket::Column::UpdatedAt, Expr::value(now))
      .filter(ticket::Column::Id.eq(id))
      .filter(ticket::Column::Status.ne(TicketStatus::Closed));
    if starts_progress {
      touch = touch
        .col_expr(ticket::Column::Status, Expr::value(TicketStatus::InProgress));
    }

    if touch.exec(&txn).await?.rows_affected == 0 {
      return Err(Error::TicketClosed);
    }

    if starts_progress {
      Audit::record(
        &txn,
        viewer,
        "ticket.status",
        Some(format!("ticket:{id}")),
        Some(format!("{:?} -> {:?}", TicketStatus::Open, TicketStatus::InProgress)),
      )
      .await?;
    }

    let message = message::ActiveModel {
      id: NotSet,
      ticket_id: Set(id),
      user_id: Set(viewer.id),
      message: Set(body),
      attachment_url: Set(utils::optional(new.attachment_url)),
      created_at: Set(now),
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;
    Ok(message)
  }

  pub async fn set_status(
    &self,
    actor: &Actor,
    id: i32,
    status: TicketStatus,
  ) -> Result<ticket::Model> {
    let txn = self.db.begin().await?;
    let ticket =
      ticket::Entity::find_by_id(id).one(&txn).await?.ok_or(Error::TicketNotFound)?;
    let previous = ticket.status;

    let ticket = ticket::ActiveModel {
      status: Set(status),
      updated_at: Set(utils::now()),
      ..ticket.into()
    }
    .update(&txn)
    .await?;

    Audit::record(
      &txn,
      actor,
      "ticket.status",
      Some(format!("ticket:{id}")),
      Some(format!("{previous:?} -> {status:?}")),
    )
    .await?;
    txn.commit().await?;

    Ok(ticket)
  }

  pub async fn set_priority(
    &self,
    actor: &Actor,
    id: i32,
    priority: TicketPriority,
  ) -> Result<ticket::Model> {
    let txn = self.db.begin().await?;
    let ticket =
      ticket::Entity::find_by_id(id).one(&txn).await?.ok_or(Error::TicketNotFound)?;

    let ticket = ticket::ActiveModel {
      priority: Set(priority),
      updated_at: Set(utils::now()),
      ..ticket.into()
    }
    .update(&txn)
    .await?;

    Audit::record(
      &txn,
      actor,
      "ticket.priority",
      Some(format!("ticket:{id}")),
      Some(format!("{priority:?}")),
    )
    .await?;
    txn.commit().await?;

    Ok(ticket)
  }

  /// One rating per ticket, from its owner, once it is resolved or closed.
  pub async fn feedback(
    &self,
    viewer: &Actor,
    id: i32,
    new: NewFeedback,
  ) -> Result<feedback::Model> {
    if !(1..=5).contains(&new.rating) {
      return Err(Error::invalid("Rating must be between 1 and 5"));
    }

    let txn = self.db.begin().await?;
    let ticket = Self::visible(&txn, viewer, id).await?;

    if ticket.user_id != viewer.id {
      return Err(Error::Forbidden);
    }
    if !ticket.status.is_settled() {
      return Err(Error::FeedbackNotAllowed);
    }
    if feedback::Entity::find_by_id(id).one(&txn).await?.is_some() {
      return Err(Error::FeedbackAlreadySubmitted);
    }

    let feedback = feedback::ActiveModel {
      ticket_id: Set(id),
      user_id: Set(viewer.id),
      rating: Set(new.rating),
      comment: Set(utils::optional(new.comment)),
      created_at: Set(utils::now()),
    }
    .insert(&txn)
    .await
    .map_err(|err| {
      if is_unique_violation(&err) {
        Error::FeedbackAlreadySubmitted
      } else {
        err.into()
      }
    })?;

    txn.commit().await?;
    Ok(feedback)
  }

  /// Toggles the viewer's reaction: same emoji removes it, another replaces it.
  pub async fn react(
    &self,
    viewer: &Actor,
    message_id: i32,
    emoji: &str,
  ) -> Result<Reacted> {
    let emoji = utils::required("Emoji", emoji)?;
    if emoji.chars().count() > MAX_EMOJI_LEN {
      return Err(Error::invalid("Emoji is too long"));
    }

    let txn = self.db.begin().await?;

    let message = message::Entity::find_by_id(message_id)
      .one(&txn)
      .await?
      .ok_or(Error::MessageNotFound)?;
    Self::visible(&txn, viewer, message.ticket_id)
      .await
      .map_err(|_| Error::MessageNotFound)?;

    let existing = reaction::Entity::find_by_id((message_id, viewer.id))
      .one(&txn)
      .await?;

    let outcome = match existing {
      Some(current) if current.emoji == emoji => {
        reaction::Entity::delete_by_id((message_id, viewer.id)).exec(&txn).await?;
        Reacted::Removed
      }
      Some(current) => {
        reaction::ActiveModel {
          emoji: Set(emoji),
          created_at: Set(utils::now()),
          ..current.into()
        }
        .update(&txn)
        .await?;
        Reacted::Replaced
      }
      None => {
        reaction::ActiveModel {
          message_id: Set(message_id),
          user_id: Set(viewer.id),
          emoji: Set(emoji),
          created_at: Set(utils::now()),
        }
        .insert(&txn)
        .await?;
        Reacted::Added
      }
    };

    txn.commit().await?;
    Ok(outcome)
  }

  pub async fn by_user(&self, user_id: i32) -> Result<Vec<ticket::Model>> {
    let tickets = ticket::Entity::find()
      .filter(ticket::Column::UserId.eq(user_id))
      .order_by_desc(ticket::Column::UpdatedAt)
      .all(self.db)
      .await?;
    Ok(tickets)
  }

  pub async fn list(
    &self,
    status: Option<TicketStatus>,
  ) -> Result<Vec<ticket::Model>> {
    let mut query =
      ticket::Entity::find().order_by_desc(ticket::Column::UpdatedAt);
    if let Some(status) = status {
      query = query.filter(ticket::Column::Status.eq(status));
    }
    Ok(query.all(self.db).await?)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    entity::{Role, user},
    sv::testing::*,
  };

  fn new_ticket(subject: &str) -> NewTicket {
    NewTicket {
      subject: subject.into(),
      message: "USB does not boot".into(),
      priority: None,
    }
  }

  fn say(text: &str) -> NewMessage {
    NewMessage { message: text.into(), attachment_url: None }
  }

  fn as_actor(user: &user::Model) -> Actor {
    actor(user.id, user.role)
  }

  async fn setup() -> (DatabaseConnection, Actor, Actor) {
    let db = setup_test_db().await;
    let owner = seed_user(&db, "owner@example.com", Role::User).await;
    let admin = seed_user(&db, "admin@example.com", Role::Admin).await;
    (db, as_actor(&owner), as_actor(&admin))
  }

  #[tokio::test]
  async fn test_create_with_first_message() {
    let (db, owner, _) = setup().await;
    let sv = Ticket::new(&db);

    let ticket = sv.create(owner.id, new_ticket("Boot issue")).await.unwrap();
    assert_eq!(ticket.status, TicketStatus::Open);
    assert_eq!(ticket.priority, TicketPriority::Medium);

    let thread = sv.thread(&owner, ticket.id).await.unwrap();
    assert_eq!(thread.messages.len(), 1);
    assert_eq!(thread.messages[0].message.message, "USB does not boot");
    assert!(thread.feedback.is_none());
  }

  #[tokio::test]
  async fn test_closed_ticket_rejects_messages() {
    let (db, owner, admin) = setup().await;
    let sv = Ticket::new(&db);
    let ticket = sv.create(owner.id, new_ticket("Boot issue")).await.unwrap();

    sv.set_status(&admin, ticket.id, TicketStatus::Closed).await.unwrap();

    let result = sv.append(&owner, ticket.id, say("hello?")).await;
    assert!(matches!(result, Err(Error::TicketClosed)));
    let result = sv.append(&admin, ticket.id, say("reopening?")).await;
    assert!(matches!(result, Err(Error::TicketClosed)));

    let thread = sv.thread(&owner, ticket.id).await.unwrap();
    assert_eq!(thread.messages.len(), 1);
  }

  #[tokio::test]
  async fn test_admin_reply_starts_progress() {
    let (db, owner, admin) = setup().await;
    let sv = Ticket::new(&db);
    let ticket = sv.create(owner.id, new_ticket("Boot issue")).await.unwrap();

    sv.append(&owner, ticket.id, say("any news?")).await.unwrap();
    assert_eq!(
      sv.thread(&owner, ticket.id).await.unwrap().ticket.status,
      TicketStatus::Open
    );

    let reply = NewMessage {
      message: "Try the other port".into(),
      attachment_url: Some(" https://cdn.example.com/guide.png ".into()),
    };
    let message = sv.append(&admin, ticket.id, reply).await.unwrap();
    assert_eq!(
      message.attachment_url.as_deref(),
      Some("https://cdn.example.com/guide.png")
    );

    let thread = sv.thread(&owner, ticket.id).await.unwrap();
    assert_eq!(thread.ticket.status, TicketStatus::InProgress);
    assert_eq!(audit_actions(&db).await, ["ticket.status"]);

    sv.append(&admin, ticket.id, say("Any luck?")).await.unwrap();
    assert_eq!(audit_actions(&db).await, ["ticket.status"]);

    let thread = sv.thread(&owner, ticket.id).await.unwrap();
    let texts: Vec<_> =
      thread.messages.iter().map(|m| m.message.message.as_str()).collect();
    assert_eq!(
      texts,
      ["USB does not boot", "any news?", "Try the other port", "Any luck?"]
    );
  }

  #[tokio::test]
  async fn test_strangers_cannot_see_ticket() {
    let (db, owner, admin) = setup().await;
    let stranger = seed_user(&db, "x@example.com", Role::User).await;
    let stranger = as_actor(&stranger);
    let sv = Ticket::new(&db);
    let ticket = sv.create(owner.id, new_ticket("Boot issue")).await.unwrap();

    assert!(matches!(sv.thread(&stranger, ticket.id).await, Err(Error::TicketNotFound)));
    assert!(matches!(
      sv.append(&stranger, ticket.id, say("hi")).await,
      Err(Error::TicketNotFound)
    ));
    assert!(sv.thread(&admin, ticket.id).await.is_ok());
  }

  #[tokio::test]
  async fn test_feedback_once_after_resolution() {
    let (db, owner, admin) = setup().await;
    let sv = Ticket::new(&db);
    let ticket = sv.create(owner.id, new_ticket("Boot issue")).await.unwrap();
    let rate = |rating| NewFeedback { rating, comment: Some("quick fix".into()) };

    assert!(matches!(
      sv.feedback(&owner, ticket.id, rate(5)).await,
      Err(Error::FeedbackNotAllowed)
    ));

    sv.set_status(&admin, ticket.id, TicketStatus::Resolved).await.unwrap();

    assert!(matches!(
      sv.feedback(&owner, ticket.id, rate(9)).await,
      Err(Error::InvalidArgs(_))
    ));
    assert!(matches!(sv.feedback(&admin, ticket.id, rate(5)).await, Err(Error::Forbidden)));

    let feedback = sv.feedback(&owner, ticket.id, rate(5)).await.unwrap();
    assert_eq!(feedback.rating, 5);

    sv.set_status(&admin, ticket.id, TicketStatus::Closed).await.unwrap();
    assert!(matches!(
      sv.feedback(&owner, ticket.id, rate(4)).await,
      Err(Error::FeedbackAlreadySubmitted)
    ));

    let thread = sv.thread(&owner, ticket.id).await.unwrap();
    assert_eq!(thread.feedback.map(|f| f.rating), Some(5));
  }

  #[tokio::test]
  async fn test_reaction_toggle() {
    let (db, owner, admin) = setup().await;
    let sv = Ticket::new(&db);
    let ticket = sv.create(owner.id, new_ticket("Boot issue")).await.unwrap();
    let message = sv.append(&admin, ticket.id, say("fixed?")).await.unwrap();

    assert_eq!(sv.react(&owner, message.id, "👍").await.unwrap(), Reacted::Added);
    assert_eq!(sv.react(&owner, message.id, "❤️").await.unwrap(), Reacted::Replaced);
    assert_eq!(sv.react(&admin, message.id, "👍").await.unwrap(), Reacted::Added);

    let thread = sv.thread(&owner, ticket.id).await.unwrap();
    let reactions = &thread.messages[1].reactions;
    assert_eq!(reactions.len(), 2);
    assert!(reactions.iter().any(|r| r.user_id == owner.id && r.emoji == "❤️"));

    assert_eq!(sv.react(&owner, message.id, "❤️").await.unwrap(), Reacted::Removed);
    let thread = sv.thread(&owner, ticket.id).await.unwrap();
    assert_eq!(thread.messages[1].reactions.len(), 1);

    assert!(matches!(sv.react(&owner, 9999, "👍").await, Err(Error::MessageNotFound)));
  }

  #[tokio::test]
  async fn test_open_ticket_limit() {
    let (db, owner, admin) = setup().await;
    let root = actor(admin.id, Role::SuperAdmin);
    sv::Settings::new(&db)
      .update(
        &root,
        sv::settings::SystemSettings { max_open_tickets: 1, ..Default::default() },
      )
      .await
      .unwrap();
    let sv = Ticket::new(&db);

    let first = sv.create(owner.id, new_ticket("one")).await.unwrap();
    assert!(matches!(
      sv.create(owner.id, new_ticket("two")).await,
      Err(Error::TooManyOpenTickets)
    ));

    sv.set_status(&admin, first.id, TicketStatus::Resolved).await.unwrap();
    sv.create(owner.id, new_ticket("two")).await.unwrap();
    assert_eq!(sv.by_user(owner.id).await.unwrap().len(), 2);
  }
}
