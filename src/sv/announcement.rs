use serde::Deserialize;

use super::{Actor, Audit};
use crate::{entity::announcement, prelude::*};

#[derive(Debug, Deserialize)]
pub struct AnnouncementInput {
  pub title: String,
  pub body: String,
  #[serde(default = "active")]
  pub is_active: bool,
}

fn active() -> bool {
  true
}

pub struct Announcement<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> Announcement<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  /// What users see on their dashboard.
  pub async fn active(&self) -> Result<Vec<announcement::Model>> {
    let rows = announcement::Entity::find()
      .filter(announcement::Column::IsActive.eq(true))
      .order_by_desc(announcement::Column::CreatedAt)
      .order_by_desc(announcement::Column::Id)
      .all(self.db)
      .await?;
    Ok(rows)
  }

  pub async fn all(&self) -> Result<Vec<announcement::Model>> {
    let rows = announcement::Entity::find()
      .order_by_desc(announcement::Column::CreatedAt)
      .order_by_desc(announcement::Column::Id)
      .all(self.db)
      .await?;
    Ok(rows)
  }

  pub async fn create(
    &self,
    actor: &Actor,
    input: AnnouncementInput,
  ) -> Result<announcement::Model> {
    let txn = self.db.begin().await?;

    let announcement = announcement::ActiveModel {
      id: NotSet,
      title: Set(utils::required("Title", &input.title)?),
      body: Set(utils::required("Body", &input.body)?),
      is_active: Set(input.is_active),
      created_by: Set(actor.id),
      created_at: Set(utils::now()),
    }
    .insert(&txn)
    .await?;

    Audit::record(
      &txn,
      actor,
      "announcement.create",
      Some(format!("announcement:{}", announcement.id)),
      Some(announcement.title.clone()),
    )
    .await?;
    txn.commit().await?;

    Ok(announcement)
  }

  pub async fn update(
    &self,
    actor: &Actor,
    id: i32,
    input: AnnouncementInput,
  ) -> Result<announcement::Model> {
    let txn = self.db.begin().await?;

    let current = announcement::Entity::find_by_id(id)
      .one(&txn)
      .await?
      .ok_or(Error::AnnouncementNotFound)?;

    let announcement = announcement::ActiveModel {
      title: Set(utils::required("Title", &input.title)?),
      body: Set(utils::required("Body", &input.body)?),
      is_active: Set(input.is_active),
      ..current.into()
    }
    .update(&txn)
    .await?;

    Audit::record(
      &txn,
      actor,
      "announcement.update",
      Some(format!("announcement:{id}")),
      None,
    )
    .await?;
    txn.commit().await?;

    Ok(announcement)
  }

  pub async fn delete(&self, actor: &Actor, id: i32) -> Result<()> {
    let txn = self.db.begin().await?;

    let deleted = announcement::Entity::delete_by_id(id).exec(&txn).await?;
    if deleted.rows_affected == 0 {
      return Err(Error::AnnouncementNotFound);
    }

    Audit::record(
      &txn,
      actor,
      "announcement.delete",
      Some(format!("announcement:{id}")),
      None,
    )
    .await?;
    txn.commit().await?;

    Ok(())
  }
}
