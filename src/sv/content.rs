use serde::{Deserialize, Serialize};

use super::{Actor, Audit};
use crate::{
  entity::{CategoryKind, category, software, video},
  prelude::*,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
  Category,
  Video,
  Software,
}

impl ContentKind {
  fn target(self, id: i32) -> String {
    let kind = match self {
      ContentKind::Category => "category",
      ContentKind::Video => "video",
      ContentKind::Software => "software",
    };
    format!("{kind}:{id}")
  }
}

/// Admin payload: absent `id` creates, present `id` updates.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentInput {
  Category {
    id: Option<i32>,
    name: String,
    kind: CategoryKind,
  },
  Video {
    id: Option<i32>,
    category_id: Option<i32>,
    title: String,
    url: String,
    description: Option<String>,
  },
  Software {
    id: Option<i32>,
    category_id: Option<i32>,
    name: String,
    version: Option<String>,
    download_url: String,
    description: Option<String>,
  },
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentItem {
  Category(category::Model),
  Video(video::Model),
  Software(software::Model),
}

impl ContentItem {
  pub fn id(&self) -> i32 {
    match self {
      ContentItem::Category(model) => model.id,
      ContentItem::Video(model) => model.id,
      ContentItem::Software(model) => model.id,
    }
  }

  fn kind(&self) -> ContentKind {
    match self {
      ContentItem::Category(_) => ContentKind::Category,
      ContentItem::Video(_) => ContentKind::Video,
      ContentItem::Software(_) => ContentKind::Software,
    }
  }
}

pub struct Content<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> Content<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  /// Entries may only be filed under a category of their own kind.
  async fn check_category<C: ConnectionTrait>(
    conn: &C,
    id: Option<i32>,
    kind: CategoryKind,
  ) -> Result<()> {
    let Some(id) = id else { return Ok(()) };

    match category::Entity::find_by_id(id).one(conn).await? {
      Some(category) if category.kind == kind => Ok(()),
      Some(_) => Err(Error::invalid("Category holds a different kind of content")),
      None => Err(Error::invalid("Category does not exist")),
    }
  }

  pub async fn save(&self, actor: &Actor, input: ContentInput) -> Result<ContentItem> {
    let txn = self.db.begin().await?;
    let now = utils::now();

    let (item, created) = match input {
      ContentInput::Category { id, name, kind } => {
        let name = utils::required("Name", &name)?;
        let model = match id {
          None => {
            category::ActiveModel {
              id: NotSet,
              name: Set(name),
              kind: Set(kind),
              created_at: Set(now),
            }
            .insert(&txn)
            .await?
          }
          Some(id) => {
            let current = category::Entity::find_by_id(id)
              .one(&txn)
              .await?
              .ok_or(Error::ContentNotFound)?;
            if current.kind != kind && Self::category_used(&txn, id).await? {
              return Err(Error::CategoryInUse);
            }
            category::ActiveModel { name: Set(name), kind: Set(kind), ..current.into() }
              .update(&txn)
              .await?
          }
        };
        (ContentItem::Category(model), id.is_none())
      }
      ContentInput::Video { id, category_id, title, url, description } => {
        Self::check_category(&txn, category_id, CategoryKind::Video).await?;
        let title = utils::required("Title", &title)?;
        let url = utils::required("URL", &url)?;
        let description = utils::optional(description);

        let model = match id {
          None => {
            video::ActiveModel {
              id: NotSet,
              category_id: Set(category_id),
              title: Set(title),
              url: Set(url),
              description: Set(description),
              created_at: Set(now),
            }
            .insert(&txn)
            .await?
          }
          Some(id) => {
            let current = video::Entity::find_by_id(id)
              .one(&txn)
              .await?
              .ok_or(Error::ContentNotFound)?;
            video::ActiveModel {
              category_id: Set(category_id),
              title: Set(title),
              url: Set(url),
              description: Set(description),
              ..current.into()
            }
            .update(&txn)
            .await?
          }
        };
        (ContentItem::Video(model), id.is_none())
      }
      ContentInput::Software {
        id,
        category_id,
        name,
        version,
        download_url,
        description,
      } => {
        Self::check_category(&txn, category_id, CategoryKind::Software).await?;
        let name = utils::required("Name", &name)?;
        let download_url = utils::required("Download URL", &download_url)?;
        let version = utils::optional(version);
        let description = utils::optional(description);

        let model = match id {
          None => {
            software::ActiveModel {
              id: NotSet,
              category_id: Set(category_id),
              name: Set(name),
              version: Set(version),
              download_url: Set(download_url),
              description: Set(description),
              created_at: Set(now),
            }
            .insert(&txn)
            .await?
          }
          Some(id) => {
            let current = software::Entity::find_by_id(id)
              .one(&txn)
              .await?
              .ok_or(Error::ContentNotFound)?;
            software::ActiveModel {
              category_id: Set(category_id),
              name: Set(name),
              version: Set(version),
              download_url: Set(download_url),
              description: Set(description),
              ..current.into()
            }
            .update(&txn)
            .await?
          }
        };
        (ContentItem::Software(model), id.is_none())
      }
    };

    let action = if created { "content.create" } else { "content.update" };
    Audit::record(&txn, actor, action, Some(item.kind().target(item.id())), None)
      .await?;
    txn.commit().await?;

    Ok(item)
  }

  async fn category_used<C: ConnectionTrait>(conn: &C, id: i32) -> Result<bool> {
    let videos = video::Entity::find()
      .filter(video::Column::CategoryId.eq(id))
      .count(conn)
      .await?;
    let software = software::Entity::find()
      .filter(software::Column::CategoryId.eq(id))
      .count(conn)
      .await?;
    Ok(videos + software > 0)
  }

  pub async fn delete(&self, actor: &Actor, kind: ContentKind, id: i32) -> Result<()> {
    let txn = self.db.begin().await?;

    let deleted = match kind {
      ContentKind::Category => {
        if Self::category_used(&txn, id).await? {
          return Err(Error::CategoryInUse);
        }
        category::Entity::delete_by_id(id).exec(&txn).await?
      }
      ContentKind::Video => video::Entity::delete_by_id(id).exec(&txn).await?,
      ContentKind::Software => software::Entity::delete_by_id(id).exec(&txn).await?,
    };
    if deleted.rows_affected == 0 {
      return Err(Error::ContentNotFound);
    }

    Audit::record(&txn, actor, "content.delete", Some(kind.target(id)), None).await?;
    txn.commit().await?;

    Ok(())
  }

  pub async fn list(&self, kind: Option<ContentKind>) -> Result<Vec<ContentItem>> {
    let wants = |k: ContentKind| kind.is_none_or(|kind| kind == k);
    let mut items = Vec::new();

    if wants(ContentKind::Category) {
      let rows = category::Entity::find()
        .order_by_asc(category::Column::Kind)
        .order_by_asc(category::Column::Name)
        .all(self.db)
        .await?;
      items.extend(rows.into_iter().map(ContentItem::Category));
    }
    if wants(ContentKind::Video) {
      let rows = video::Entity::find()
        .order_by_desc(video::Column::CreatedAt)
        .order_by_desc(video::Column::Id)
        .all(self.db)
        .await?;
      items.extend(rows.into_iter().map(ContentItem::Video));
    }
    if wants(ContentKind::Software) {
      let rows = software::Entity::find()
        .order_by_asc(software::Column::Name)
        .all(self.db)
        .await?;
      items.extend(rows.into_iter().map(ContentItem::Software));
    }

    Ok(items)
  }
}
