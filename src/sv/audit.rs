use serde::Deserialize;

use super::Actor;
use crate::{entity::audit_log, prelude::*};

const MAX_PAGE: u64 = 200;

#[derive(Debug, Default, Deserialize)]
pub struct AuditQuery {
  pub limit: Option<u64>,
  pub offset: Option<u64>,
  pub admin_id: Option<i32>,
}

pub struct Audit<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> Audit<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  /// Appends an entry on `conn`, normally the transaction that carries the
  /// mutation being recorded.
  pub async fn record<C: ConnectionTrait>(
    conn: &C,
    actor: &Actor,
    action: &str,
    target: Option<String>,
    details: Option<String>,
  ) -> Result<()> {
    audit_log::ActiveModel {
      id: NotSet,
      admin_id: Set(actor.id),
      action: Set(action.to_string()),
      target: Set(target),
      details: Set(details),
      ip_address: Set(actor.ip.clone()),
      created_at: Set(utils::now()),
    }
    .insert(conn)
    .await?;

    info!(admin = actor.id, action, "audit");
    Ok(())
  }

  pub async fn list(&self, query: &AuditQuery) -> Result<Vec<audit_log::Model>> {
    let mut select = audit_log::Entity::find()
      .order_by_desc(audit_log::Column::CreatedAt)
      .order_by_desc(audit_log::Column::Id);

    if let Some(admin_id) = query.admin_id {
      select = select.filter(audit_log::Column::AdminId.eq(admin_id));
    }

    let entries = select
      .offset(query.offset.unwrap_or(0))
      .limit(query.limit.unwrap_or(50).min(MAX_PAGE))
      .all(self.db)
      .await?;

    Ok(entries)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{entity::Role, sv::testing::*};

  #[tokio::test]
  async fn test_list_newest_first_and_filtered() {
    let db = setup_test_db().await;
    let first = actor(1, Role::Admin);
    let second = actor(2, Role::SuperAdmin);

    Audit::record(&db, &first, "serial.import", None, None).await.unwrap();
    Audit::record(&db, &second, "settings.update", None, None).await.unwrap();
    Audit::record(&db, &first, "license.assign", Some("license:3".into()), None)
      .await
      .unwrap();

    let all = Audit::new(&db).list(&AuditQuery::default()).await.unwrap();
    let actions: Vec<_> = all.iter().map(|e| e.action.as_str()).collect();
    assert_eq!(actions, ["license.assign", "settings.update", "serial.import"]);
    assert_eq!(all[0].ip_address.as_deref(), Some("127.0.0.1"));

    let mine = Audit::new(&db)
      .list(&AuditQuery { admin_id: Some(1), limit: Some(1), offset: None })
      .await
      .unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].target.as_deref(), Some("license:3"));
  }
}
