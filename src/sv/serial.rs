use std::collections::HashSet;

use sea_orm::sea_query::Expr;
use serde::Serialize;

use super::{Actor, Audit};
use crate::{
  entity::{SerialStatus, serial},
  prelude::*,
};

const IMPORT_CHUNK: usize = 500;

#[derive(Debug, Default, Serialize)]
pub struct ImportReport {
  pub inserted: usize,
  pub duplicates: Vec<String>,
  pub invalid: Vec<String>,
}

pub struct Serial<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> Serial<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  pub async fn list(
    &self,
    status: Option<SerialStatus>,
  ) -> Result<Vec<serial::Model>> {
    let mut query = serial::Entity::find().order_by_asc(serial::Column::Id);
    if let Some(status) = status {
      query = query.filter(serial::Column::Status.eq(status));
    }
    Ok(query.all(self.db).await?)
  }

  pub async fn by_user(&self, user_id: i32) -> Result<Option<serial::Model>> {
    let serial = serial::Entity::find()
      .filter(serial::Column::UserId.eq(user_id))
      .one(self.db)
      .await?;
    Ok(serial)
  }

  /// Inserts new AVAILABLE serials, reporting malformed codes and codes that
  /// already exist (in the table or earlier in the batch).
  pub async fn bulk_import(
    &self,
    actor: &Actor,
    codes: Vec<String>,
  ) -> Result<ImportReport> {
    let mut report = ImportReport::default();
    let mut seen = HashSet::new();
    let mut fresh = Vec::new();

    for raw in codes {
      match utils::normalize_serial(&raw) {
        None => report.invalid.push(raw),
        Some(code) if !seen.insert(code.clone()) => report.duplicates.push(code),
        Some(code) => fresh.push(code),
      }
    }

    let txn = self.db.begin().await?;

    let mut existing = HashSet::new();
    for chunk in fresh.chunks(IMPORT_CHUNK) {
      let found = serial::Entity::find()
        .filter(serial::Column::Code.is_in(chunk.iter().map(String::as_str)))
        .all(&txn)
        .await?;
      existing.extend(found.into_iter().map(|s| s.code));
    }

    let (dups, fresh): (Vec<_>, Vec<_>) =
      fresh.into_iter().partition(|code| existing.contains(code));
    report.duplicates.extend(dups);
    report.inserted = fresh.len();

    let now = utils::now();
    for chunk in fresh.chunks(IMPORT_CHUNK) {
      let models = chunk.iter().map(|code| serial::ActiveModel {
        id: NotSet,
        code: Set(code.clone()),
        status: Set(SerialStatus::Available),
        user_id: Set(None),
        assigned_at: Set(None),
        created_at: Set(now),
      });
      serial::Entity::insert_many(models).exec(&txn).await?;
    }

    Audit::record(
      &txn,
      actor,
      "serial.import",
      None,
      Some(format!(
        "inserted={} duplicates={} invalid={}",
        report.inserted,
        report.duplicates.len(),
        report.invalid.len()
      )),
    )
    .await?;
    txn.commit().await?;

    Ok(report)
  }

  /// Releases an ASSIGNED serial back to the pool. The user keeps their
  /// account.
  pub async fn unlink(&self, actor: &Actor, id: i32) -> Result<serial::Model> {
    let txn = self.db.begin().await?;

    let serial = serial::Entity::find_by_id(id)
      .one(&txn)
      .await?
      .ok_or(Error::SerialNotFound)?;
    let Some(user_id) = serial.user_id else {
      return Err(Error::SerialNotAssigned);
    };

    let released = serial::Entity::update_many()
      .col_expr(serial::Column::Status, Expr::value(SerialStatus::Available))
      .col_expr(serial::Column::UserId, Expr::value(Option::<i32>::None))
      .col_expr(serial::Column::AssignedAt, Expr::value(Option::<DateTime>::None))
      .filter(serial::Column::Id.eq(id))
      .filter(serial::Column::Status.eq(SerialStatus::Assigned))
      .exec(&txn)
      .await?;

    if released.rows_affected == 0 {
      return Err(Error::SerialNotAssigned);
    }

    Audit::record(
      &txn,
      actor,
      "serial.unlink",
      Some(format!("serial:{id}")),
      Some(format!("{} from user:{user_id}", serial.code)),
    )
    .await?;

    let serial = serial::Entity::find_by_id(id)
      .one(&txn)
      .await?
      .ok_or(Error::SerialNotFound)?;
    txn.commit().await?;

    Ok(serial)
  }

  pub async fn set_blocked(
    &self,
    actor: &Actor,
    id: i32,
    blocked: bool,
  ) -> Result<serial::Model> {
    let (from, to) = if blocked {
      (SerialStatus::Available, SerialStatus::Blocked)
    } else {
      (SerialStatus::Blocked, SerialStatus::Available)
    };

    let txn = self.db.begin().await?;

    let changed = serial::Entity::update_many()
      .col_expr(serial::Column::Status, Expr::value(to))
      .filter(serial::Column::Id.eq(id))
      .filter(serial::Column::Status.eq(from))
      .exec(&txn)
      .await?;

    let serial = serial::Entity::find_by_id(id)
      .one(&txn)
      .await?
      .ok_or(Error::SerialNotFound)?;

    if changed.rows_affected == 0 {
      return Err(match serial.status {
        SerialStatus::Assigned => Error::SerialInUse,
        SerialStatus::Blocked => Error::invalid("Serial number is already blocked"),
        SerialStatus::Available => Error::invalid("Serial number is not blocked"),
      });
    }

    let action = if blocked { "serial.block" } else { "serial.unblock" };
    Audit::record(&txn, actor, action, Some(format!("serial:{id}")), None).await?;
    txn.commit().await?;

    Ok(serial)
  }

  /// Deletes a serial that is not bound to anyone.
  pub async fn delete(&self, actor: &Actor, id: i32) -> Result<()> {
    let txn = self.db.begin().await?;

    let deleted = serial::Entity::delete_many()
      .filter(serial::Column::Id.eq(id))
      .filter(serial::Column::Status.ne(SerialStatus::Assigned))
      .exec(&txn)
      .await?;

    if deleted.rows_affected == 0 {
      let exists = serial::Entity::find_by_id(id).one(&txn).await?.is_some();
      return Err(if exists { Error::SerialInUse } else { Error::SerialNotFound });
    }

    Audit::record(&txn, actor, "serial.delete", Some(format!("serial:{id}")), None)
      .await?;
    txn.commit().await?;

    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    entity::{Role, user},
    sv::testing::*,
  };

  fn admin() -> Actor {
    actor(1000, Role::Admin)
  }

  async fn by_code(db: &DatabaseConnection, code: &str) -> serial::Model {
    serial::Entity::find()
      .filter(serial::Column::Code.eq(code))
      .one(db)
      .await
      .unwrap()
      .unwrap()
  }

  #[tokio::test]
  async fn test_bulk_import_reports_duplicates_and_invalid() {
    let db = setup_test_db().await;
    seed_serials(&db, &["EXIST-0001"]).await;
    let sv = Serial::new(&db);

    let report = sv
      .bulk_import(
        &admin(),
        vec![
          "new-0001".into(),
          "NEW-0001".into(),
          "exist-0001".into(),
          "bad code!".into(),
          "NEW-0002".into(),
        ],
      )
      .await
      .unwrap();

    assert_eq!(report.inserted, 2);
    assert_eq!(report.duplicates, ["NEW-0001", "EXIST-0001"]);
    assert_eq!(report.invalid, ["bad code!"]);

    let available = sv.list(Some(SerialStatus::Available)).await.unwrap();
    assert_eq!(available.len(), 3);
    assert_eq!(audit_actions(&db).await, ["serial.import"]);
  }

  #[tokio::test]
  async fn test_unlink_keeps_user() {
    let db = setup_test_db().await;
    let user = seed_user(&db, "a@example.com", Role::User).await;
    let sv = Serial::new(&db);
    let serial = sv.by_user(user.id).await.unwrap().unwrap();

    let released = sv.unlink(&admin(), serial.id).await.unwrap();
    assert_eq!(released.status, SerialStatus::Available);
    assert_eq!(released.user_id, None);
    assert_eq!(released.assigned_at, None);
    assert!(user::Entity::find_by_id(user.id).one(&db).await.unwrap().is_some());

    assert!(matches!(
      sv.unlink(&admin(), serial.id).await,
      Err(Error::SerialNotAssigned)
    ));
    assert!(matches!(sv.unlink(&admin(), 999).await, Err(Error::SerialNotFound)));
  }

  #[tokio::test]
  async fn test_delete_refuses_assigned() {
    let db = setup_test_db().await;
    let user = seed_user(&db, "a@example.com", Role::User).await;
    let sv = Serial::new(&db);
    let serial = sv.by_user(user.id).await.unwrap().unwrap();

    assert!(matches!(sv.delete(&admin(), serial.id).await, Err(Error::SerialInUse)));
    assert!(serial::Entity::find_by_id(serial.id).one(&db).await.unwrap().is_some());

    sv.unlink(&admin(), serial.id).await.unwrap();
    sv.delete(&admin(), serial.id).await.unwrap();
    assert!(serial::Entity::find_by_id(serial.id).one(&db).await.unwrap().is_none());
    assert!(matches!(sv.delete(&admin(), serial.id).await, Err(Error::SerialNotFound)));

    assert_eq!(audit_actions(&db).await, ["serial.unlink", "serial.delete"]);
  }

  #[tokio::test]
  async fn test_block_transitions() {
    let db = setup_test_db().await;
    seed_serials(&db, &["FREE-0001"]).await;
    let user = seed_user(&db, "a@example.com", Role::User).await;
    let sv = Serial::new(&db);
    let free = by_code(&db, "FREE-0001").await;
    let taken = sv.by_user(user.id).await.unwrap().unwrap();

    let blocked = sv.set_blocked(&admin(), free.id, true).await.unwrap();
    assert_eq!(blocked.status, SerialStatus::Blocked);
    assert!(matches!(
      sv.set_blocked(&admin(), free.id, true).await,
      Err(Error::InvalidArgs(_))
    ));
    assert!(matches!(
      sv.set_blocked(&admin(), taken.id, true).await,
      Err(Error::SerialInUse)
    ));

    let unblocked = sv.set_blocked(&admin(), free.id, false).await.unwrap();
    assert_eq!(unblocked.status, SerialStatus::Available);
  }

  #[tokio::test]
  async fn test_assigned_iff_user_present() {
    let db = setup_test_db().await;
    seed_serials(&db, &["FREE-0001", "FREE-0002"]).await;
    let user = seed_user(&db, "a@example.com", Role::User).await;
    let sv = Serial::new(&db);
    let free = by_code(&db, "FREE-0002").await;
    sv.set_blocked(&admin(), free.id, true).await.unwrap();
    let taken = sv.by_user(user.id).await.unwrap().unwrap();
    sv.unlink(&admin(), taken.id).await.unwrap();

    for serial in sv.list(None).await.unwrap() {
      assert_eq!(
        serial.status == SerialStatus::Assigned,
        serial.user_id.is_some(),
        "{serial:?}"
      );
    }
  }
}
