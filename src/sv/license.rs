use sea_orm::sea_query::Expr;
use serde::Deserialize;
use uuid::Uuid;

use super::{Actor, Audit};
use crate::{
  entity::{LicenseStatus, license_key, user},
  error::is_unique_violation,
  prelude::*,
};

#[derive(Debug, Deserialize)]
pub struct NewLicense {
  pub software_name: String,
  /// Generated when omitted.
  pub key: Option<String>,
}

pub struct LicenseKey<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> LicenseKey<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  pub async fn create(
    &self,
    actor: &Actor,
    new: NewLicense,
  ) -> Result<license_key::Model> {
    let software_name = utils::required("Software name", &new.software_name)?;
    let key = match utils::optional(new.key) {
      Some(key) => key,
      None => Uuid::new_v4().to_string().to_uppercase(),
    };

    let txn = self.db.begin().await?;

    let license = license_key::ActiveModel {
      id: NotSet,
      software_name: Set(software_name),
      key: Set(key),
      status: Set(LicenseStatus::Available),
      assigned_to: Set(None),
      assigned_at: Set(None),
      created_at: Set(utils::now()),
    }
    .insert(&txn)
    .await
    .map_err(|err| {
      if is_unique_violation(&err) { Error::LicenseKeyTaken } else { err.into() }
    })?;

    Audit::record(
      &txn,
      actor,
      "license.create",
      Some(format!("license:{}", license.id)),
      Some(license.software_name.clone()),
    )
    .await?;
    txn.commit().await?;

    Ok(license)
  }

  pub async fn by_user(&self, user_id: i32) -> Result<Vec<license_key::Model>> {
    let licenses = license_key::Entity::find()
      .filter(license_key::Column::AssignedTo.eq(user_id))
      .order_by_asc(license_key::Column::SoftwareName)
      .all(self.db)
      .await?;
    Ok(licenses)
  }

  pub async fn list(
    &self,
    status: Option<LicenseStatus>,
  ) -> Result<Vec<license_key::Model>> {
    let mut query =
      license_key::Entity::find().order_by_asc(license_key::Column::Id);
    if let Some(status) = status {
      query = query.filter(license_key::Column::Status.eq(status));
    }
    Ok(query.all(self.db).await?)
  }

  /// Binds an AVAILABLE key to `user_id`. Reassignment goes through
  /// [`Self::unassign`] first.
  pub async fn assign(
    &self,
    actor: &Actor,
    id: i32,
    user_id: i32,
  ) -> Result<license_key::Model> {
    let txn = self.db.begin().await?;

    if user::Entity::find_by_id(user_id).one(&txn).await?.is_none() {
      return Err(Error::UserNotFound);
    }

    let assigned = license_key::Entity::update_many()
      .col_expr(license_key::Column::Status, Expr::value(LicenseStatus::Assigned))
      .col_expr(license_key::Column::AssignedTo, Expr::value(Some(user_id)))
      .col_expr(license_key::Column::AssignedAt, Expr::value(Some(utils::now())))
      .filter(license_key::Column::Id.eq(id))
      .filter(license_key::Column::Status.eq(LicenseStatus::Available))
      .exec(&txn)
      .await?;

    let license = license_key::Entity::find_by_id(id)
      .one(&txn)
      .await?
      .ok_or(Error::LicenseNotFound)?;

    if assigned.rows_affected == 0 {
      return Err(Error::LicenseAlreadyAssigned);
    }

    Audit::record(
      &txn,
      actor,
      "license.assign",
      Some(format!("license:{id}")),
      Some(format!("user:{user_id}")),
    )
    .await?;
    txn.commit().await?;

    Ok(license)
  }

  pub async fn unassign(
    &self,
    actor: &Actor,
    id: i32,
  ) -> Result<license_key::Model> {
    let txn = self.db.begin().await?;

    let previous = license_key::Entity::find_by_id(id)
      .one(&txn)
      .await?
      .ok_or(Error::LicenseNotFound)?
      .assigned_to;

    let released = license_key::Entity::update_many()
      .col_expr(license_key::Column::Status, Expr::value(LicenseStatus::Available))
      .col_expr(license_key::Column::AssignedTo, Expr::value(Option::<i32>::None))
      .col_expr(
        license_key::Column::AssignedAt,
        Expr::value(Option::<DateTime>::None),
      )
      .filter(license_key::Column::Id.eq(id))
      .filter(license_key::Column::Status.eq(LicenseStatus::Assigned))
      .exec(&txn)
      .await?;

    if released.rows_affected == 0 {
      return Err(Error::LicenseNotAssigned);
    }

    Audit::record(
      &txn,
      actor,
      "license.unassign",
      Some(format!("license:{id}")),
      previous.map(|user_id| format!("user:{user_id}")),
    )
    .await?;

    let license = license_key::Entity::find_by_id(id)
      .one(&txn)
      .await?
      .ok_or(Error::LicenseNotFound)?;
    txn.commit().await?;

    Ok(license)
  }

  pub async fn delete(&self, actor: &Actor, id: i32) -> Result<()> {
    let txn = self.db.begin().await?;

    let deleted = license_key::Entity::delete_many()
      .filter(license_key::Column::Id.eq(id))
      .filter(license_key::Column::Status.eq(LicenseStatus::Available))
      .exec(&txn)
      .await?;

    if deleted.rows_affected == 0 {
      let exists = license_key::Entity::find_by_id(id).one(&txn).await?.is_some();
      return Err(if exists {
        Error::LicenseAlreadyAssigned
      } else {
        Error::LicenseNotFound
      });
    }

    Audit::record(&txn, actor, "license.delete", Some(format!("license:{id}")), None)
      .await?;
    txn.commit().await?;

    Ok(())
  }
}
