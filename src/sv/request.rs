use sea_orm::sea_query::Expr;
use serde::Deserialize;

use super::{Actor, Audit};
use crate::{
  entity::{RequestStatus, request},
  error::is_unique_violation,
  prelude::*,
};

#[derive(Debug, Deserialize)]
pub struct Decision {
  pub outcome: RequestStatus,
  pub admin_notes: Option<String>,
}

pub struct Request<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> Request<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  /// Opens a PENDING request unless one for the same resource is already
  /// waiting. The partial unique index on pending rows settles races.
  pub async fn create(
    &self,
    user_id: i32,
    resource_name: &str,
  ) -> Result<request::Model> {
    let resource_name = utils::required("Resource name", resource_name)?;
    let txn = self.db.begin().await?;

    let pending = request::Entity::find()
      .filter(request::Column::UserId.eq(user_id))
      .filter(request::Column::ResourceName.eq(resource_name.as_str()))
      .filter(request::Column::Status.eq(RequestStatus::Pending))
      .count(&txn)
      .await?;
    if pending > 0 {
      return Err(Error::DuplicatePendingRequest);
    }

    let request = request::ActiveModel {
      id: NotSet,
      user_id: Set(user_id),
      resource_name: Set(resource_name),
      status: Set(RequestStatus::Pending),
      admin_notes: Set(None),
      decided_by: Set(None),
      decided_at: Set(None),
      created_at: Set(utils::now()),
    }
    .insert(&txn)
    .await
    .map_err(|err| {
      if is_unique_violation(&err) {
        Error::DuplicatePendingRequest
      } else {
        err.into()
      }
    })?;

    txn.commit().await?;
    Ok(request)
  }

  /// Moves a PENDING request to its terminal state.
  pub async fn decide(
    &self,
    actor: &Actor,
    id: i32,
    decision: Decision,
  ) -> Result<request::Model> {
    if decision.outcome == RequestStatus::Pending {
      return Err(Error::invalid("Outcome must be APPROVED or REJECTED"));
    }
    let notes = utils::optional(decision.admin_notes);

    let txn = self.db.begin().await?;

    let decided = request::Entity::update_many()
      .col_expr(request::Column::Status, Expr::value(decision.outcome))
      .col_expr(request::Column::AdminNotes, Expr::value(notes))
      .col_expr(request::Column::DecidedBy, Expr::value(Some(actor.id)))
      .col_expr(request::Column::DecidedAt, Expr::value(Some(utils::now())))
      .filter(request::Column::Id.eq(id))
      .filter(request::Column::Status.eq(RequestStatus::Pending))
      .exec(&txn)
      .await?;

    let request = request::Entity::find_by_id(id)
      .one(&txn)
      .await?
      .ok_or(Error::RequestNotFound)?;

    if decided.rows_affected == 0 {
      return Err(Error::AlreadyDecided);
    }

    Audit::record(
      &txn,
      actor,
      "request.decide",
      Some(format!("request:{id}")),
      Some(format!("{:?} {}", request.status, request.resource_name)),
    )
    .await?;
    txn.commit().await?;

    Ok(request)
  }

  pub async fn by_user(&self, user_id: i32) -> Result<Vec<request::Model>> {
    let requests = request::Entity::find()
      .filter(request::Column::UserId.eq(user_id))
      .order_by_desc(request::Column::CreatedAt)
      .order_by_desc(request::Column::Id)
      .all(self.db)
      .await?;
    Ok(requests)
  }

  pub async fn list(
    &self,
    status: Option<RequestStatus>,
  ) -> Result<Vec<request::Model>> {
    let mut query = request::Entity::find()
      .order_by_desc(request::Column::CreatedAt)
      .order_by_desc(request::Column::Id);
    if let Some(status) = status {
      query = query.filter(request::Column::Status.eq(status));
    }
    Ok(query.all(self.db).await?)
  }
}
