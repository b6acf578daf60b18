use serde::{Deserialize, Serialize};

use super::{Actor, Audit};
use crate::{
  auth,
  entity::{Role, SerialStatus, serial, user},
  error::is_unique_violation,
  prelude::*,
  sv,
};

#[derive(Debug, Deserialize)]
pub struct Registration {
  pub name: String,
  pub email: String,
  pub password: String,
  pub serial: String,
}

#[derive(Debug, Serialize)]
pub struct UserSummary {
  #[serde(flatten)]
  pub user: user::Model,
  pub serial: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UserFilter {
  pub role: Option<Role>,
  pub active: Option<bool>,
}

pub struct User<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> User<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  /// Creates an account bound to an AVAILABLE serial number. The user row
  /// and the serial claim commit together or not at all.
  pub async fn register(&self, reg: Registration) -> Result<user::Model> {
    if !sv::Settings::new(self.db).get().await?.registration_open {
      return Err(Error::RegistrationClosed);
    }

    let name = utils::required("Name", &reg.name)?;
    let email = utils::normalize_email(&reg.email)?;
    let code = utils::normalize_serial(&reg.serial).ok_or(Error::SerialNotFound)?;
    let password_hash = auth::hash_password(&reg.password)?;

    let now = utils::now();
    let txn = self.db.begin().await?;

    let serial = serial::Entity::find()
      .filter(serial::Column::Code.eq(code.as_str()))
      .one(&txn)
      .await?
      .ok_or(Error::SerialNotFound)?;

    if serial.status != SerialStatus::Available {
      return Err(Error::SerialAlreadyAssigned);
    }

    let taken = user::Entity::find()
      .filter(user::Column::Email.eq(email.as_str()))
      .count(&txn)
      .await?;
    if taken > 0 {
      return Err(Error::EmailTaken);
    }

    let user = user::ActiveModel {
      id: NotSet,
      name: Set(name),
      email: Set(email),
      password_hash: Set(password_hash),
      role: Set(Role::User),
      is_active: Set(true),
      created_at: Set(now),
    }
    .insert(&txn)
    .await
    .map_err(|err| {
      if is_unique_violation(&err) { Error::EmailTaken } else { err.into() }
    })?;

    let claimed = serial::Entity::update_many()
      .set(serial::ActiveModel {
        status: Set(SerialStatus::Assigned),
        user_id: Set(Some(user.id)),
        assigned_at: Set(Some(now)),
        ..Default::default()
      })
      .filter(serial::Column::Id.eq(serial.id))
      .filter(serial::Column::Status.eq(SerialStatus::Available))
      .exec(&txn)
      .await?;

    if claimed.rows_affected == 0 {
      // lost the race, dropping `txn` discards the user row
      return Err(Error::SerialAlreadyAssigned);
    }

    txn.commit().await?;
    info!("Registered user {} with serial {}", user.id, code);

    Ok(user)
  }

  pub async fn login(&self, email: &str, password: &str) -> Result<user::Model> {
    let email =
      utils::normalize_email(email).map_err(|_| Error::InvalidCredentials)?;

    let user = user::Entity::find()
      .filter(user::Column::Email.eq(email))
      .one(self.db)
      .await?
      .ok_or(Error::InvalidCredentials)?;

    if !auth::verify_password(password, &user.password_hash) {
      return Err(Error::InvalidCredentials);
    }
    if !user.is_active {
      return Err(Error::AccountDisabled);
    }

    Ok(user)
  }

  /// Creates the bootstrap superadmin unless the email is already taken.
  pub async fn ensure_superadmin(&self, email: &str, password: &str) -> Result<()> {
    let email = utils::normalize_email(email)?;

    if let Some(existing) = user::Entity::find()
      .filter(user::Column::Email.eq(email.as_str()))
      .one(self.db)
      .await?
    {
      if existing.role != Role::SuperAdmin {
        warn!("Bootstrap email {email} belongs to a {:?} account", existing.role);
      }
      return Ok(());
    }

    user::ActiveModel {
      id: NotSet,
      name: Set(String::from("Superadmin")),
      email: Set(email.clone()),
      password_hash: Set(auth::hash_password(password)?),
      role: Set(Role::SuperAdmin),
      is_active: Set(true),
      created_at: Set(utils::now()),
    }
    .insert(self.db)
    .await?;

    info!("Bootstrapped superadmin {email}");
    Ok(())
  }

  pub async fn by_id(&self, id: i32) -> Result<Option<user::Model>> {
    Ok(user::Entity::find_by_id(id).one(self.db).await?)
  }

  pub async fn summary(&self, id: i32) -> Result<UserSummary> {
    let user = self.by_id(id).await?.ok_or(Error::UserNotFound)?;
    let serial = sv::Serial::new(self.db).by_user(id).await?;

    Ok(UserSummary { user, serial: serial.map(|s| s.code) })
  }

  pub async fn all(&self, filter: &UserFilter) -> Result<Vec<UserSummary>> {
    let mut query = user::Entity::find().order_by_asc(user::Column::Id);

    if let Some(role) = filter.role {
      query = query.filter(user::Column::Role.eq(role));
    }
    if let Some(active) = filter.active {
      query = query.filter(user::Column::IsActive.eq(active));
    }

    let rows = query.find_also_related(serial::Entity).all(self.db).await?;
    Ok(
      rows
        .into_iter()
        .map(|(user, serial)| UserSummary { user, serial: serial.map(|s| s.code) })
        .collect(),
    )
  }

  pub async fn set_active(
    &self,
    actor: &Actor,
    id: i32,
    active: bool,
  ) -> Result<user::Model> {
    if actor.id == id {
      return Err(Error::invalid("You cannot change your own account status"));
    }

    let txn = self.db.begin().await?;
    let user =
      user::Entity::find_by_id(id).one(&txn).await?.ok_or(Error::UserNotFound)?;

    if user.role.is_admin() && actor.role != Role::SuperAdmin {
      return Err(Error::Forbidden);
    }

    let user = user::ActiveModel { is_active: Set(active), ..user.into() }
      .update(&txn)
      .await?;

    let action = if active { "user.activate" } else { "user.deactivate" };
    Audit::record(&txn, actor, action, Some(format!("user:{id}")), None).await?;
    txn.commit().await?;

    Ok(user)
  }

  pub async fn set_role(
    &self,
    actor: &Actor,
    id: i32,
    role: Role,
  ) -> Result<user::Model> {
    if actor.role != Role::SuperAdmin {
      return Err(Error::Forbidden);
    }
    if actor.id == id {
      return Err(Error::invalid("You cannot change your own role"));
    }

    let txn = self.db.begin().await?;
    let user =
      user::Entity::find_by_id(id).one(&txn).await?.ok_or(Error::UserNotFound)?;
    let previous = user.role;

    let user =
      user::ActiveModel { role: Set(role), ..user.into() }.update(&txn).await?;

    Audit::record(
      &txn,
      actor,
      "user.role",
      Some(format!("user:{id}")),
      Some(format!("{previous:?} -> {role:?}")),
    )
    .await?;
    txn.commit().await?;

    Ok(user)
  }
}
