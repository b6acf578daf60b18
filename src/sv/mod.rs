pub mod announcement;
pub mod audit;
pub mod content;
pub mod license;
pub mod premium;
pub mod request;
pub mod serial;
pub mod settings;
pub mod stats;
pub mod ticket;
pub mod user;

pub use announcement::Announcement;
pub use audit::Audit;
pub use content::Content;
pub use license::LicenseKey;
pub use premium::Premium;
pub use request::Request;
pub use serial::Serial;
pub use settings::Settings;
pub use stats::Stats;
pub use ticket::Ticket;
pub use user::User;

use crate::entity::Role;

/// Whoever performs an operation; admin mutations are audited under `id`.
#[derive(Debug, Clone)]
pub struct Actor {
  pub id: i32,
  pub role: Role,
  pub ip: Option<String>,
}

impl Actor {
  pub fn is_admin(&self) -> bool {
    self.role.is_admin()
  }
}

#[cfg(test)]
pub mod testing {
  use migration::{Migrator, MigratorTrait};

  use super::{Actor, User};
  use crate::{
    entity::{Role, SerialStatus, audit_log, serial, user},
    prelude::*,
    sv,
  };

  pub async fn setup_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    Migrator::up(&db, None).await.unwrap();
    db
  }

  pub fn actor(id: i32, role: Role) -> Actor {
    Actor { id, role, ip: Some("127.0.0.1".into()) }
  }

  pub async fn seed_serials(db: &DatabaseConnection, codes: &[&str]) {
    let now = utils::now();
    let models = codes.iter().map(|code| serial::ActiveModel {
      id: NotSet,
      code: Set(code.to_string()),
      status: Set(SerialStatus::Available),
      user_id: Set(None),
      assigned_at: Set(None),
      created_at: Set(now),
    });
    serial::Entity::insert_many(models).exec(db).await.unwrap();
  }

  /// Registers a user through a fresh serial and then forces `role`.
  pub async fn seed_user(
    db: &DatabaseConnection,
    email: &str,
    role: Role,
  ) -> user::Model {
    let code = format!("SEED-{}", email.replace(['@', '.'], "-").to_uppercase());
    seed_serials(db, &[&code]).await;

    let user = User::new(db)
      .register(sv::user::Registration {
        name: email.split('@').next().unwrap_or_default().to_string(),
        email: email.to_string(),
        password: "password123".into(),
        serial: code,
      })
      .await
      .unwrap();

    if role == Role::User {
      return user;
    }

    user::ActiveModel { role: Set(role), ..user.into() }
      .update(db)
      .await
      .unwrap()
  }

  pub async fn audit_actions(db: &DatabaseConnection) -> Vec<String> {
    audit_log::Entity::find()
      .order_by_asc(audit_log::Column::Id)
      .all(db)
      .await
      .unwrap()
      .into_iter()
      .map(|entry| entry.action)
      .collect()
  }
}
