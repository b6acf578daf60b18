use sea_orm::sea_query::OnConflict;
use serde::{Deserialize, Serialize};

use super::{Actor, Audit};
use crate::{entity::setting, prelude::*};

const SITE_NAME: &str = "site_name";
const REGISTRATION_OPEN: &str = "registration_open";
const MAINTENANCE_MODE: &str = "maintenance_mode";
const MAX_OPEN_TICKETS: &str = "max_open_tickets";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemSettings {
  pub site_name: String,
  pub registration_open: bool,
  pub maintenance_mode: bool,
  /// Unsettled tickets a user may hold at once, 0 for no limit.
  pub max_open_tickets: u32,
}

impl Default for SystemSettings {
  fn default() -> Self {
    Self {
      site_name: String::from("PC MASTER BD"),
      registration_open: true,
      maintenance_mode: false,
      max_open_tickets: 5,
    }
  }
}

impl SystemSettings {
  fn apply(&mut self, key: &str, value: &str) {
    let parsed = match key {
      SITE_NAME => {
        self.site_name = value.to_string();
        true
      }
      REGISTRATION_OPEN => {
        value.parse::<bool>().map(|v| self.registration_open = v).is_ok()
      }
      MAINTENANCE_MODE => {
        value.parse::<bool>().map(|v| self.maintenance_mode = v).is_ok()
      }
      MAX_OPEN_TICKETS => {
        value.parse::<u32>().map(|v| self.max_open_tickets = v).is_ok()
      }
      _ => true,
    };

    if !parsed {
      warn!("Ignoring malformed setting `{key}` = `{value}`");
    }
  }

  fn entries(&self) -> [(&'static str, String); 4] {
    [
      (SITE_NAME, self.site_name.clone()),
      (REGISTRATION_OPEN, self.registration_open.to_string()),
      (MAINTENANCE_MODE, self.maintenance_mode.to_string()),
      (MAX_OPEN_TICKETS, self.max_open_tickets.to_string()),
    ]
  }
}

pub struct Settings<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> Settings<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  pub async fn get(&self) -> Result<SystemSettings> {
    let mut settings = SystemSettings::default();
    for row in setting::Entity::find().all(self.db).await? {
      settings.apply(&row.key, &row.value);
    }
    Ok(settings)
  }

  pub async fn update(
    &self,
    actor: &Actor,
    settings: SystemSettings,
  ) -> Result<SystemSettings> {
    let site_name = utils::required("Site name", &settings.site_name)?;
    let settings = SystemSettings { site_name, ..settings };

    let now = utils::now();
    let txn = self.db.begin().await?;

    for (key, value) in settings.entries() {
      setting::Entity::insert(setting::ActiveModel {
        key: Set(key.to_string()),
        value: Set(value),
        updated_at: Set(now),
      })
      .on_conflict(
        OnConflict::column(setting::Column::Key)
          .update_columns([setting::Column::Value, setting::Column::UpdatedAt])
          .to_owned(),
      )
      .exec(&txn)
      .await?;
    }

    let details = json::to_string(&settings).ok();
    Audit::record(&txn, actor, "settings.update", None, details).await?;
    txn.commit().await?;

    Ok(settings)
  }
}
