use serde::{Deserialize, Serialize};

use super::{Actor, Audit};
use crate::{
  entity::{AccountType, PremiumStatus, premium},
  prelude::*,
};

#[derive(Debug, Deserialize)]
pub struct PremiumInput {
  pub service_name: String,
  pub account_type: AccountType,
  pub status: Option<PremiumStatus>,
  pub credentials: String,
}

/// What users may see of the inventory when choosing what to request.
#[derive(Debug, PartialEq, Serialize)]
pub struct CatalogEntry {
  pub service_name: String,
  pub account_type: AccountType,
}

pub struct Premium<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> Premium<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  pub async fn list(&self) -> Result<Vec<premium::Model>> {
    let accounts = premium::Entity::find()
      .order_by_asc(premium::Column::ServiceName)
      .order_by_asc(premium::Column::Id)
      .all(self.db)
      .await?;
    Ok(accounts)
  }

  pub async fn catalog(&self) -> Result<Vec<CatalogEntry>> {
    let mut entries: Vec<CatalogEntry> = premium::Entity::find()
      .filter(premium::Column::Status.eq(PremiumStatus::Active))
      .order_by_asc(premium::Column::ServiceName)
      .order_by_asc(premium::Column::AccountType)
      .all(self.db)
      .await?
      .into_iter()
      .map(|account| CatalogEntry {
        service_name: account.service_name,
        account_type: account.account_type,
      })
      .collect();

    entries.dedup();
    Ok(entries)
  }

  pub async fn create(
    &self,
    actor: &Actor,
    input: PremiumInput,
  ) -> Result<premium::Model> {
    let txn = self.db.begin().await?;

    let account = premium::ActiveModel {
      id: NotSet,
      service_name: Set(utils::required("Service name", &input.service_name)?),
      account_type: Set(input.account_type),
      status: Set(input.status.unwrap_or(PremiumStatus::Active)),
      credentials: Set(utils::required("Credentials", &input.credentials)?),
      created_at: Set(utils::now()),
    }
    .insert(&txn)
    .await?;

    Audit::record(
      &txn,
      actor,
      "premium.create",
      Some(format!("premium:{}", account.id)),
      Some(account.service_name.clone()),
    )
    .await?;
    txn.commit().await?;

    Ok(account)
  }

  pub async fn update(
    &self,
    actor: &Actor,
    id: i32,
    input: PremiumInput,
  ) -> Result<premium::Model> {
    let txn = self.db.begin().await?;

    let account = premium::Entity::find_by_id(id)
      .one(&txn)
      .await?
      .ok_or(Error::PremiumNotFound)?;
    let status = input.status.unwrap_or(account.status);

    let account = premium::ActiveModel {
      service_name: Set(utils::required("Service name", &input.service_name)?),
      account_type: Set(input.account_type),
      status: Set(status),
      credentials: Set(utils::required("Credentials", &input.credentials)?),
      ..account.into()
    }
    .update(&txn)
    .await?;

    Audit::record(&txn, actor, "premium.update", Some(format!("premium:{id}")), None)
      .await?;
    txn.commit().await?;

    Ok(account)
  }

  pub async fn delete(&self, actor: &Actor, id: i32) -> Result<()> {
    let txn = self.db.begin().await?;

    let deleted = premium::Entity::delete_by_id(id).exec(&txn).await?;
    if deleted.rows_affected == 0 {
      return Err(Error::PremiumNotFound);
    }

    Audit::record(&txn, actor, "premium.delete", Some(format!("premium:{id}")), None)
      .await?;
    txn.commit().await?;

    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{entity::Role, sv::testing::*};

  fn input(name: &str, ty: AccountType, status: PremiumStatus) -> PremiumInput {
    PremiumInput {
      service_name: name.into(),
      account_type: ty,
      status: Some(status),
      credentials: "login:secret".into(),
    }
  }

  #[tokio::test]
  async fn test_catalog_hides_credentials_and_inactive() {
    let db = setup_test_db().await;
    let admin = actor(1000, Role::Admin);
    let sv = Premium::new(&db);

    for (name, ty, status) in [
      ("Netflix", AccountType::Shared, PremiumStatus::Active),
      ("Netflix", AccountType::Shared, PremiumStatus::Active),
      ("Canva", AccountType::Private, PremiumStatus::Active),
      ("Hulu", AccountType::Shared, PremiumStatus::Inactive),
    ] {
      sv.create(&admin, input(name, ty, status)).await.unwrap();
    }

    let catalog = sv.catalog().await.unwrap();
    assert_eq!(
      catalog,
      [
        CatalogEntry { service_name: "Canva".into(), account_type: AccountType::Private },
        CatalogEntry { service_name: "Netflix".into(), account_type: AccountType::Shared },
      ]
    );
    assert_eq!(sv.list().await.unwrap().len(), 4);
  }

  #[tokio::test]
  async fn test_catalog_collapses_interleaved_types() {
    let db = setup_test_db().await;
    let admin = actor(1000, Role::Admin);
    let sv = Premium::new(&db);

    for ty in [AccountType::Shared, AccountType::Private, AccountType::Shared] {
      sv.create(&admin, input("Netflix", ty, PremiumStatus::Active)).await.unwrap();
    }

    let catalog = sv.catalog().await.unwrap();
    assert_eq!(
      catalog,
      [
        CatalogEntry { service_name: "Netflix".into(), account_type: AccountType::Private },
        CatalogEntry { service_name: "Netflix".into(), account_type: AccountType::Shared },
      ]
    );
  }

  #[tokio::test]
  async fn test_update_and_delete() {
    let db = setup_test_db().await;
    let admin = actor(1000, Role::Admin);
    let sv = Premium::new(&db);

    let account = sv
      .create(&admin, input("Netflix", AccountType::Shared, PremiumStatus::Active))
      .await
      .unwrap();

    let updated = sv
      .update(
        &admin,
        account.id,
        PremiumInput { status: None, ..input("Netflix 4K", AccountType::Private, PremiumStatus::Active) },
      )
      .await
      .unwrap();
    assert_eq!(updated.service_name, "Netflix 4K");
    assert_eq!(updated.account_type, AccountType::Private);

    sv.delete(&admin, account.id).await.unwrap();
    assert!(matches!(sv.delete(&admin, account.id).await, Err(Error::PremiumNotFound)));
    assert_eq!(
      audit_actions(&db).await,
      ["premium.create", "premium.update", "premium.delete"]
    );
  }
}
