use sea_orm::sea_query::Expr;
use serde::Serialize;

use crate::{
  entity::{
    LicenseStatus, RequestStatus, SerialStatus, TicketStatus, license_key,
    request, serial, ticket, user,
  },
  prelude::*,
  retry::RetryPolicy,
};

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct SerialCounts {
  pub available: u64,
  pub assigned: u64,
  pub blocked: u64,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct LicenseCounts {
  pub available: u64,
  pub assigned: u64,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct TicketCounts {
  pub open: u64,
  pub in_progress: u64,
  pub resolved: u64,
  pub closed: u64,
}

/// Admin dashboard figures. `degraded` marks zeros served after the store
/// kept failing.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct Dashboard {
  pub users: u64,
  pub active_users: u64,
  pub serials: SerialCounts,
  pub pending_requests: u64,
  pub licenses: LicenseCounts,
  pub tickets: TicketCounts,
  pub degraded: bool,
}

fn count(n: i64) -> u64 {
  u64::try_from(n).unwrap_or_default()
}

pub struct Stats<'a> {
  db: &'a DatabaseConnection,
  retry: &'a RetryPolicy,
}

impl<'a> Stats<'a> {
  pub fn new(db: &'a DatabaseConnection, retry: &'a RetryPolicy) -> Self {
    Self { db, retry }
  }

  pub async fn dashboard(&self) -> Dashboard {
    match self.retry.run("dashboard stats", || Self::collect(self.db)).await {
      Ok(dashboard) => dashboard,
      Err(err) => {
        error!("Dashboard stats unavailable, serving zeros: {err}");
        Dashboard { degraded: true, ..Default::default() }
      }
    }
  }

  async fn collect(db: &DatabaseConnection) -> Result<Dashboard> {
    let (users, active_users, serials, pending_requests, licenses, tickets) =
      futures::try_join!(
        user::Entity::find().count(db),
        user::Entity::find().filter(user::Column::IsActive.eq(true)).count(db),
        Self::serials(db),
        request::Entity::find()
          .filter(request::Column::Status.eq(RequestStatus::Pending))
          .count(db),
        Self::licenses(db),
        Self::tickets(db),
      )?;

    Ok(Dashboard {
      users,
      active_users,
      serials,
      pending_requests,
      licenses,
      tickets,
      degraded: false,
    })
  }

  async fn serials(db: &DatabaseConnection) -> Result<SerialCounts, sea_orm::DbErr> {
    let rows: Vec<(SerialStatus, i64)> = serial::Entity::find()
      .select_only()
      .column(serial::Column::Status)
      .column_as(Expr::col(serial::Column::Id).count(), "count")
      .group_by(serial::Column::Status)
      .into_tuple()
      .all(db)
      .await?;

    let mut counts = SerialCounts::default();
    for (status, n) in rows {
      match status {
        SerialStatus::Available => counts.available = count(n),
        SerialStatus::Assigned => counts.assigned = count(n),
        SerialStatus::Blocked => counts.blocked = count(n),
      }
    }
    Ok(counts)
  }

  async fn licenses(db: &DatabaseConnection) -> Result<LicenseCounts, sea_orm::DbErr> {
    let rows: Vec<(LicenseStatus, i64)> = license_key::Entity::find()
      .select_only()
      .column(license_key::Column::Status)
      .column_as(Expr::col(license_key::Column::Id).count(), "count")
      .group_by(license_key::Column::Status)
      .into_tuple()
      .all(db)
      .await?;

    let mut counts = LicenseCounts::default();
    for (status, n) in rows {
      match status {
        LicenseStatus::Available => counts.available = count(n),
        LicenseStatus::Assigned => counts.assigned = count(n),
      }
    }
    Ok(counts)
  }

  async fn tickets(db: &DatabaseConnection) -> Result<TicketCounts, sea_orm::DbErr> {
    let rows: Vec<(TicketStatus, i64)> = ticket::Entity::find()
      .select_only()
      .column(ticket::Column::Status)
      .column_as(Expr::col(ticket::Column::Id).count(), "count")
      .group_by(ticket::Column::Status)
      .into_tuple()
      .all(db)
      .await?;

    let mut counts = TicketCounts::default();
    for (status, n) in rows {
      match status {
        TicketStatus::Open => counts.open = count(n),
        TicketStatus::InProgress => counts.in_progress = count(n),
        TicketStatus::Resolved => counts.resolved = count(n),
        TicketStatus::Closed => counts.closed = count(n),
      }
    }
    Ok(counts)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    entity::Role,
    sv::{self, testing::*},
  };

  fn fast() -> RetryPolicy {
    RetryPolicy {
      max_attempts: 2,
      base_delay: Duration::from_millis(1),
      max_delay: Duration::from_millis(2),
      timeout: Duration::from_millis(500),
    }
  }

  #[tokio::test]
  async fn test_dashboard_counts() {
    let db = setup_test_db().await;
    let retry = fast();
    let owner = seed_user(&db, "owner@example.com", Role::User).await;
    let admin = actor(1000, Role::Admin);
    seed_serials(&db, &["PCMBD-0001", "PCMBD-0002"]).await;

    let serials = sv::Serial::new(&db);
    let available = serials.list(Some(SerialStatus::Available)).await.unwrap();
    let spare = available.iter().find(|s| s.code == "PCMBD-0002").unwrap();
    serials.set_blocked(&admin, spare.id, true).await.unwrap();
    sv::Request::new(&db).create(owner.id, "Netflix").await.unwrap();
    let ticket = sv::ticket::NewTicket {
      subject: "Driver".into(),
      message: "Missing wifi driver".into(),
      priority: None,
    };
    sv::Ticket::new(&db).create(owner.id, ticket).await.unwrap();

    let dashboard = Stats::new(&db, &retry).dashboard().await;
    assert!(!dashboard.degraded);
    assert_eq!(dashboard.users, 1);
    assert_eq!(dashboard.active_users, 1);
    assert_eq!(
      dashboard.serials,
      SerialCounts { available: 1, assigned: 1, blocked: 1 }
    );
    assert_eq!(dashboard.pending_requests, 1);
    assert_eq!(dashboard.licenses, LicenseCounts::default());
    assert_eq!(dashboard.tickets.open, 1);
  }

  #[tokio::test]
  async fn test_failing_store_degrades() {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    let retry = fast();

    let dashboard = Stats::new(&db, &retry).dashboard().await;
    assert_eq!(dashboard, Dashboard { degraded: true, ..Default::default() });
  }
}
