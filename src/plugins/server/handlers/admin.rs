use std::sync::Arc;

use axum::{Extension, extract::State};
use serde::Deserialize;

use super::{Api, Json, Path, Query, ok};
use crate::{
  auth::Principal,
  entity::{
    LicenseStatus, RequestStatus, Role, SerialStatus, TicketPriority,
    TicketStatus, announcement, audit_log, license_key, premium, request,
    serial, ticket, user,
  },
  state::AppState,
  sv::{
    announcement::AnnouncementInput,
    audit::AuditQuery,
    content::{ContentInput, ContentItem, ContentKind},
    license::NewLicense,
    premium::PremiumInput,
    request::Decision,
    serial::ImportReport,
    settings::SystemSettings,
    stats::Dashboard,
    user::{UserFilter, UserSummary},
  },
};

#[derive(Debug, Deserialize)]
pub struct StatusQuery<S> {
  pub status: Option<S>,
}

#[derive(Debug, Deserialize)]
pub struct ContentQuery {
  #[serde(rename = "type")]
  pub kind: Option<ContentKind>,
}

#[derive(Debug, Deserialize)]
pub struct SetActive {
  pub active: bool,
}

#[derive(Debug, Deserialize)]
pub struct SetRole {
  pub role: Role,
}

#[derive(Debug, Deserialize)]
pub struct Import {
  pub codes: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct SetBlocked {
  pub blocked: bool,
}

#[derive(Debug, Deserialize)]
pub struct Assign {
  pub user_id: i32,
}

#[derive(Debug, Deserialize)]
pub struct SetStatus {
  pub status: TicketStatus,
}

#[derive(Debug, Deserialize)]
pub struct SetPriority {
  pub priority: TicketPriority,
}

pub async fn stats(State(app): State<Arc<AppState>>) -> Api<Dashboard> {
  ok(app.sv().stats.dashboard().await)
}

// users

pub async fn users(
  State(app): State<Arc<AppState>>,
  Query(filter): Query<UserFilter>,
) -> Api<Vec<UserSummary>> {
  ok(app.sv().user.all(&filter).await?)
}

pub async fn set_active(
  State(app): State<Arc<AppState>>,
  Extension(me): Extension<Principal>,
  Path(id): Path<i32>,
  Json(body): Json<SetActive>,
) -> Api<user::Model> {
  let user = app.sv().user.set_active(&me.actor(), id, body.active).await?;
  if !user.is_active {
    app.drop_user_sessions(user.id);
  }
  ok(user)
}

pub async fn set_role(
  State(app): State<Arc<AppState>>,
  Extension(me): Extension<Principal>,
  Path(id): Path<i32>,
  Json(body): Json<SetRole>,
) -> Api<user::Model> {
  ok(app.sv().user.set_role(&me.actor(), id, body.role).await?)
}

// serials

pub async fn serials(
  State(app): State<Arc<AppState>>,
  Query(query): Query<StatusQuery<SerialStatus>>,
) -> Api<Vec<serial::Model>> {
  ok(app.sv().serial.list(query.status).await?)
}

pub async fn import_serials(
  State(app): State<Arc<AppState>>,
  Extension(me): Extension<Principal>,
  Json(body): Json<Import>,
) -> Api<ImportReport> {
  ok(app.sv().serial.bulk_import(&me.actor(), body.codes).await?)
}

pub async fn unlink_serial(
  State(app): State<Arc<AppState>>,
  Extension(me): Extension<Principal>,
  Path(id): Path<i32>,
) -> Api<serial::Model> {
  ok(app.sv().serial.unlink(&me.actor(), id).await?)
}

pub async fn block_serial(
  State(app): State<Arc<AppState>>,
  Extension(me): Extension<Principal>,
  Path(id): Path<i32>,
  Json(body): Json<SetBlocked>,
) -> Api<serial::Model> {
  ok(app.sv().serial.set_blocked(&me.actor(), id, body.blocked).await?)
}

pub async fn delete_serial(
  State(app): State<Arc<AppState>>,
  Extension(me): Extension<Principal>,
  Path(id): Path<i32>,
) -> Api<()> {
  ok(app.sv().serial.delete(&me.actor(), id).await?)
}

// requests

pub async fn requests(
  State(app): State<Arc<AppState>>,
  Query(query): Query<StatusQuery<RequestStatus>>,
) -> Api<Vec<request::Model>> {
  ok(app.sv().request.list(query.status).await?)
}

pub async fn decide(
  State(app): State<Arc<AppState>>,
  Extension(me): Extension<Principal>,
  Path(id): Path<i32>,
  Json(decision): Json<Decision>,
) -> Api<request::Model> {
  ok(app.sv().request.decide(&me.actor(), id, decision).await?)
}

// premium

pub async fn premium(State(app): State<Arc<AppState>>) -> Api<Vec<premium::Model>> {
  ok(app.sv().premium.list().await?)
}

pub async fn create_premium(
  State(app): State<Arc<AppState>>,
  Extension(me): Extension<Principal>,
  Json(input): Json<PremiumInput>,
) -> Api<premium::Model> {
  ok(app.sv().premium.create(&me.actor(), input).await?)
}

pub async fn update_premium(
  State(app): State<Arc<AppState>>,
  Extension(me): Extension<Principal>,
  Path(id): Path<i32>,
  Json(input): Json<PremiumInput>,
) -> Api<premium::Model> {
  ok(app.sv().premium.update(&me.actor(), id, input).await?)
}

pub async fn delete_premium(
  State(app): State<Arc<AppState>>,
  Extension(me): Extension<Principal>,
  Path(id): Path<i32>,
) -> Api<()> {
  ok(app.sv().premium.delete(&me.actor(), id).await?)
}

// licenses

pub async fn licenses(
  State(app): State<Arc<AppState>>,
  Query(query): Query<StatusQuery<LicenseStatus>>,
) -> Api<Vec<license_key::Model>> {
  ok(app.sv().license.list(query.status).await?)
}

pub async fn create_license(
  State(app): State<Arc<AppState>>,
  Extension(me): Extension<Principal>,
  Json(new): Json<NewLicense>,
) -> Api<license_key::Model> {
  ok(app.sv().license.create(&me.actor(), new).await?)
}

pub async fn assign_license(
  State(app): State<Arc<AppState>>,
  Extension(me): Extension<Principal>,
  Path(id): Path<i32>,
  Json(body): Json<Assign>,
) -> Api<license_key::Model> {
  ok(app.sv().license.assign(&me.actor(), id, body.user_id).await?)
}

pub async fn unassign_license(
  State(app): State<Arc<AppState>>,
  Extension(me): Extension<Principal>,
  Path(id): Path<i32>,
) -> Api<license_key::Model> {
  ok(app.sv().license.unassign(&me.actor(), id).await?)
}

pub async fn delete_license(
  State(app): State<Arc<AppState>>,
  Extension(me): Extension<Principal>,
  Path(id): Path<i32>,
) -> Api<()> {
  ok(app.sv().license.delete(&me.actor(), id).await?)
}

// tickets

pub async fn tickets(
  State(app): State<Arc<AppState>>,
  Query(query): Query<StatusQuery<TicketStatus>>,
) -> Api<Vec<ticket::Model>> {
  ok(app.sv().ticket.list(query.status).await?)
}

pub async fn ticket_status(
  State(app): State<Arc<AppState>>,
  Extension(me): Extension<Principal>,
  Path(id): Path<i32>,
  Json(body): Json<SetStatus>,
) -> Api<ticket::Model> {
  ok(app.sv().ticket.set_status(&me.actor(), id, body.status).await?)
}

pub async fn ticket_priority(
  State(app): State<Arc<AppState>>,
  Extension(me): Extension<Principal>,
  Path(id): Path<i32>,
  Json(body): Json<SetPriority>,
) -> Api<ticket::Model> {
  ok(app.sv().ticket.set_priority(&me.actor(), id, body.priority).await?)
}

// content

pub async fn content(
  State(app): State<Arc<AppState>>,
  Query(query): Query<ContentQuery>,
) -> Api<Vec<ContentItem>> {
  ok(app.sv().content.list(query.kind).await?)
}

pub async fn save_content(
  State(app): State<Arc<AppState>>,
  Extension(me): Extension<Principal>,
  Json(input): Json<ContentInput>,
) -> Api<ContentItem> {
  ok(app.sv().content.save(&me.actor(), input).await?)
}

pub async fn delete_content(
  State(app): State<Arc<AppState>>,
  Extension(me): Extension<Principal>,
  Path((kind, id)): Path<(ContentKind, i32)>,
) -> Api<()> {
  ok(app.sv().content.delete(&me.actor(), kind, id).await?)
}

// announcements

pub async fn announcements(
  State(app): State<Arc<AppState>>,
) -> Api<Vec<announcement::Model>> {
  ok(app.sv().announcement.all().await?)
}

pub async fn create_announcement(
  State(app): State<Arc<AppState>>,
  Extension(me): Extension<Principal>,
  Json(input): Json<AnnouncementInput>,
) -> Api<announcement::Model> {
  ok(app.sv().announcement.create(&me.actor(), input).await?)
}

pub async fn update_announcement(
  State(app): State<Arc<AppState>>,
  Extension(me): Extension<Principal>,
  Path(id): Path<i32>,
  Json(input): Json<AnnouncementInput>,
) -> Api<announcement::Model> {
  ok(app.sv().announcement.update(&me.actor(), id, input).await?)
}

pub async fn delete_announcement(
  State(app): State<Arc<AppState>>,
  Extension(me): Extension<Principal>,
  Path(id): Path<i32>,
) -> Api<()> {
  ok(app.sv().announcement.delete(&me.actor(), id).await?)
}

// audit and settings

pub async fn audit(
  State(app): State<Arc<AppState>>,
  Query(query): Query<AuditQuery>,
) -> Api<Vec<audit_log::Model>> {
  ok(app.sv().audit.list(&query).await?)
}

pub async fn settings(State(app): State<Arc<AppState>>) -> Api<SystemSettings> {
  ok(app.sv().settings.get().await?)
}

pub async fn update_settings(
  State(app): State<Arc<AppState>>,
  Extension(me): Extension<Principal>,
  Json(settings): Json<SystemSettings>,
) -> Api<SystemSettings> {
  ok(app.sv().settings.update(&me.actor(), settings).await?)
}
