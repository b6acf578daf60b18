//! Sign-up, sessions and the signed-in user's own resources.

use std::sync::Arc;

use axum::{Extension, extract::State, http::HeaderMap};
use serde::{Deserialize, Serialize};

use super::{Api, Json, Query, ok};
use crate::{
  auth::Principal,
  entity::{announcement, license_key, request, user},
  plugins::server::guard,
  state::AppState,
  sv::{
    content::{ContentItem, ContentKind},
    premium::CatalogEntry,
    user::{Registration, UserSummary},
  },
};

#[derive(Debug, Deserialize)]
pub struct Credentials {
  pub email: String,
  pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoggedIn {
  pub token: String,
  pub user: user::Model,
}

#[derive(Debug, Deserialize)]
pub struct ContentQuery {
  #[serde(rename = "type")]
  pub kind: Option<ContentKind>,
}

#[derive(Debug, Deserialize)]
pub struct NewRequest {
  pub resource_name: String,
}

pub async fn register(
  State(app): State<Arc<AppState>>,
  Json(reg): Json<Registration>,
) -> Api<user::Model> {
  ok(app.sv().user.register(reg).await?)
}

pub async fn login(
  State(app): State<Arc<AppState>>,
  Json(creds): Json<Credentials>,
) -> Api<LoggedIn> {
  let user = app.sv().user.login(&creds.email, &creds.password).await?;
  let token = app.open_session(user.id);
  ok(LoggedIn { token, user })
}

pub async fn logout(
  State(app): State<Arc<AppState>>,
  headers: HeaderMap,
) -> Api<bool> {
  let closed = guard::bearer(&headers).is_some_and(|token| app.close_session(token));
  ok(closed)
}

pub async fn me(
  State(app): State<Arc<AppState>>,
  Extension(me): Extension<Principal>,
) -> Api<UserSummary> {
  ok(app.sv().user.summary(me.id).await?)
}

pub async fn announcements(
  State(app): State<Arc<AppState>>,
) -> Api<Vec<announcement::Model>> {
  ok(app.sv().announcement.active().await?)
}

pub async fn content(
  State(app): State<Arc<AppState>>,
  Query(query): Query<ContentQuery>,
) -> Api<Vec<ContentItem>> {
  ok(app.sv().content.list(query.kind).await?)
}

pub async fn premium(State(app): State<Arc<AppState>>) -> Api<Vec<CatalogEntry>> {
  ok(app.sv().premium.catalog().await?)
}

pub async fn requests(
  State(app): State<Arc<AppState>>,
  Extension(me): Extension<Principal>,
) -> Api<Vec<request::Model>> {
  ok(app.sv().request.by_user(me.id).await?)
}

pub async fn create_request(
  State(app): State<Arc<AppState>>,
  Extension(me): Extension<Principal>,
  Json(req): Json<NewRequest>,
) -> Api<request::Model> {
  ok(app.sv().request.create(me.id, &req.resource_name).await?)
}

pub async fn licenses(
  State(app): State<Arc<AppState>>,
  Extension(me): Extension<Principal>,
) -> Api<Vec<license_key::Model>> {
  ok(app.sv().license.by_user(me.id).await?)
}
