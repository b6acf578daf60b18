use std::sync::Arc;

use axum::{Extension, extract::State};
use serde::Deserialize;

use super::{Api, Json, Path, ok};
use crate::{
  auth::Principal,
  entity::{feedback, message, ticket},
  state::AppState,
  sv::ticket::{NewFeedback, NewMessage, NewTicket, Reacted, Thread},
};

#[derive(Debug, Deserialize)]
pub struct Reaction {
  pub emoji: String,
}

/// Own tickets for users, the whole queue for admins.
pub async fn tickets(
  State(app): State<Arc<AppState>>,
  Extension(me): Extension<Principal>,
) -> Api<Vec<ticket::Model>> {
  let sv = app.sv().ticket;
  if me.is_admin() { ok(sv.list(None).await?) } else { ok(sv.by_user(me.id).await?) }
}

pub async fn open(
  State(app): State<Arc<AppState>>,
  Extension(me): Extension<Principal>,
  Json(new): Json<NewTicket>,
) -> Api<ticket::Model> {
  ok(app.sv().ticket.create(me.id, new).await?)
}

pub async fn thread(
  State(app): State<Arc<AppState>>,
  Extension(me): Extension<Principal>,
  Path(id): Path<i32>,
) -> Api<Thread> {
  ok(app.sv().ticket.thread(&me.actor(), id).await?)
}

pub async fn append(
  State(app): State<Arc<AppState>>,
  Extension(me): Extension<Principal>,
  Path(id): Path<i32>,
  Json(new): Json<NewMessage>,
) -> Api<message::Model> {
  ok(app.sv().ticket.append(&me.actor(), id, new).await?)
}

pub async fn feedback(
  State(app): State<Arc<AppState>>,
  Extension(me): Extension<Principal>,
  Path(id): Path<i32>,
  Json(new): Json<NewFeedback>,
) -> Api<feedback::Model> {
  ok(app.sv().ticket.feedback(&me.actor(), id, new).await?)
}

pub async fn react(
  State(app): State<Arc<AppState>>,
  Extension(me): Extension<Principal>,
  Path(id): Path<i32>,
  Json(reaction): Json<Reaction>,
) -> Api<Reacted> {
  ok(app.sv().ticket.react(&me.actor(), id, &reaction.emoji).await?)
}
