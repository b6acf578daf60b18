pub mod account;
pub mod admin;
pub mod support;

use axum::extract::{FromRequest, FromRequestParts};
use serde::Serialize;

use crate::prelude::*;

// Extractors whose rejections render through `Error`, so malformed input
// gets the same envelope as every other failure.

#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(Error))]
pub struct Json<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(Error))]
pub struct Path<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(Error))]
pub struct Query<T>(pub T);

#[derive(Debug, Serialize)]
pub struct Reply<T> {
  pub success: bool,
  pub data: T,
}

pub type Api<T> = Result<axum::Json<Reply<T>>>;

pub fn ok<T: Serialize>(data: T) -> Api<T> {
  Ok(axum::Json(Reply { success: true, data }))
}

pub async fn health() -> &'static str {
  "OK"
}
