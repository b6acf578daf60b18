//! PC MASTER BD support portal.
//!
//! - SeaORM over SQLite for storage, migrated at startup
//! - Axum HTTP API behind a role guard and rate limiting
//! - In-memory sessions swept by a background plugin

mod auth;
mod entity;
mod error;
mod plugins;
mod prelude;
mod retry;
mod state;
mod sv;
mod utils;

use std::sync::Arc;

use tracing_subscriber::{
  EnvFilter, layer::SubscriberExt, util::SubscriberInitExt,
};

use crate::{prelude::*, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  dotenvy::dotenv().ok();

  tracing_subscriber::registry()
    .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
      "pcmaster=debug,tower_http=debug,sea_orm=warn".into()
    }))
    .with(tracing_subscriber::fmt::layer())
    .init();

  let config = state::Config::from_env()?;
  info!("Starting PC MASTER BD portal v{}", env!("CARGO_PKG_VERSION"));

  let app = Arc::new(AppState::new(config).await?);

  plugins::App::new()
    .register(plugins::server::Plugin)
    .register(plugins::gc::SessionSweeper)
    .run(app);

  tokio::signal::ctrl_c().await.context("Failed to listen for ctrl-c")?;
  info!("Shutting down");

  Ok(())
}
