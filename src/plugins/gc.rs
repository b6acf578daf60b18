use std::sync::Arc;

use async_trait::async_trait;

use crate::{plugins::Plugin, prelude::*, state::AppState};

const SWEEP_EVERY: Duration = Duration::from_secs(60);

/// Drops sessions idle for longer than the configured lifetime.
pub struct SessionSweeper;

#[async_trait]
impl Plugin for SessionSweeper {
  async fn start(&self, app: Arc<AppState>) -> anyhow::Result<()> {
    let mut interval = tokio::time::interval(SWEEP_EVERY);

    loop {
      interval.tick().await;

      let swept = app.gc_sessions();
      if swept > 0 {
        debug!("Swept {swept} expired sessions, {} alive", app.sessions.len());
      }
    }
  }
}
