pub mod gc;
pub mod server;

use std::sync::Arc;

use tokio::time::sleep;

use crate::{prelude::*, state::AppState};

const RESTART_DELAY: Duration = Duration::from_secs(5);

#[async_trait::async_trait]
pub trait Plugin: Send + Sync {
  fn name(&self) -> &'static str {
    std::any::type_name::<Self>()
  }

  /// Runs until the plugin gives up; returning at all counts as a stop.
  async fn start(&self, app: Arc<AppState>) -> anyhow::Result<()>;
}

/// Long-running background services, each restarted when it stops.
pub struct App {
  plugins: Vec<Arc<dyn Plugin>>,
  restart_delay: Duration,
}

impl App {
  pub fn new() -> Self {
    Self { plugins: Vec::new(), restart_delay: RESTART_DELAY }
  }

  #[cfg(test)]
  fn restart_delay(mut self, delay: Duration) -> Self {
    self.restart_delay = delay;
    self
  }

  pub fn register<P: Plugin + 'static>(mut self, plugin: P) -> Self {
    self.plugins.push(Arc::new(plugin));
    self
  }

  pub fn run(self, app: Arc<AppState>) {
    for plugin in self.plugins {
      tokio::spawn(supervise(plugin, app.clone(), self.restart_delay));
    }
  }
}

async fn supervise(plugin: Arc<dyn Plugin>, app: Arc<AppState>, delay: Duration) {
  let name = plugin.name();
  info!("SYSTEM: Service `{name}` initialized");

  loop {
    let handle = tokio::spawn({
      let (plugin, app) = (plugin.clone(), app.clone());
      async move { plugin.start(app).await }
    });

    match handle.await {
      Ok(Ok(())) => warn!("Service `{name}` stopped unexpectedly"),
      Ok(Err(err)) => error!("Service `{name}` crashed with error: {err:#}"),
      Err(err) if err.is_cancelled() => {
        info!("Service `{name}` shutdown");
        break;
      }
      Err(_) => error!("Service `{name}` PANICKED!"),
    }

    sleep(delay).await;
    info!("SYSTEM: Restarting service `{name}`...");
  }
}

#[cfg(test)]
mod tests {
  use std::sync::atomic::{AtomicU32, Ordering};

  use super::*;
  use crate::{state::Config, sv::testing::setup_test_db};

  struct Flaky(Arc<AtomicU32>);

  #[async_trait::async_trait]
  impl Plugin for Flaky {
    fn name(&self) -> &'static str {
      "flaky"
    }

    async fn start(&self, _: Arc<AppState>) -> anyhow::Result<()> {
      let n = self.0.fetch_add(1, Ordering::SeqCst);
      if n == 1 {
        panic!("second start blows up");
      }
      anyhow::bail!("start #{n} failed")
    }
  }

  #[tokio::test]
  async fn test_crashed_plugins_restart() {
    let app = Arc::new(AppState::with_db(setup_test_db().await, Config::default()));
    let starts = Arc::new(AtomicU32::new(0));

    App::new()
      .restart_delay(Duration::from_millis(5))
      .register(Flaky(starts.clone()))
      .run(app);

    for _ in 0..200 {
      if starts.load(Ordering::SeqCst) >= 3 {
        return;
      }
      sleep(Duration::from_millis(5)).await;
    }
    panic!("plugin was not restarted: {} starts", starts.load(Ordering::SeqCst));
  }
}
