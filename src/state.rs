use std::env;

use migration::{Migrator, MigratorTrait};

use crate::{auth::Session, prelude::*, retry::RetryPolicy, sv};

pub type Sessions = DashMap<String, Session>;

#[derive(Debug, Clone)]
pub struct Config {
  pub database_url: String,
  pub port: u16,
  /// Idle time after which a session token stops working.
  pub session_lifetime: Duration,
  pub stats_retry: RetryPolicy,
  pub rate_per_second: u64,
  pub rate_burst: u32,
  pub superadmin: Option<(String, String)>,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      database_url: String::from("sqlite:pcmaster.db?mode=rwc"),
      port: 3000,
      session_lifetime: Duration::from_secs(12 * 3600),
      stats_retry: RetryPolicy::default(),
      rate_per_second: 2,
      rate_burst: 100,
      superadmin: None,
    }
  }
}

fn var_duration(name: &str) -> anyhow::Result<Option<Duration>> {
  match env::var(name) {
    Ok(raw) => humantime::parse_duration(raw.trim())
      .map(Some)
      .with_context(|| format!("Invalid duration in {name}: {raw}")),
    Err(_) => Ok(None),
  }
}

fn var_parse<T: std::str::FromStr>(name: &str) -> anyhow::Result<Option<T>> {
  match env::var(name) {
    Ok(raw) => raw
      .trim()
      .parse()
      .map(Some)
      .map_err(|_| anyhow::anyhow!("Invalid value in {name}: {raw}")),
    Err(_) => Ok(None),
  }
}

impl Config {
  pub fn from_env() -> anyhow::Result<Self> {
    let mut config = Self::default();

    if let Ok(url) = env::var("DATABASE_URL") {
      config.database_url = url;
    }
    if let Some(port) = var_parse("PORT")? {
      config.port = port;
    }
    if let Some(lifetime) = var_duration("SESSION_LIFETIME")? {
      config.session_lifetime = lifetime;
    }
    if let Some(attempts) = var_parse("STATS_RETRY_ATTEMPTS")? {
      config.stats_retry.max_attempts = attempts;
    }
    if let Some(delay) = var_duration("STATS_RETRY_DELAY")? {
      config.stats_retry.base_delay = delay;
    }
    if let Some(timeout) = var_duration("STATS_TIMEOUT")? {
      config.stats_retry.timeout = timeout;
    }
    if let Some(rate) = var_parse("RATE_PER_SECOND")? {
      config.rate_per_second = rate;
    }
    if let Some(burst) = var_parse("RATE_BURST")? {
      config.rate_burst = burst;
    }

    if let (Ok(email), Ok(password)) =
      (env::var("SUPERADMIN_EMAIL"), env::var("SUPERADMIN_PASSWORD"))
    {
      config.superadmin = Some((email, password));
    }

    Ok(config)
  }
}

pub struct Services<'a> {
  pub user: sv::User<'a>,
  pub serial: sv::Serial<'a>,
  pub request: sv::Request<'a>,
  pub premium: sv::Premium<'a>,
  pub license: sv::LicenseKey<'a>,
  pub ticket: sv::Ticket<'a>,
  pub content: sv::Content<'a>,
  pub announcement: sv::Announcement<'a>,
  pub audit: sv::Audit<'a>,
  pub settings: sv::Settings<'a>,
  pub stats: sv::Stats<'a>,
}

pub struct AppState {
  pub db: DatabaseConnection,
  pub sessions: Sessions,
  pub config: Config,
}

impl AppState {
  pub async fn new(config: Config) -> anyhow::Result<Self> {
    info!("Connecting to database...");
    let db = Database::connect(&config.database_url)
      .await
      .context("Failed to connect to database")?;

    info!("Running migrations...");
    Migrator::up(&db, None).await.context("Failed to run migrations")?;

    let app = Self::with_db(db, config);

    if let Some((email, password)) = &app.config.superadmin {
      app
        .sv()
        .user
        .ensure_superadmin(email, password)
        .await
        .context("Failed to bootstrap superadmin")?;
    }

    Ok(app)
  }

  pub fn with_db(db: DatabaseConnection, config: Config) -> Self {
    Self { db, sessions: DashMap::new(), config }
  }

  pub fn sv(&self) -> Services<'_> {
    Services {
      user: sv::User::new(&self.db),
      serial: sv::Serial::new(&self.db),
      request: sv::Request::new(&self.db),
      premium: sv::Premium::new(&self.db),
      license: sv::LicenseKey::new(&self.db),
      ticket: sv::Ticket::new(&self.db),
      content: sv::Content::new(&self.db),
      announcement: sv::Announcement::new(&self.db),
      audit: sv::Audit::new(&self.db),
      settings: sv::Settings::new(&self.db),
      stats: sv::Stats::new(&self.db, &self.config.stats_retry),
    }
  }

  pub fn open_session(&self, user_id: i32) -> String {
    let token = uuid::Uuid::new_v4().simple().to_string();
    let now = utils::now();
    self.sessions.insert(token.clone(), Session { user_id, last_seen: now });
    token
  }

  /// Resolves a bearer token, refreshing its idle timer.
  pub fn touch_session(&self, token: &str) -> Option<i32> {
    let now = utils::now();
    let mut session = self.sessions.get_mut(token)?;

    if session.is_expired(now, self.config.session_lifetime) {
      drop(session);
      self.sessions.remove(token);
      return None;
    }

    session.last_seen = now;
    Some(session.user_id)
  }

  pub fn close_session(&self, token: &str) -> bool {
    self.sessions.remove(token).is_some()
  }

  pub fn drop_user_sessions(&self, user_id: i32) {
    self.sessions.retain(|_, session| session.user_id != user_id);
  }

  pub fn gc_sessions(&self) -> usize {
    let now = utils::now();
    let lifetime = self.config.session_lifetime;
    let before = self.sessions.len();

    self.sessions.retain(|_, session| !session.is_expired(now, lifetime));
    before.saturating_sub(self.sessions.len())
  }
}
