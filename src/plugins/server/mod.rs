mod guard;
mod handlers;

use std::{net::SocketAddr, sync::Arc};

use async_trait::async_trait;
use axum::{
  Router, middleware,
  routing::{get, post},
};
use tower::ServiceBuilder;
use tower_governor::{GovernorLayer, governor::GovernorConfigBuilder};
use tower_http::{
  cors::{Any, CorsLayer},
  trace::TraceLayer,
};

use self::handlers::{account, admin, support};
use crate::{prelude::*, state::AppState};

pub struct Plugin;

/// Every route behind the guard. Rate limiting is left to [`Plugin`] since it
/// keys on the peer address.
pub fn router(app: Arc<AppState>) -> Router {
  Router::new()
    .route("/health", get(handlers::health))
    .route("/api/auth/register", post(account::register))
    .route("/api/auth/login", post(account::login))
    .route("/api/auth/logout", post(account::logout))
    .route("/api/me", get(account::me))
    .route("/api/announcements", get(account::announcements))
    .route("/api/content", get(account::content))
    .route("/api/premium", get(account::premium))
    .route(
      "/api/requests",
      get(account::requests).post(account::create_request),
    )
    .route("/api/licenses", get(account::licenses))
    .route("/api/support/tickets", get(support::tickets).post(support::open))
    .route("/api/support/tickets/{id}", get(support::thread))
    .route("/api/support/tickets/{id}/messages", post(support::append))
    .route("/api/support/tickets/{id}/feedback", post(support::feedback))
    .route("/api/support/messages/{id}/reactions", post(support::react))
    .route("/api/admin/stats", get(admin::stats))
    .route("/api/admin/users", get(admin::users))
    .route("/api/admin/users/{id}/active", post(admin::set_active))
    .route("/api/admin/users/{id}/role", post(admin::set_role))
    .route("/api/admin/serials", get(admin::serials))
    .route("/api/admin/serials/import", post(admin::import_serials))
    .route("/api/admin/serials/{id}/unlink", post(admin::unlink_serial))
    .route("/api/admin/serials/{id}/block", post(admin::block_serial))
    .route(
      "/api/admin/serials/{id}",
      axum::routing::delete(admin::delete_serial),
    )
    .route("/api/admin/requests", get(admin::requests))
    .route("/api/admin/requests/{id}/decide", post(admin::decide))
    .route(
      "/api/admin/premium",
      get(admin::premium).post(admin::create_premium),
    )
    .route(
      "/api/admin/premium/{id}",
      axum::routing::put(admin::update_premium).delete(admin::delete_premium),
    )
    .route(
      "/api/admin/licenses",
      get(admin::licenses).post(admin::create_license),
    )
    .route("/api/admin/licenses/{id}/assign", post(admin::assign_license))
    .route("/api/admin/licenses/{id}/unassign", post(admin::unassign_license))
    .route(
      "/api/admin/licenses/{id}",
      axum::routing::delete(admin::delete_license),
    )
    .route("/api/admin/tickets", get(admin::tickets))
    .route("/api/admin/tickets/{id}/status", post(admin::ticket_status))
    .route("/api/admin/tickets/{id}/priority", post(admin::ticket_priority))
    .route(
      "/api/admin/content",
      get(admin::content).post(admin::save_content),
    )
    .route(
      "/api/admin/content/{kind}/{id}",
      axum::routing::delete(admin::delete_content),
    )
    .route(
      "/api/admin/announcements",
      get(admin::announcements).post(admin::create_announcement),
    )
    .route(
      "/api/admin/announcements/{id}",
      axum::routing::put(admin::update_announcement)
        .delete(admin::delete_announcement),
    )
    .route("/api/admin/audit", get(admin::audit))
    .route(
      "/api/admin/settings",
      get(admin::settings).put(admin::update_settings),
    )
    .layer(middleware::from_fn_with_state(app.clone(), guard::guard))
    .layer(
      ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(
        CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
      ),
    )
    .with_state(app)
}

#[async_trait]
impl super::Plugin for Plugin {
  async fn start(&self, app: Arc<AppState>) -> anyhow::Result<()> {
    let governor_conf = Arc::new(
      GovernorConfigBuilder::default()
        .per_second(app.config.rate_per_second)
        .burst_size(app.config.rate_burst)
        .finish()
        .context("Failed to build rate limiter config")?,
    );

    let limiter = governor_conf.limiter().clone();

    let addr = SocketAddr::from(([0, 0, 0, 0], app.config.port));
    let router = router(app)
      .layer(GovernorLayer::new(governor_conf))
      .into_make_service_with_connect_info::<SocketAddr>();

    let listener = tokio::net::TcpListener::bind(addr)
      .await
      .with_context(|| format!("Failed to bind {addr}"))?;
    info!("HTTP Server listening on {addr}");

    let limiter = async {
      loop {
        tokio::time::sleep(Duration::from_secs(60)).await;
        limiter.retain_recent();
      }
    };

    let server = async {
      axum::serve(listener, router).await.context("Axum server error")
    };

    tokio::select! {
      result = server => {
        match &result {
          Ok(_) => info!("Server stopped gracefully"),
          Err(err) => error!("Server stopped with error: {err}"),
        }
        result
      }
      _ = limiter => {
        error!("Rate limiter cleaner stopped unexpectedly!");
        Ok(())
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use axum::{
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
  };
  use tower::ServiceExt;

  use super::*;
  use crate::{
    entity::Role,
    state::Config,
    sv::testing::{seed_serials, seed_user, setup_test_db},
  };

  struct Client {
    router: Router,
    app: Arc<AppState>,
  }

  impl Client {
    async fn new() -> Self {
      let app = Arc::new(AppState::with_db(setup_test_db().await, Config::default()));
      Self { router: router(app.clone()), app }
    }

    async fn call(
      &self,
      method: &str,
      uri: &str,
      token: Option<&str>,
      body: Option<json::Value>,
    ) -> (StatusCode, json::Value) {
      let mut request = Request::builder().method(method).uri(uri);
      if let Some(token) = token {
        request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
      }
      let request = match body {
        Some(body) => request
          .header(header::CONTENT_TYPE, "application/json")
          .body(Body::from(body.to_string())),
        None => request.body(Body::empty()),
      }
      .unwrap();

      let response = self.router.clone().oneshot(request).await.unwrap();
      let status = response.status();
      let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
      (status, json::from_slice(&bytes).unwrap_or(json::Value::Null))
    }

    async fn sign_in(&self, email: &str, role: Role) -> String {
      seed_user(&self.app.db, email, role).await;
      let creds = json::json!({ "email": email, "password": "password123" });
      let (status, body) =
        self.call("POST", "/api/auth/login", None, Some(creds)).await;
      assert_eq!(status, StatusCode::OK, "{body}");
      body["data"]["token"].as_str().unwrap().to_string()
    }
  }

  #[tokio::test]
  async fn test_register_login_logout() {
    let client = Client::new().await;
    seed_serials(&client.app.db, &["PCMBD-2024-0001"]).await;

    let registration = json::json!({
      "name": "Rahim",
      "email": "Rahim@Example.com",
      "password": "hunter2hunter2",
      "serial": "pcmbd-2024-0001",
    });
    let (status, body) = client
      .call("POST", "/api/auth/register", None, Some(registration.clone()))
      .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["email"], "rahim@example.com");
    assert!(body["data"].get("password_hash").is_none());

    let (status, body) =
      client.call("POST", "/api/auth/register", None, Some(registration)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "SERIAL_ALREADY_ASSIGNED");

    let creds = json::json!({ "email": "rahim@example.com", "password": "hunter2hunter2" });
    let (_, body) = client.call("POST", "/api/auth/login", None, Some(creds)).await;
    let token = body["data"]["token"].as_str().unwrap().to_string();

    let (status, body) = client.call("GET", "/api/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["serial"], "PCMBD-2024-0001");

    let (_, body) = client.call("POST", "/api/auth/logout", Some(&token), None).await;
    assert_eq!(body["data"], true);

    let (status, body) = client.call("GET", "/api/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");
  }

  #[tokio::test]
  async fn test_wrong_password() {
    let client = Client::new().await;
    seed_user(&client.app.db, "user@example.com", Role::User).await;

    let creds = json::json!({ "email": "user@example.com", "password": "nope-nope" });
    let (status, body) = client.call("POST", "/api/auth/login", None, Some(creds)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "INVALID_CREDENTIALS");
  }

  #[tokio::test]
  async fn test_malformed_input_uses_envelope() {
    let client = Client::new().await;
    let admin = client.sign_in("admin@example.com", Role::Admin).await;

    let partial = json::json!({ "email": "a@b.co" });
    let (status, body) = client.call("POST", "/api/auth/login", None, Some(partial)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "INVALID_ARGS");
    assert!(body["error"].as_str().is_some_and(|e| e.contains("password")), "{body}");

    let (status, body) = client.call("POST", "/api/auth/login", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_ARGS");

    let active = json::json!({ "active": false });
    let (status, body) =
      client.call("POST", "/api/admin/users/abc/active", Some(&admin), Some(active)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "INVALID_ARGS");

    let (status, body) =
      client.call("GET", "/api/admin/serials?status=LOST", Some(&admin), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_ARGS");
  }

  #[tokio::test]
  async fn test_guard_enforces_roles() {
    let client = Client::new().await;
    let user = client.sign_in("user@example.com", Role::User).await;
    let admin = client.sign_in("admin@example.com", Role::Admin).await;
    let root = client.sign_in("root@example.com", Role::SuperAdmin).await;

    let (status, _) = client.call("GET", "/api/admin/stats", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = client.call("GET", "/api/admin/stats", Some("bogus"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = client.call("GET", "/api/admin/stats", Some(&user), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");

    let (status, body) = client.call("GET", "/api/admin/stats", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["users"], 3);

    let (status, _) = client.call("GET", "/api/admin/settings", Some(&admin), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, body) = client.call("GET", "/api/admin/settings", Some(&root), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["registration_open"], true);

    let (status, _) = client.call("GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
  }

  #[tokio::test]
  async fn test_deactivation_ends_sessions() {
    let client = Client::new().await;
    let user = client.sign_in("user@example.com", Role::User).await;
    let admin = client.sign_in("admin@example.com", Role::Admin).await;

    let (_, body) = client.call("GET", "/api/me", Some(&user), None).await;
    let id = body["data"]["id"].as_i64().unwrap();

    let uri = format!("/api/admin/users/{id}/active");
    let (status, body) = client
      .call("POST", &uri, Some(&admin), Some(json::json!({ "active": false })))
      .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["is_active"], false);

    let (status, _) = client.call("GET", "/api/me", Some(&user), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let creds = json::json!({ "email": "user@example.com", "password": "password123" });
    let (status, body) = client.call("POST", "/api/auth/login", None, Some(creds)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "ACCOUNT_DISABLED");
  }

  #[tokio::test]
  async fn test_maintenance_locks_out_users() {
    let client = Client::new().await;
    let user = client.sign_in("user@example.com", Role::User).await;
    let admin = client.sign_in("admin@example.com", Role::Admin).await;
    let root = client.sign_in("root@example.com", Role::SuperAdmin).await;

    let settings = json::json!({
      "site_name": "PC MASTER BD",
      "registration_open": true,
      "maintenance_mode": true,
      "max_open_tickets": 5,
    });
    let (status, _) =
      client.call("PUT", "/api/admin/settings", Some(&root), Some(settings)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = client.call("GET", "/api/me", Some(&user), None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["code"], "MAINTENANCE");

    let (status, _) = client.call("GET", "/api/me", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
  }

  #[tokio::test]
  async fn test_support_flow() {
    let client = Client::new().await;
    let user = client.sign_in("user@example.com", Role::User).await;
    let admin = client.sign_in("admin@example.com", Role::Admin).await;

    let ticket = json::json!({ "subject": "Boot loop", "message": "Stuck at logo" });
    let (status, body) =
      client.call("POST", "/api/support/tickets", Some(&user), Some(ticket)).await;
    assert_eq!(status, StatusCode::OK);
    let id = body["data"]["id"].as_i64().unwrap();

    let uri = format!("/api/admin/tickets/{id}/status");
    client
      .call("POST", &uri, Some(&admin), Some(json::json!({ "status": "CLOSED" })))
      .await;

    let uri = format!("/api/support/tickets/{id}/messages");
    let (status, body) = client
      .call("POST", &uri, Some(&user), Some(json::json!({ "message": "still broken" })))
      .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "TICKET_CLOSED");

    let uri = format!("/api/support/tickets/{id}/feedback");
    let (status, body) = client
      .call("POST", &uri, Some(&user), Some(json::json!({ "rating": 4 })))
      .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["rating"], 4);

    let (_, body) =
      client.call("GET", &format!("/api/support/tickets/{id}"), Some(&user), None).await;
    assert_eq!(body["data"]["ticket"]["status"], "CLOSED");
    assert_eq!(body["data"]["messages"].as_array().map(Vec::len), Some(1));
  }
}
