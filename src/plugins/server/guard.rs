//! Route authorization.
//!
//! Every request is matched against [`RULES`] top to bottom. Patterns are
//! split on `/`: `*` matches one segment and a trailing `**` matches
//! whatever is left. Unmatched `/api` paths need a signed-in user.

use std::{net::SocketAddr, sync::Arc};

use axum::{
  extract::{ConnectInfo, Request, State},
  http::{HeaderMap, Method, header},
  middleware::Next,
  response::Response,
};

use crate::{auth::Principal, entity::Role, prelude::*, state::AppState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
  Public,
  User,
  Admin,
  SuperAdmin,
}

impl Access {
  fn role(self) -> Option<Role> {
    match self {
      Access::Public => None,
      Access::User => Some(Role::User),
      Access::Admin => Some(Role::Admin),
      Access::SuperAdmin => Some(Role::SuperAdmin),
    }
  }
}

struct Rule {
  method: Option<&'static str>,
  pattern: &'static str,
  access: Access,
}

const fn rule(
  method: Option<&'static str>,
  pattern: &'static str,
  access: Access,
) -> Rule {
  Rule { method, pattern, access }
}

static RULES: &[Rule] = &[
  rule(None, "/health", Access::Public),
  rule(None, "/api/auth/**", Access::Public),
  rule(None, "/api/admin/settings", Access::SuperAdmin),
  rule(Some("POST"), "/api/admin/users/*/role", Access::SuperAdmin),
  rule(None, "/api/admin/**", Access::Admin),
  rule(None, "/api/**", Access::User),
];

fn matches(pattern: &str, path: &str) -> bool {
  let mut pattern = pattern.trim_matches('/').split('/');
  let mut path = path.trim_matches('/').split('/').filter(|s| !s.is_empty());

  loop {
    match (pattern.next(), path.next()) {
      (Some("**"), _) => return true,
      (Some("*"), Some(_)) => {}
      (Some(expected), Some(segment)) if expected == segment => {}
      (None, None) => return true,
      _ => return false,
    }
  }
}

pub fn access_for(method: &Method, path: &str) -> Access {
  RULES
    .iter()
    .find(|rule| {
      rule.method.is_none_or(|m| m == method.as_str())
        && matches(rule.pattern, path)
    })
    .map(|rule| rule.access)
    .unwrap_or(if path.starts_with("/api/") {
      Access::User
    } else {
      Access::Public
    })
}

pub fn bearer(headers: &HeaderMap) -> Option<&str> {
  headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.strip_prefix("Bearer "))
    .map(str::trim)
    .filter(|token| !token.is_empty())
}

/// Resolves the session into a fresh [`Principal`] for non-public routes.
pub async fn guard(
  State(app): State<Arc<AppState>>,
  mut request: Request,
  next: Next,
) -> Result<Response> {
  let access = access_for(request.method(), request.uri().path());
  let Some(required) = access.role() else {
    return Ok(next.run(request).await);
  };

  let user_id = bearer(request.headers())
    .and_then(|token| app.touch_session(token))
    .ok_or(Error::Unauthorized)?;

  // Reload on every request so role changes and deactivation apply at once.
  let Some(user) = app.sv().user.by_id(user_id).await? else {
    app.drop_user_sessions(user_id);
    return Err(Error::Unauthorized);
  };
  if !user.is_active {
    app.drop_user_sessions(user.id);
    return Err(Error::AccountDisabled);
  }
  if !user.role.at_least(required) {
    debug!(
      "Denied {} {} to user {} ({:?})",
      request.method(),
      request.uri().path(),
      user.id,
      user.role
    );
    return Err(Error::Forbidden);
  }
  if !user.role.is_admin() && app.sv().settings.get().await?.maintenance_mode {
    return Err(Error::Maintenance);
  }

  let ip = request
    .extensions()
    .get::<ConnectInfo<SocketAddr>>()
    .map(|ConnectInfo(addr)| addr.ip().to_string());

  request
    .extensions_mut()
    .insert(Principal { id: user.id, name: user.name, role: user.role, ip });

  Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_pattern_matching() {
    assert!(matches("/api/**", "/api/me"));
    assert!(matches("/api/**", "/api/support/tickets/3/messages"));
    assert!(matches("/api/admin/users/*/role", "/api/admin/users/7/role"));
    assert!(!matches("/api/admin/users/*/role", "/api/admin/users/7/active"));
    assert!(!matches("/api/admin/users/*/role", "/api/admin/users/role"));
    assert!(matches("/health", "/health/"));
    assert!(!matches("/health", "/healthz"));
  }

  #[test]
  fn test_first_rule_wins() {
    let get = Method::GET;
    let post = Method::POST;

    assert_eq!(access_for(&get, "/health"), Access::Public);
    assert_eq!(access_for(&post, "/api/auth/login"), Access::Public);
    assert_eq!(access_for(&get, "/api/me"), Access::User);
    assert_eq!(access_for(&get, "/api/admin/stats"), Access::Admin);
    assert_eq!(access_for(&post, "/api/admin/users/4/role"), Access::SuperAdmin);
    assert_eq!(access_for(&post, "/api/admin/users/4/active"), Access::Admin);
    assert_eq!(access_for(&get, "/api/admin/settings"), Access::SuperAdmin);
    assert_eq!(access_for(&get, "/favicon.ico"), Access::Public);
  }
}
