//! Password hashing, sessions and the authenticated principal.

use argon2::{
  Argon2,
  password_hash::{
    PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
    rand_core::OsRng,
  },
};
use serde::Serialize;

use crate::{entity::Role, prelude::*, sv::Actor};

pub const MIN_PASSWORD_LEN: usize = 8;

#[cfg(not(test))]
fn hasher() -> Argon2<'static> {
  Argon2::default()
}

// Cheapest parameters, tests hash a lot of passwords.
#[cfg(test)]
fn hasher() -> Argon2<'static> {
  let params = argon2::Params::new(argon2::Params::MIN_M_COST, 1, 1, None)
    .unwrap_or_default();
  Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params)
}

pub fn hash_password(password: &str) -> Result<String> {
  if password.chars().count() < MIN_PASSWORD_LEN {
    return Err(Error::invalid(format!(
      "Password must be at least {MIN_PASSWORD_LEN} characters"
    )));
  }

  let salt = SaltString::generate(&mut OsRng);
  hasher()
    .hash_password(password.as_bytes(), &salt)
    .map(|hash| hash.to_string())
    .map_err(|err| Error::Internal(format!("Password hashing failed: {err}")))
}

pub fn verify_password(password: &str, hash: &str) -> bool {
  match PasswordHash::new(hash) {
    Ok(parsed) => {
      Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok()
    }
    Err(_) => false,
  }
}

#[derive(Debug, Clone)]
pub struct Session {
  pub user_id: i32,
  pub last_seen: DateTime,
}

impl Session {
  pub fn is_expired(&self, now: DateTime, lifetime: Duration) -> bool {
    (now - self.last_seen).to_std().is_ok_and(|idle| idle >= lifetime)
  }
}

/// Signed-in user resolved by the guard for the current request.
#[derive(Debug, Clone, Serialize)]
pub struct Principal {
  pub id: i32,
  pub name: String,
  pub role: Role,
  #[serde(skip)]
  pub ip: Option<String>,
}

impl Principal {
  pub fn is_admin(&self) -> bool {
    self.role.is_admin()
  }

  pub fn actor(&self) -> Actor {
    Actor { id: self.id, role: self.role, ip: self.ip.clone() }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_hash_and_verify() {
    let hash = hash_password("correct horse").unwrap();
    assert!(hash.starts_with("$argon2id$"));
    assert!(verify_password("correct horse", &hash));
    assert!(!verify_password("wrong horse", &hash));
  }

  #[test]
  fn test_short_password_rejected() {
    assert!(matches!(hash_password("short"), Err(Error::InvalidArgs(_))));
  }

  #[test]
  fn test_garbage_hash_never_verifies() {
    assert!(!verify_password("anything", "not-a-phc-string"));
  }

  #[test]
  fn test_session_expiry() {
    let now = utils::now();
    let session = Session {
      user_id: 1,
      last_seen: now - chrono::TimeDelta::minutes(30),
    };

    assert!(session.is_expired(now, Duration::from_secs(60)));
    assert!(!session.is_expired(now, Duration::from_secs(3600)));
  }
}
