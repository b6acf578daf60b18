use crate::prelude::*;

pub fn now() -> DateTime {
  Utc::now().naive_utc()
}

/// Trims `value` and rejects it when nothing is left.
pub fn required(field: &str, value: &str) -> Result<String> {
  let value = value.trim();
  if value.is_empty() {
    return Err(Error::invalid(format!("{field} is required")));
  }
  Ok(value.to_string())
}

/// Trims an optional free-text field, mapping blank input to `None`.
pub fn optional(value: Option<String>) -> Option<String> {
  value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

pub fn normalize_email(email: &str) -> Result<String> {
  let email = email.trim().to_lowercase();
  match email.split_once('@') {
    Some((local, domain)) if !local.is_empty() && domain.contains('.') => {
      Ok(email)
    }
    _ => Err(Error::invalid("Email address is not valid")),
  }
}

const SERIAL_MIN_LEN: usize = 4;
const SERIAL_MAX_LEN: usize = 64;

/// Canonical form of a serial code: trimmed, upper-case, `[A-Z0-9-]` only.
pub fn normalize_serial(code: &str) -> Option<String> {
  let code = code.trim().to_uppercase();
  let valid = (SERIAL_MIN_LEN..=SERIAL_MAX_LEN).contains(&code.len())
    && code.chars().all(|c| c.is_ascii_alphanumeric() || c == '-');
  valid.then_some(code)
}
