//! Error types for the portal

use axum::{
  Json,
  extract::rejection::{JsonRejection, PathRejection, QueryRejection},
  http::StatusCode,
  response::{IntoResponse, Response},
};
use tracing::error;

#[derive(Debug, thiserror::Error)]
pub enum Error {
  #[error("Database error: {0}")]
  Database(#[from] sea_orm::DbErr),

  #[error("{0}")]
  InvalidArgs(String),

  #[error("Sign in required")]
  Unauthorized,
  #[error("Access denied")]
  Forbidden,
  #[error("Invalid email or password")]
  InvalidCredentials,
  #[error("Account is disabled")]
  AccountDisabled,
  #[error("Registration is closed")]
  RegistrationClosed,
  #[error("Portal is under maintenance")]
  Maintenance,

  #[error("User not found")]
  UserNotFound,
  #[error("Email already registered")]
  EmailTaken,

  #[error("Serial number not found")]
  SerialNotFound,
  #[error("Serial number already in use")]
  SerialAlreadyAssigned,
  #[error("Serial number is assigned to a user, unlink it first")]
  SerialInUse,
  #[error("Serial number is not assigned")]
  SerialNotAssigned,

  #[error("Request not found")]
  RequestNotFound,
  #[error("A pending request for this resource already exists")]
  DuplicatePendingRequest,
  #[error("Request has already been decided")]
  AlreadyDecided,

  #[error("Premium account not found")]
  PremiumNotFound,

  #[error("License key not found")]
  LicenseNotFound,
  #[error("License key already exists")]
  LicenseKeyTaken,
  #[error("License key is already assigned, unassign it first")]
  LicenseAlreadyAssigned,
  #[error("License key is not assigned")]
  LicenseNotAssigned,

  #[error("Ticket not found")]
  TicketNotFound,
  #[error("Message not found")]
  MessageNotFound,
  #[error("Ticket is closed")]
  TicketClosed,
  #[error("Too many open tickets")]
  TooManyOpenTickets,
  #[error("Feedback is only accepted for resolved tickets")]
  FeedbackNotAllowed,
  #[error("Feedback already submitted")]
  FeedbackAlreadySubmitted,

  #[error("Content not found")]
  ContentNotFound,
  #[error("Category still has entries")]
  CategoryInUse,
  #[error("Announcement not found")]
  AnnouncementNotFound,

  #[error("Internal error: {0}")]
  Internal(String),
}

impl Error {
  pub fn invalid(message: impl Into<String>) -> Self {
    Self::InvalidArgs(message.into())
  }

  /// Stable machine-readable kind for clients.
  pub fn code(&self) -> &'static str {
    match self {
      Error::Database(_) => "DATABASE",
      Error::InvalidArgs(_) => "INVALID_ARGS",
      Error::Unauthorized => "UNAUTHORIZED",
      Error::Forbidden => "FORBIDDEN",
      Error::InvalidCredentials => "INVALID_CREDENTIALS",
      Error::AccountDisabled => "ACCOUNT_DISABLED",
      Error::RegistrationClosed => "REGISTRATION_CLOSED",
      Error::Maintenance => "MAINTENANCE",
      Error::UserNotFound => "USER_NOT_FOUND",
      Error::EmailTaken => "EMAIL_TAKEN",
      Error::SerialNotFound => "SERIAL_NOT_FOUND",
      Error::SerialAlreadyAssigned => "SERIAL_ALREADY_ASSIGNED",
      Error::SerialInUse => "SERIAL_IN_USE",
      Error::SerialNotAssigned => "SERIAL_NOT_ASSIGNED",
      Error::RequestNotFound => "REQUEST_NOT_FOUND",
      Error::DuplicatePendingRequest => "DUPLICATE_PENDING_REQUEST",
      Error::AlreadyDecided => "ALREADY_DECIDED",
      Error::PremiumNotFound => "PREMIUM_NOT_FOUND",
      Error::LicenseNotFound => "LICENSE_NOT_FOUND",
      Error::LicenseKeyTaken => "LICENSE_KEY_TAKEN",
      Error::LicenseAlreadyAssigned => "ALREADY_ASSIGNED",
      Error::LicenseNotAssigned => "NOT_ASSIGNED",
      Error::TicketNotFound => "TICKET_NOT_FOUND",
      Error::MessageNotFound => "MESSAGE_NOT_FOUND",
      Error::TicketClosed => "TICKET_CLOSED",
      Error::TooManyOpenTickets => "TOO_MANY_OPEN_TICKETS",
      Error::FeedbackNotAllowed => "FEEDBACK_NOT_ALLOWED",
      Error::FeedbackAlreadySubmitted => "FEEDBACK_ALREADY_SUBMITTED",
      Error::ContentNotFound => "CONTENT_NOT_FOUND",
      Error::CategoryInUse => "CATEGORY_IN_USE",
      Error::AnnouncementNotFound => "ANNOUNCEMENT_NOT_FOUND",
      Error::Internal(_) => "INTERNAL",
    }
  }

  pub fn status(&self) -> StatusCode {
    match self {
      Error::Database(_) | Error::Internal(_) => {
        StatusCode::INTERNAL_SERVER_ERROR
      }
      Error::InvalidArgs(_) => StatusCode::BAD_REQUEST,
      Error::Unauthorized | Error::InvalidCredentials => {
        StatusCode::UNAUTHORIZED
      }
      Error::Forbidden
      | Error::AccountDisabled
      | Error::RegistrationClosed
      | Error::FeedbackNotAllowed => StatusCode::FORBIDDEN,
      Error::Maintenance => StatusCode::SERVICE_UNAVAILABLE,
      Error::UserNotFound
      | Error::SerialNotFound
      | Error::RequestNotFound
      | Error::PremiumNotFound
      | Error::LicenseNotFound
      | Error::TicketNotFound
      | Error::MessageNotFound
      | Error::ContentNotFound
      | Error::AnnouncementNotFound => StatusCode::NOT_FOUND,
      Error::EmailTaken
      | Error::SerialAlreadyAssigned
      | Error::SerialInUse
      | Error::SerialNotAssigned
      | Error::DuplicatePendingRequest
      | Error::AlreadyDecided
      | Error::LicenseKeyTaken
      | Error::LicenseAlreadyAssigned
      | Error::LicenseNotAssigned
      | Error::TicketClosed
      | Error::TooManyOpenTickets
      | Error::FeedbackAlreadySubmitted
      | Error::CategoryInUse => StatusCode::CONFLICT,
    }
  }
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    let status = self.status();

    let message = match &self {
      Error::Database(err) => {
        error!("Database failure: {err}");
        "Something went wrong, try again later".to_string()
      }
      Error::Internal(err) => {
        error!("Internal failure: {err}");
        "Something went wrong, try again later".to_string()
      }
      other => other.to_string(),
    };

    let body = json::json!({
      "success": false,
      "error": message,
      "code": self.code(),
    });

    (status, Json(body)).into_response()
  }
}

macro_rules! invalid_from {
  ($($rejection:ty),*) => {
    $(impl From<$rejection> for Error {
      fn from(rejection: $rejection) -> Self {
        Self::InvalidArgs(rejection.body_text())
      }
    })*
  };
}

invalid_from!(JsonRejection, PathRejection, QueryRejection);

/// True when the database rejected a write on a unique constraint.
pub fn is_unique_violation(err: &sea_orm::DbErr) -> bool {
  matches!(err.sql_err(), Some(sea_orm::SqlErr::UniqueConstraintViolation(_)))
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
