// app/src/errors.rs

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;
use sketchflow::FlowError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
  #[error("Validation Error: {0}")]
  Validation(String),

  #[error("Resource Not Found: {0}")]
  NotFound(String),

  #[error("Payment Processing Error: {0}")]
  Payment(String),

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Database Error: {0}")]
  Sqlx(#[from] sqlx::Error),

  #[error("I/O Error: {0}")]
  Io(#[from] std::io::Error),

  #[error("Image Error: {0}")]
  Image(String),

  #[error("PDF Error: {0}")]
  Pdf(String),

  #[error("Email Delivery Error: {0}")]
  Email(String),

  #[error("Workflow Error: {source}")]
  Workflow {
    #[from]
    source: FlowError,
  },

  /// The single error surfaced when the deliverables pipeline fails for any reason
  /// other than validation.
  #[error("Deliverables generation failed: {0}")]
  Deliverables(String),

  #[error("Internal Server Error: {0}")]
  Internal(String),
}

impl From<anyhow::Error> for AppError {
  fn from(err: anyhow::Error) -> Self {
    match err.downcast::<AppError>() {
      Ok(app_err) => app_err,
      Err(err) => match err.downcast::<sqlx::Error>() {
        Ok(sqlx_err) => AppError::Sqlx(sqlx_err),
        Err(err) => AppError::Internal(format!("{:#}", err)),
      },
    }
  }
}

impl From<serde_json::Error> for AppError {
  fn from(err: serde_json::Error) -> Self {
    AppError::Internal(format!("JSON error: {}", err))
  }
}

impl ResponseError for AppError {
  fn status_code(&self) -> StatusCode {
    match self {
      AppError::Validation(_) => StatusCode::BAD_REQUEST,
      AppError::NotFound(_) => StatusCode::NOT_FOUND,
      AppError::Payment(_) => StatusCode::PAYMENT_REQUIRED,
      _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  fn error_response(&self) -> HttpResponse {
    // Full detail stays in the server log; clients only get a generic message for 5xx.
    match self {
      AppError::Validation(m) | AppError::NotFound(m) | AppError::Payment(m) => {
        tracing::warn!(application_error = %self, "Responding with client error");
        HttpResponse::build(self.status_code()).json(json!({ "error": m }))
      }
      AppError::Deliverables(_) => {
        tracing::error!(application_error = %self, "Responding with error");
        HttpResponse::InternalServerError().json(json!({ "error": "Generation failed. Please try again." }))
      }
      _ => {
        tracing::error!(application_error = %self, "Responding with error");
        HttpResponse::InternalServerError().json(json!({ "error": "An internal error occurred" }))
      }
    }
  }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;
