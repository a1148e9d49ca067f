// app/src/web/handlers/order_handlers.rs

use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use futures_util::TryStreamExt;
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tracing::{info, instrument, warn};

use crate::db::NewOrder;
use crate::errors::AppError;
use crate::models::{AddonSet, QuizAnswers, Tier};
use crate::pipelines::deliverables_pipeline::{generate_deliverables, is_plausible_email};
use crate::services::mailer::ReportMeta;
use crate::services::payment::{price_for, CURRENCY};
use crate::services::storage::{path_string, unique_path, upload_extension};
use crate::state::AppState;

pub const MAX_PHOTO_BYTES: usize = 10 * 1024 * 1024;
pub const MAX_QUIZ_BYTES: usize = 64 * 1024;

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
  pub email: Option<String>,
  pub tier: Option<String>,
  #[serde(default)]
  pub addons: Vec<String>,
}

#[instrument(name = "handler::create_order", skip(app_state, req_body))]
pub async fn create_order_handler(
  app_state: web::Data<AppState>,
  req_body: web::Json<CreateOrderRequest>,
) -> Result<HttpResponse, AppError> {
  let req = req_body.into_inner();
  let email = req.email.as_deref().map(str::trim).unwrap_or_default().to_string();
  if email.is_empty() {
    return Err(AppError::Validation("Email is required.".to_string()));
  }
  if !is_plausible_email(&email) {
    return Err(AppError::Validation("Email address is not valid.".to_string()));
  }

  let tier = Tier::parse_or_basic(req.tier.as_deref());
  let addons = AddonSet::from_names(&req.addons);
  let price_cents = price_for(tier);

  let metadata = HashMap::from([
    ("tier".to_string(), tier.as_str().to_string()),
    ("addons".to_string(), addons.names().join(",")),
  ]);
  let transaction = app_state
    .services
    .payments
    .create_transaction(price_cents, CURRENCY, metadata)
    .await?;

  let order = app_state
    .store
    .create(NewOrder {
      email: email.clone(),
      tier,
      addons,
      price_cents,
      currency: CURRENCY.to_string(),
      payment_ref: Some(transaction.id),
    })
    .await?;
  info!(order_id = %order.id, tier = tier.as_str(), price_cents, "Order created.");

  let meta = ReportMeta {
    order_id: order.id.clone(),
    tier: order.tier,
    addons: order.addons.clone(),
    display_name: "Friend".to_string(),
  };
  if let Err(e) = app_state.services.mailer.send_confirmation(&email, &meta).await {
    warn!(order_id = %order.id, error = %e, "Order confirmation email failed; continuing.");
  }

  Ok(HttpResponse::Created().json(json!({
    "id": order.id,
    "price_cents": order.price_cents,
    "currency": order.currency,
  })))
}

/// Drops a stored upload, logging rather than failing if it is already gone.
async fn discard_upload(path: &str) {
  if let Err(e) = tokio::fs::remove_file(path).await {
    warn!(error = %e, path, "Could not remove discarded upload.");
  }
}

/// Reads the intake form. A stored photo is reported through `photo_path` as soon as it is
/// written, so the caller can remove it if a later part of the form is rejected.
async fn collect_intake(
  upload_dir: &Path,
  payload: &mut Multipart,
  photo_path: &mut Option<String>,
) -> Result<QuizAnswers, AppError> {
  let mut quiz_raw: Option<String> = None;

  while let Some(mut field) = payload
    .try_next()
    .await
    .map_err(|e| AppError::Validation(format!("Malformed multipart body: {}", e)))?
  {
    let field_name = field.name().unwrap_or_default().to_string();
    match field_name.as_str() {
      "photo" => {
        let original_name = field
          .content_disposition()
          .and_then(|cd| cd.get_filename())
          .map(str::to_string);
        let target = unique_path(upload_dir, "photo", &upload_extension(original_name.as_deref()));

        let mut file = tokio::fs::File::create(&target).await?;
        let mut written = 0usize;
        while let Some(chunk) = field
          .try_next()
          .await
          .map_err(|e| AppError::Validation(format!("Photo upload interrupted: {}", e)))?
        {
          written += chunk.len();
          if written > MAX_PHOTO_BYTES {
            drop(file);
            let _ = tokio::fs::remove_file(&target).await;
            return Err(AppError::Validation("Photo exceeds the 10 MB limit.".to_string()));
          }
          file.write_all(&chunk).await?;
        }
        file.flush().await?;
        drop(file);

        if written == 0 {
          let _ = tokio::fs::remove_file(&target).await;
        } else if let Some(previous) = photo_path.replace(path_string(&target)) {
          // A repeated photo part replaces the earlier one.
          discard_upload(&previous).await;
        }
      }
      "quiz" => {
        let mut raw = Vec::new();
        while let Some(chunk) = field
          .try_next()
          .await
          .map_err(|e| AppError::Validation(format!("Quiz upload interrupted: {}", e)))?
        {
          if raw.len() + chunk.len() > MAX_QUIZ_BYTES {
            return Err(AppError::Validation("Quiz payload is too large.".to_string()));
          }
          raw.extend_from_slice(&chunk);
        }
        quiz_raw = Some(
          String::from_utf8(raw).map_err(|_| AppError::Validation("Quiz must be UTF-8 text.".to_string()))?,
        );
      }
      other => {
        // Drain and ignore unknown fields.
        while field
          .try_next()
          .await
          .map_err(|e| AppError::Validation(format!("Malformed multipart field '{}': {}", other, e)))?
          .is_some()
        {}
      }
    }
  }

  let quiz = QuizAnswers::from_json_str(quiz_raw.as_deref().unwrap_or_default())
    .map_err(|e| AppError::Validation(format!("Invalid quiz JSON: {}", e)))?
    .normalized();
  Ok(quiz)
}

/// Multipart intake: optional `photo` file and optional `quiz` JSON string.
#[instrument(name = "handler::intake", skip(app_state, payload), fields(order_id = %path))]
pub async fn intake_handler(
  app_state: web::Data<AppState>,
  path: web::Path<String>,
  mut payload: Multipart,
) -> Result<HttpResponse, AppError> {
  let order_id = path.into_inner();
  app_state.store.get(&order_id).await?;

  let mut photo_path: Option<String> = None;
  let quiz = match collect_intake(&app_state.config.upload_dir, &mut payload, &mut photo_path).await {
    Ok(quiz) => quiz,
    Err(e) => {
      if let Some(stored) = photo_path.as_deref() {
        discard_upload(stored).await;
      }
      return Err(e);
    }
  };

  if let Err(e) = app_state
    .store
    .record_intake(&order_id, photo_path.as_deref(), &quiz)
    .await
  {
    if let Some(stored) = photo_path.as_deref() {
      discard_upload(stored).await;
    }
    return Err(e);
  }
  info!(has_photo = photo_path.is_some(), "Intake recorded.");

  Ok(HttpResponse::Ok().json(json!({ "ok": true })))
}

#[instrument(name = "handler::generate", skip(app_state), fields(order_id = %path))]
pub async fn generate_handler(
  app_state: web::Data<AppState>,
  path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
  let order = app_state.store.get(&path.into_inner()).await?;
  let deliverables = generate_deliverables(app_state.get_ref(), order).await?;

  Ok(HttpResponse::Ok().json(json!({
    "imagePath": deliverables.image_path,
    "sharePath": deliverables.share_path,
    "pdfPath": deliverables.pdf_path,
    "profileText": deliverables.profile_text,
  })))
}

#[instrument(name = "handler::get_order", skip(app_state), fields(order_id = %path))]
pub async fn get_order_handler(
  app_state: web::Data<AppState>,
  path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
  let order = app_state.store.get(&path.into_inner()).await?;
  Ok(HttpResponse::Ok().json(order))
}
