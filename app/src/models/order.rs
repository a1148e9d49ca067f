// app/src/models/order.rs

use crate::errors::AppError;
use crate::models::catalog::{AddonSet, Tier};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// Lifecycle tag. Only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
  Created,
  Delivered,
}

impl OrderStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      OrderStatus::Created => "created",
      OrderStatus::Delivered => "delivered",
    }
  }

  pub fn parse(raw: &str) -> Option<OrderStatus> {
    match raw {
      "created" => Some(OrderStatus::Created),
      "delivered" => Some(OrderStatus::Delivered),
      _ => None,
    }
  }

  /// The later of the two states; a transition request never regresses the status.
  pub fn advance_to(self, next: OrderStatus) -> OrderStatus {
    self.max(next)
  }
}

/// Raw `orders` row as stored in SQLite.
#[derive(Debug, Clone, FromRow)]
pub struct OrderRow {
  pub id: String,
  pub email: String,
  pub tier: String,
  pub addons: String,
  pub status: String,
  pub price_cents: i64,
  pub currency: String,
  pub payment_ref: Option<String>,
  pub photo_path: Option<String>,
  pub quiz_answers: Option<String>,
  pub result_image_path: Option<String>,
  pub result_share_path: Option<String>,
  pub result_pdf_path: Option<String>,
  pub share_token: String,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

/// An order as the application and the API see it.
#[derive(Debug, Clone, Serialize)]
pub struct Order {
  pub id: String,
  pub email: String,
  pub tier: Tier,
  pub addons: AddonSet,
  pub status: OrderStatus,
  pub price_cents: i64,
  pub currency: String,
  pub payment_ref: Option<String>,
  pub photo_path: Option<String>,
  /// Normalized quiz JSON, absent until intake.
  pub quiz_answers: Option<serde_json::Value>,
  pub result_image_path: Option<String>,
  pub result_share_path: Option<String>,
  pub result_pdf_path: Option<String>,
  pub share_token: String,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
  type Error = AppError;

  fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
    let status = OrderStatus::parse(&row.status)
      .ok_or_else(|| AppError::Internal(format!("Order {} has unknown status '{}'", row.id, row.status)))?;
    let addons: AddonSet = serde_json::from_str(&row.addons)
      .map_err(|e| AppError::Internal(format!("Order {} has malformed addons: {}", row.id, e)))?;
    let quiz_answers = row
      .quiz_answers
      .as_deref()
      .map(serde_json::from_str::<serde_json::Value>)
      .transpose()
      .map_err(|e| AppError::Internal(format!("Order {} has malformed quiz answers: {}", row.id, e)))?;

    Ok(Order {
      tier: Tier::parse_or_basic(Some(&row.tier)),
      addons,
      status,
      quiz_answers,
      id: row.id,
      email: row.email,
      price_cents: row.price_cents,
      currency: row.currency,
      payment_ref: row.payment_ref,
      photo_path: row.photo_path,
      result_image_path: row.result_image_path,
      result_share_path: row.result_share_path,
      result_pdf_path: row.result_pdf_path,
      share_token: row.share_token,
      created_at: row.created_at,
      updated_at: row.updated_at,
    })
  }
}
