// app/src/db/order_store.rs

//! The SQLite-backed order store.
//!
//! Opened once at process start and shared through `AppState`; closed on shutdown.
//! SQLite runs in WAL mode, so single-row updates need no application-level locking.

use crate::errors::{AppError, Result};
use crate::models::{AddonSet, Order, OrderRow, OrderStatus, QuizAnswers, Tier};
use chrono::{DateTime, Duration, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::{Sqlite, Transaction};
use std::str::FromStr;
use std::time::Duration as StdDuration;
use tracing::{debug, info, instrument};
use uuid::Uuid;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS orders (
  id                TEXT PRIMARY KEY NOT NULL,
  email             TEXT NOT NULL,
  tier              TEXT NOT NULL,
  addons            TEXT NOT NULL DEFAULT '[]',
  status            TEXT NOT NULL,
  price_cents       INTEGER NOT NULL,
  currency          TEXT NOT NULL,
  payment_ref       TEXT,
  photo_path        TEXT,
  quiz_answers      TEXT,
  result_image_path TEXT,
  result_share_path TEXT,
  result_pdf_path   TEXT,
  share_token       TEXT NOT NULL,
  created_at        TEXT NOT NULL,
  updated_at        TEXT NOT NULL
)
"#;

const SELECT_ORDER: &str = "SELECT id, email, tier, addons, status, price_cents, currency, payment_ref, photo_path, \
  quiz_answers, result_image_path, result_share_path, result_pdf_path, share_token, created_at, updated_at \
  FROM orders WHERE id = ?";

/// Fields supplied when an order is created. Price and currency are already resolved.
#[derive(Debug, Clone)]
pub struct NewOrder {
  pub email: String,
  pub tier: Tier,
  pub addons: AddonSet,
  pub price_cents: i64,
  pub currency: String,
  pub payment_ref: Option<String>,
}

#[derive(Clone)]
pub struct OrderStore {
  pool: SqlitePool,
}

/// Next `updated_at`: now, but always strictly after the previous value.
fn bumped_timestamp(previous: DateTime<Utc>) -> DateTime<Utc> {
  let now = Utc::now();
  if now > previous {
    now
  } else {
    previous + Duration::microseconds(1)
  }
}

impl OrderStore {
  /// Opens (creating if needed) the database at `database_url` and applies the schema.
  #[instrument(name = "order_store::open", skip_all, err(Display))]
  pub async fn open(database_url: &str) -> Result<Self> {
    let options = SqliteConnectOptions::from_str(database_url)?
      .create_if_missing(true)
      .journal_mode(SqliteJournalMode::Wal)
      .busy_timeout(StdDuration::from_secs(5));

    if let Some(parent) = options.get_filename().parent() {
      if !parent.as_os_str().is_empty() {
        tokio::fs::create_dir_all(parent).await?;
      }
    }

    let pool = SqlitePoolOptions::new().max_connections(5).connect_with(options).await?;
    sqlx::query(SCHEMA).execute(&pool).await?;
    info!("Order store ready.");
    Ok(Self { pool })
  }

  pub fn pool(&self) -> &SqlitePool {
    &self.pool
  }

  pub async fn close(&self) {
    self.pool.close().await;
    info!("Order store closed.");
  }

  #[instrument(name = "order_store::create", skip(self, new_order), fields(tier = new_order.tier.as_str()), err(Display))]
  pub async fn create(&self, new_order: NewOrder) -> Result<Order> {
    let id = Uuid::new_v4().to_string();
    let share_token = Uuid::new_v4().simple().to_string();
    let now = Utc::now();
    let addons_json = serde_json::to_string(&new_order.addons)?;

    sqlx::query(
      "INSERT INTO orders (id, email, tier, addons, status, price_cents, currency, payment_ref, share_token, created_at, updated_at) \
       VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(&new_order.email)
    .bind(new_order.tier.as_str())
    .bind(&addons_json)
    .bind(OrderStatus::Created.as_str())
    .bind(new_order.price_cents)
    .bind(&new_order.currency)
    .bind(&new_order.payment_ref)
    .bind(&share_token)
    .bind(now)
    .bind(now)
    .execute(&self.pool)
    .await?;

    debug!(order_id = %id, "Order row inserted.");
    self.get(&id).await
  }

  pub async fn find(&self, id: &str) -> Result<Option<Order>> {
    let row: Option<OrderRow> = sqlx::query_as(SELECT_ORDER).bind(id).fetch_optional(&self.pool).await?;
    row.map(Order::try_from).transpose()
  }

  /// Like [`OrderStore::find`], but a missing order is `AppError::NotFound`.
  pub async fn get(&self, id: &str) -> Result<Order> {
    self
      .find(id)
      .await?
      .ok_or_else(|| AppError::NotFound(format!("Order {} not found.", id)))
  }

  /// Opens a write transaction on `id` and returns it with the current row.
  ///
  /// The first statement is a write, so the transaction holds SQLite's write lock before it
  /// reads. Competing writers wait on the busy timeout instead of failing on a stale
  /// WAL snapshot.
  async fn begin_update(&self, id: &str) -> Result<(Transaction<'static, Sqlite>, OrderRow)> {
    let mut tx = self.pool.begin().await?;
    let locked = sqlx::query("UPDATE orders SET updated_at = updated_at WHERE id = ?")
      .bind(id)
      .execute(&mut *tx)
      .await?;
    if locked.rows_affected() == 0 {
      return Err(AppError::NotFound(format!("Order {} not found.", id)));
    }

    let row: OrderRow = sqlx::query_as(SELECT_ORDER)
      .bind(id)
      .fetch_optional(&mut *tx)
      .await?
      .ok_or_else(|| AppError::NotFound(format!("Order {} not found.", id)))?;
    Ok((tx, row))
  }

  /// Stores intake data. A `None` photo keeps any previously uploaded photo.
  #[instrument(name = "order_store::record_intake", skip(self, quiz), err(Display))]
  pub async fn record_intake(&self, id: &str, photo_path: Option<&str>, quiz: &QuizAnswers) -> Result<Order> {
    let quiz_json = serde_json::to_string(quiz)?;
    let (mut tx, row) = self.begin_update(id).await?;

    sqlx::query("UPDATE orders SET photo_path = COALESCE(?, photo_path), quiz_answers = ?, updated_at = ? WHERE id = ?")
      .bind(photo_path)
      .bind(&quiz_json)
      .bind(bumped_timestamp(row.updated_at))
      .bind(id)
      .execute(&mut *tx)
      .await?;
    tx.commit().await?;

    self.get(id).await
  }

  /// Records generated artifacts and moves the order to `delivered`.
  ///
  /// Callers only pass paths that were confirmed written.
  #[instrument(name = "order_store::record_deliverables", skip(self), err(Display))]
  pub async fn record_deliverables(&self, id: &str, image_path: &str, share_path: &str, pdf_path: &str) -> Result<Order> {
    let (mut tx, row) = self.begin_update(id).await?;
    let current = OrderStatus::parse(&row.status).unwrap_or(OrderStatus::Created);
    let next = current.advance_to(OrderStatus::Delivered);

    sqlx::query(
      "UPDATE orders SET result_image_path = ?, result_share_path = ?, result_pdf_path = ?, status = ?, updated_at = ? \
       WHERE id = ?",
    )
    .bind(image_path)
    .bind(share_path)
    .bind(pdf_path)
    .bind(next.as_str())
    .bind(bumped_timestamp(row.updated_at))
    .bind(id)
    .execute(&mut *tx)
    .await?;
    tx.commit().await?;

    self.get(id).await
  }
}
