// app/src/services/payment.rs
use crate::errors::{AppError, Result as AppResult};
use crate::models::Tier;
use async_trait::async_trait;
use std::collections::HashMap;
use std::str::FromStr;
use tracing::{info, instrument};
use uuid::Uuid;

pub const CURRENCY: &str = "usd";

/// Price in cents. Unknown tiers are charged the basic price.
pub fn price_for_tier(tier: &str) -> i64 {
  price_for(Tier::parse_or_basic(Some(tier)))
}

pub fn price_for(tier: Tier) -> i64 {
  match tier {
    Tier::Basic => 1999,
    Tier::Plus => 2999,
    Tier::Deluxe => 4999,
  }
}

#[derive(Debug, Clone)]
pub struct PaymentTransaction {
  pub id: String,
  pub status: String,
  pub amount: i64,
  pub currency: String,
}

#[derive(Debug, Clone)]
pub struct RefundReceipt {
  pub id: String,
  pub status: String,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
  fn mode(&self) -> &'static str;

  async fn create_transaction(
    &self,
    amount: i64,
    currency: &str,
    metadata: HashMap<String, String>,
  ) -> AppResult<PaymentTransaction>;

  async fn refund_transaction(&self, transaction_id: &str) -> AppResult<RefundReceipt>;
}

/// Used when no provider secret is configured. Every call succeeds.
#[derive(Debug, Default)]
pub struct SimulatedPayments;

#[async_trait]
impl PaymentGateway for SimulatedPayments {
  fn mode(&self) -> &'static str {
    "simulated"
  }

  #[instrument(name = "payments::simulated_create", skip(self, metadata))]
  async fn create_transaction(
    &self,
    amount: i64,
    currency: &str,
    metadata: HashMap<String, String>,
  ) -> AppResult<PaymentTransaction> {
    let id = format!("sim_pi_{}", Uuid::new_v4());
    info!(transaction_id = %id, metadata_keys = metadata.len(), "Simulated payment succeeded.");
    Ok(PaymentTransaction {
      id,
      status: "succeeded".to_string(),
      amount,
      currency: currency.to_string(),
    })
  }

  async fn refund_transaction(&self, transaction_id: &str) -> AppResult<RefundReceipt> {
    let id = format!("sim_re_{}", Uuid::new_v4());
    info!(transaction_id, refund_id = %id, "Simulated refund succeeded.");
    Ok(RefundReceipt {
      id,
      status: "succeeded".to_string(),
    })
  }
}

pub struct StripePayments {
  client: stripe::Client,
}

impl StripePayments {
  pub fn new(secret_key: &str) -> Self {
    Self {
      client: stripe::Client::new(secret_key),
    }
  }
}

fn provider_error(err: stripe::StripeError) -> AppError {
  AppError::Payment(format!("Stripe request failed: {}", err))
}

#[async_trait]
impl PaymentGateway for StripePayments {
  fn mode(&self) -> &'static str {
    "stripe"
  }

  #[instrument(name = "payments::stripe_create", skip(self, metadata), err(Display))]
  async fn create_transaction(
    &self,
    amount: i64,
    currency: &str,
    metadata: HashMap<String, String>,
  ) -> AppResult<PaymentTransaction> {
    let stripe_currency = stripe::Currency::from_str(currency)
      .map_err(|_| AppError::Payment(format!("Unsupported currency '{}'", currency)))?;

    let mut params = stripe::CreatePaymentIntent::new(amount, stripe_currency);
    params.metadata = Some(metadata);

    let intent = stripe::PaymentIntent::create(&self.client, params)
      .await
      .map_err(provider_error)?;
    info!(transaction_id = %intent.id, "Stripe payment intent created.");

    Ok(PaymentTransaction {
      id: intent.id.to_string(),
      status: intent.status.as_str().to_string(),
      amount: intent.amount,
      currency: currency.to_string(),
    })
  }

  #[instrument(name = "payments::stripe_refund", skip(self), err(Display))]
  async fn refund_transaction(&self, transaction_id: &str) -> AppResult<RefundReceipt> {
    let intent_id = stripe::PaymentIntentId::from_str(transaction_id)
      .map_err(|e| AppError::Payment(format!("Invalid transaction id '{}': {}", transaction_id, e)))?;

    let mut params = stripe::CreateRefund::new();
    params.payment_intent = Some(intent_id);

    let refund = stripe::Refund::create(&self.client, params)
      .await
      .map_err(provider_error)?;

    Ok(RefundReceipt {
      id: refund.id.to_string(),
      status: refund.status.unwrap_or_else(|| "pending".to_string()),
    })
  }
}

/// Stripe when a secret key is configured, otherwise the simulated gateway.
pub fn gateway_from_config(stripe_secret_key: Option<&str>) -> Box<dyn PaymentGateway> {
  match stripe_secret_key {
    Some(key) => Box::new(StripePayments::new(key)),
    None => Box::new(SimulatedPayments),
  }
}
