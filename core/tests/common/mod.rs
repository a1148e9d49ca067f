// core/tests/common/mod.rs
#![allow(dead_code)]

use once_cell::sync::Lazy;
use sketchflow::{ContextData, FlowError, PipelineControl};
use tracing::Level;

/// Stand-in for an order being fulfilled: each step appends its name.
#[derive(Clone, Debug, Default)]
pub struct FulfillmentCtx {
  pub order_id: String,
  pub steps_executed: Vec<String>,
  pub artifacts: Vec<String>,
  pub stop_at: Option<String>,
  pub skip_email: bool,
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum TestError {
  #[error("flow error: {0}")]
  Flow(String),

  #[error("step failed: {0}")]
  Step(String),
}

impl From<FlowError> for TestError {
  fn from(fe: FlowError) -> Self {
    TestError::Flow(format!("{:?}", fe))
  }
}

/// Handler that records `step_name` and an artifact, honouring `stop_at`.
pub fn recording_handler(
  step_name: &'static str,
  artifact: &'static str,
) -> impl Fn(
  ContextData<FulfillmentCtx>,
) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<PipelineControl, TestError>> + Send>>
     + Send
     + Sync
     + 'static {
  move |ctx: ContextData<FulfillmentCtx>| {
    Box::pin(async move {
      let mut guard = ctx.write();
      guard.steps_executed.push(step_name.to_string());
      if !artifact.is_empty() {
        guard.artifacts.push(artifact.to_string());
      }
      tracing::debug!(target: "test_handlers", step = step_name, "executed");
      if guard.stop_at.as_deref() == Some(step_name) {
        return Ok(PipelineControl::Stop);
      }
      Ok(PipelineControl::Continue)
    })
  }
}

pub fn failing_handler(
  step_name: &'static str,
  message: &'static str,
) -> impl Fn(
  ContextData<FulfillmentCtx>,
) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<PipelineControl, TestError>> + Send>>
     + Send
     + Sync
     + 'static {
  move |ctx: ContextData<FulfillmentCtx>| {
    Box::pin(async move {
      ctx.write().steps_executed.push(step_name.to_string());
      Err(TestError::Step(message.to_string()))
    })
  }
}

static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

pub const FULFILLMENT_STEPS: [&str; 5] = [
  "validation",
  "text_generation",
  "image_generation",
  "pdf_generation",
  "email_delivery",
];
