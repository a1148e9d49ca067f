// core/tests/pipeline_execution_tests.rs
mod common;

use common::*;
use sketchflow::{ContextData, FlowError, Pipeline, PipelineControl, PipelineResult};
use serial_test::serial;
use std::sync::Arc;

fn fulfillment_pipeline() -> Pipeline<FulfillmentCtx, TestError> {
  let defs: Vec<(&str, bool, Option<sketchflow::SkipCondition<FulfillmentCtx>>)> =
    FULFILLMENT_STEPS.iter().map(|name| (*name, false, None)).collect();
  Pipeline::new(&defs)
}

#[tokio::test]
#[serial]
async fn steps_run_in_declared_order() {
  setup_tracing();
  let mut pipeline = fulfillment_pipeline();
  pipeline.on_step("validation", recording_handler("validation", ""));
  pipeline.on_step("text_generation", recording_handler("text_generation", "profile.txt"));
  pipeline.on_step("image_generation", recording_handler("image_generation", "portrait.png"));
  pipeline.on_step("pdf_generation", recording_handler("pdf_generation", "report.pdf"));
  pipeline.on_step("email_delivery", recording_handler("email_delivery", ""));

  let ctx = ContextData::new(FulfillmentCtx::default());
  let result = pipeline.run(ctx.clone()).await;

  assert_eq!(result, Ok(PipelineResult::Completed));
  let guard = ctx.read();
  assert_eq!(guard.steps_executed, FULFILLMENT_STEPS.to_vec());
  assert_eq!(guard.artifacts, vec!["profile.txt", "portrait.png", "report.pdf"]);
}

#[tokio::test]
#[serial]
async fn stop_halts_remaining_steps() {
  setup_tracing();
  let mut pipeline = fulfillment_pipeline();
  for step in FULFILLMENT_STEPS {
    pipeline.on_step(step, recording_handler(step, ""));
  }

  let ctx = ContextData::new(FulfillmentCtx {
    stop_at: Some("image_generation".to_string()),
    ..Default::default()
  });
  let result = pipeline.run(ctx.clone()).await;

  assert_eq!(result, Ok(PipelineResult::Stopped));
  assert_eq!(
    ctx.read().steps_executed,
    vec!["validation", "text_generation", "image_generation"]
  );
}

#[tokio::test]
#[serial]
async fn handler_error_is_returned_unchanged() {
  setup_tracing();
  let mut pipeline = fulfillment_pipeline();
  pipeline.on_step("validation", recording_handler("validation", ""));
  pipeline.on_step("text_generation", recording_handler("text_generation", ""));
  pipeline.on_step("image_generation", recording_handler("image_generation", ""));
  pipeline.on_step("pdf_generation", failing_handler("pdf_generation", "disk full"));
  pipeline.on_step("email_delivery", recording_handler("email_delivery", ""));

  let ctx = ContextData::new(FulfillmentCtx::default());
  let result = pipeline.run(ctx.clone()).await;

  assert_eq!(result, Err(TestError::Step("disk full".to_string())));
  assert!(!ctx.read().steps_executed.contains(&"email_delivery".to_string()));
}

#[tokio::test]
#[serial]
async fn skip_condition_skips_only_that_step() {
  setup_tracing();
  let mut pipeline = fulfillment_pipeline();
  for step in FULFILLMENT_STEPS {
    pipeline.on_step(step, recording_handler(step, ""));
  }
  pipeline
    .set_skip_condition(
      "email_delivery",
      Some(Arc::new(|ctx: ContextData<FulfillmentCtx>| ctx.read().skip_email)),
    )
    .unwrap();

  let ctx = ContextData::new(FulfillmentCtx {
    skip_email: true,
    ..Default::default()
  });
  assert_eq!(pipeline.run(ctx.clone()).await, Ok(PipelineResult::Completed));
  assert_eq!(ctx.read().steps_executed.len(), 4);
  assert!(!ctx.read().steps_executed.contains(&"email_delivery".to_string()));
}

#[tokio::test]
#[serial]
async fn required_step_without_handlers_fails() {
  setup_tracing();
  let mut pipeline = Pipeline::<FulfillmentCtx, TestError>::new(&[("validation", false, None), ("orphan", false, None)]);
  pipeline.on_step("validation", recording_handler("validation", ""));

  let result = pipeline.run(ContextData::new(FulfillmentCtx::default())).await;
  match result {
    Err(TestError::Flow(msg)) => {
      assert!(msg.contains("HandlerMissing"));
      assert!(msg.contains("orphan"));
    }
    other => panic!("expected HandlerMissing, got {:?}", other),
  }
}

#[tokio::test]
#[serial]
async fn optional_step_without_handlers_is_skipped() {
  setup_tracing();
  let mut pipeline =
    Pipeline::<FulfillmentCtx, TestError>::new(&[("validation", false, None), ("share_links", true, None)]);
  pipeline.on_step("validation", recording_handler("validation", ""));

  let ctx = ContextData::new(FulfillmentCtx::default());
  assert_eq!(pipeline.run(ctx.clone()).await, Ok(PipelineResult::Completed));
  assert_eq!(ctx.read().steps_executed, vec!["validation"]);
}

#[tokio::test]
#[serial]
async fn before_on_after_run_in_order() {
  setup_tracing();
  let mut pipeline = Pipeline::<FulfillmentCtx, TestError>::new(&[("pdf_generation", false, None)]);
  pipeline.after_step("pdf_generation", recording_handler("after", ""));
  pipeline.on_step("pdf_generation", recording_handler("on", ""));
  pipeline.before_step("pdf_generation", recording_handler("before", ""));

  let ctx = ContextData::new(FulfillmentCtx::default());
  pipeline.run(ctx.clone()).await.unwrap();
  assert_eq!(ctx.read().steps_executed, vec!["before", "on", "after"]);
}

#[tokio::test]
#[serial]
async fn handlers_may_return_flow_error_directly() {
  setup_tracing();
  let mut pipeline = Pipeline::<FulfillmentCtx, TestError>::new(&[("validation", false, None)]);
  pipeline.on_step("validation", |_ctx: ContextData<FulfillmentCtx>| async move {
    Err::<PipelineControl, FlowError>(FlowError::Internal("bad context".to_string()))
  });

  let result = pipeline.run(ContextData::new(FulfillmentCtx::default())).await;
  assert!(matches!(result, Err(TestError::Flow(msg)) if msg.contains("bad context")));
}

#[tokio::test]
#[serial]
async fn steps_can_be_inserted_and_removed() {
  setup_tracing();
  let mut pipeline = fulfillment_pipeline();
  pipeline
    .insert_after_step("pdf_generation", "watermark", false, None)
    .unwrap();
  pipeline.insert_before_step("validation", "load_order", true, None).unwrap();
  pipeline.remove_step("email_delivery");

  assert_eq!(
    pipeline.step_names(),
    vec![
      "load_order",
      "validation",
      "text_generation",
      "image_generation",
      "pdf_generation",
      "watermark"
    ]
  );
  assert!(matches!(
    pipeline.set_optional("email_delivery", true),
    Err(FlowError::StepNotFound { .. })
  ));
}

#[tokio::test]
#[serial]
async fn context_is_shared_between_steps() {
  setup_tracing();
  let mut pipeline =
    Pipeline::<FulfillmentCtx, TestError>::new(&[("validation", false, None), ("text_generation", false, None)]);
  pipeline.on_step("validation", |ctx: ContextData<FulfillmentCtx>| async move {
    ctx.update(|data| data.order_id = "order-42".to_string());
    Ok::<_, TestError>(PipelineControl::Continue)
  });
  pipeline.on_step("text_generation", |ctx: ContextData<FulfillmentCtx>| async move {
    let order_id = ctx.with(|data| data.order_id.clone());
    tokio::time::sleep(std::time::Duration::from_millis(1)).await;
    ctx.write().artifacts.push(format!("{order_id}.txt"));
    Ok::<_, TestError>(PipelineControl::Continue)
  });

  let ctx = ContextData::new(FulfillmentCtx::default());
  pipeline.run(ctx.clone()).await.unwrap();
  assert_eq!(ctx.snapshot().artifacts, vec!["order-42.txt"]);
}
