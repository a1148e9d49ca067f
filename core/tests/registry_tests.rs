// core/tests/registry_tests.rs
mod common;

use common::*;
use sketchflow::{ContextData, FlowError, FlowRegistry, Pipeline, PipelineControl, PipelineResult};

#[derive(Clone, Debug, Default)]
struct IntakeCtx {
  photo_saved: bool,
}

#[tokio::test]
async fn registry_dispatches_by_context_type() {
  setup_tracing();
  let registry = FlowRegistry::<TestError>::new();

  let mut intake = Pipeline::<IntakeCtx, TestError>::new(&[("store_photo", false, None)]);
  intake.on_step("store_photo", |ctx: ContextData<IntakeCtx>| async move {
    ctx.write().photo_saved = true;
    Ok::<_, FlowError>(PipelineControl::Continue)
  });
  registry.register_pipeline(intake);

  let mut fulfillment = Pipeline::<FulfillmentCtx, TestError>::new(&[("validation", false, None)]);
  fulfillment.on_step("validation", recording_handler("validation", ""));
  registry.register_pipeline(fulfillment);

  let intake_ctx = ContextData::new(IntakeCtx::default());
  assert_eq!(registry.run(intake_ctx.clone()).await, Ok(PipelineResult::Completed));
  assert!(intake_ctx.read().photo_saved);

  let fulfillment_ctx = ContextData::new(FulfillmentCtx::default());
  assert_eq!(registry.run(fulfillment_ctx.clone()).await, Ok(PipelineResult::Completed));
  assert_eq!(fulfillment_ctx.read().steps_executed, vec!["validation"]);

  assert!(registry.is_registered::<IntakeCtx>());
  assert_eq!(registry.steps_of::<FulfillmentCtx>(), Some(vec!["validation".to_string()]));
}

#[tokio::test]
async fn unregistered_context_type_is_an_error() {
  setup_tracing();
  let registry = FlowRegistry::<TestError>::new();

  let result = registry.run(ContextData::new(IntakeCtx::default())).await;
  match result {
    Err(TestError::Flow(msg)) => {
      assert!(msg.contains("PipelineNotRegistered"));
      assert!(msg.contains("IntakeCtx"));
    }
    other => panic!("expected PipelineNotRegistered, got {:?}", other),
  }
}

#[tokio::test]
async fn pipeline_errors_pass_through_the_registry() {
  setup_tracing();
  let registry = FlowRegistry::<TestError>::new();
  let mut pipeline = Pipeline::<FulfillmentCtx, TestError>::new(&[("email_delivery", false, None)]);
  pipeline.on_step("email_delivery", failing_handler("email_delivery", "smtp refused"));
  registry.register_pipeline(pipeline);

  let result = registry.run(ContextData::new(FulfillmentCtx::default())).await;
  assert_eq!(result, Err(TestError::Step("smtp refused".to_string())));
}

#[tokio::test]
async fn registry_with_flow_error_as_application_error() {
  setup_tracing();
  let registry: FlowRegistry = FlowRegistry::default();

  let mut pipeline = Pipeline::<IntakeCtx, FlowError>::new(&[("store_photo", false, None)]);
  pipeline.on_step("store_photo", |_ctx: ContextData<IntakeCtx>| async move {
    Err::<PipelineControl, _>(FlowError::Internal("upload dir missing".to_string()))
  });
  registry.register_pipeline(pipeline);

  match registry.run(ContextData::new(IntakeCtx::default())).await {
    Err(FlowError::Internal(msg)) => assert_eq!(msg, "upload dir missing"),
    other => panic!("expected FlowError::Internal, got {:?}", other),
  }
}
