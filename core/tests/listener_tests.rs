// core/tests/listener_tests.rs
mod common;

use common::*;
use parking_lot::Mutex;
use sketchflow::{ContextData, Pipeline, StepEvent, StepPhase};
use serial_test::serial;
use std::sync::Arc;

fn collecting_pipeline(events: Arc<Mutex<Vec<(String, StepPhase, Option<String>)>>>) -> Pipeline<FulfillmentCtx, TestError> {
  let mut pipeline = Pipeline::<FulfillmentCtx, TestError>::new(&[
    ("validation", false, None),
    ("text_generation", false, None),
    ("email_delivery", false, None),
  ]);
  pipeline.add_listener(move |event: &StepEvent, _ctx: &ContextData<FulfillmentCtx>| {
    events.lock().push((event.step.clone(), event.phase, event.error.clone()));
  });
  pipeline
}

#[tokio::test]
#[serial]
async fn listener_sees_start_and_completion_of_every_step() {
  setup_tracing();
  let events = Arc::new(Mutex::new(Vec::new()));
  let mut pipeline = collecting_pipeline(events.clone());
  pipeline.on_step("validation", recording_handler("validation", ""));
  pipeline.on_step("text_generation", recording_handler("text_generation", ""));
  pipeline.on_step("email_delivery", recording_handler("email_delivery", ""));

  pipeline.run(ContextData::new(FulfillmentCtx::default())).await.unwrap();

  let phases: Vec<(String, StepPhase)> = events.lock().iter().map(|(s, p, _)| (s.clone(), *p)).collect();
  assert_eq!(
    phases,
    vec![
      ("validation".to_string(), StepPhase::Started),
      ("validation".to_string(), StepPhase::Completed),
      ("text_generation".to_string(), StepPhase::Started),
      ("text_generation".to_string(), StepPhase::Completed),
      ("email_delivery".to_string(), StepPhase::Started),
      ("email_delivery".to_string(), StepPhase::Completed),
    ]
  );
}

#[tokio::test]
#[serial]
async fn listener_records_failure_message_and_nothing_after_it() {
  setup_tracing();
  let events = Arc::new(Mutex::new(Vec::new()));
  let mut pipeline = collecting_pipeline(events.clone());
  pipeline.on_step("validation", recording_handler("validation", ""));
  pipeline.on_step("text_generation", failing_handler("text_generation", "quota exceeded"));
  pipeline.on_step("email_delivery", recording_handler("email_delivery", ""));

  assert!(pipeline.run(ContextData::new(FulfillmentCtx::default())).await.is_err());

  let recorded = events.lock().clone();
  assert_eq!(recorded.len(), 4);
  let (step, phase, error) = &recorded[3];
  assert_eq!(step, "text_generation");
  assert_eq!(*phase, StepPhase::Failed);
  assert!(error.as_deref().unwrap_or_default().contains("quota exceeded"));
  assert!(recorded.iter().all(|(s, _, _)| s != "email_delivery"));
}

#[tokio::test]
#[serial]
async fn listener_can_write_into_the_context() {
  setup_tracing();
  let mut pipeline = Pipeline::<FulfillmentCtx, TestError>::new(&[("validation", false, None)]);
  pipeline.on_step("validation", recording_handler("validation", ""));
  pipeline.add_listener(|event: &StepEvent, ctx: &ContextData<FulfillmentCtx>| {
    ctx.write().artifacts.push(format!("{}:{}", event.step, event.phase.as_str()));
  });

  let ctx = ContextData::new(FulfillmentCtx::default());
  pipeline.run(ctx.clone()).await.unwrap();
  assert_eq!(ctx.read().artifacts, vec!["validation:started", "validation:completed"]);
}
