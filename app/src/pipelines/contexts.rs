// app/src/pipelines/contexts.rs

//! Context data for the deliverables pipeline.
//! Handlers receive it wrapped in `sketchflow::ContextData`.

use crate::models::{Order, QuizAnswers};
use crate::services::mailer::DeliveryReceipt;
use crate::services::portrait::PortraitOutput;
use crate::services::profile_text::ProfileText;
use crate::state::AppState;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use sketchflow::{StepEvent, StepPhase};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize)]
pub struct AuditEntry {
  pub step: String,
  pub status: &'static str,
  pub at: DateTime<Utc>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub error: Option<String>,
}

/// Step-by-step record of one generation run. Persisted whether or not the run succeeds.
#[derive(Debug, Clone, Serialize)]
pub struct AuditLog {
  pub order_id: String,
  pub started_at: DateTime<Utc>,
  pub finished_at: Option<DateTime<Utc>>,
  pub steps: Vec<AuditEntry>,
  pub success: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub error: Option<String>,
  /// Which generators produced the artifacts (`model`, `fallback`, `placeholder`, `logged`, ...).
  pub sources: Value,
}

impl AuditLog {
  pub fn new(order_id: &str) -> Self {
    Self {
      order_id: order_id.to_string(),
      started_at: Utc::now(),
      finished_at: None,
      steps: Vec::new(),
      success: false,
      error: None,
      sources: json!({}),
    }
  }

  pub fn record(&mut self, step: &str, status: &'static str, error: Option<String>) {
    self.steps.push(AuditEntry {
      step: step.to_string(),
      status,
      at: Utc::now(),
      error,
    });
  }

  pub fn record_event(&mut self, event: &StepEvent) {
    self.record(&event.step, event.phase.as_str(), event.error.clone());
  }

  pub fn note_source(&mut self, key: &str, value: &str) {
    if let Value::Object(map) = &mut self.sources {
      map.insert(key.to_string(), Value::String(value.to_string()));
    }
  }

  pub fn succeed(&mut self) {
    self.record("done", StepPhase::Completed.as_str(), None);
    self.success = true;
    self.finished_at = Some(Utc::now());
  }

  pub fn fail(&mut self, message: String) {
    self.success = false;
    self.error = Some(message);
    self.finished_at = Some(Utc::now());
  }
}

#[derive(Clone)]
pub struct DeliverablesCtxData {
  pub app_state: AppState,
  pub order: Order,
  pub quiz: QuizAnswers,
  pub audit: AuditLog,
  pub profile: Option<ProfileText>,
  pub portrait: Option<PortraitOutput>,
  pub pdf_path: Option<PathBuf>,
  pub delivery: Option<DeliveryReceipt>,
}

impl DeliverablesCtxData {
  pub fn new(app_state: AppState, order: Order, quiz: QuizAnswers) -> Self {
    let audit = AuditLog::new(&order.id);
    Self {
      app_state,
      order,
      quiz,
      audit,
      profile: None,
      portrait: None,
      pdf_path: None,
      delivery: None,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn audit_log_records_events_and_outcome() {
    let mut audit = AuditLog::new("order-1");
    audit.record_event(&StepEvent {
      step: "validation".to_string(),
      index: 0,
      phase: StepPhase::Started,
      error: None,
    });
    audit.note_source("text", "fallback");
    audit.fail("boom".to_string());

    let value = serde_json::to_value(&audit).unwrap();
    assert_eq!(value["order_id"], "order-1");
    assert_eq!(value["steps"][0]["status"], "started");
    assert_eq!(value["sources"]["text"], "fallback");
    assert_eq!(value["success"], false);
    assert_eq!(value["error"], "boom");
  }
}
