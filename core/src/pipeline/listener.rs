// core/src/pipeline/listener.rs

//! Step listeners: synchronous observers notified of every step transition.

use crate::core::context_data::ContextData;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepPhase {
  Started,
  Completed,
  Skipped,
  /// A handler of this step returned `PipelineControl::Stop`.
  Stopped,
  Failed,
}

impl StepPhase {
  pub fn as_str(&self) -> &'static str {
    match self {
      StepPhase::Started => "started",
      StepPhase::Completed => "completed",
      StepPhase::Skipped => "skipped",
      StepPhase::Stopped => "stopped",
      StepPhase::Failed => "failed",
    }
  }
}

#[derive(Debug, Clone)]
pub struct StepEvent {
  pub step: String,
  pub index: usize,
  pub phase: StepPhase,
  /// Display form of the error, only set for [`StepPhase::Failed`].
  pub error: Option<String>,
}

/// Called inline by the executor with no context lock held, so a listener may
/// lock the context itself. Listeners must not block for long.
pub type StepListener<TData> = Arc<dyn Fn(&StepEvent, &ContextData<TData>) + Send + Sync + 'static>;
