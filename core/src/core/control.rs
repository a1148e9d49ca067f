// core/src/core/control.rs

/// Returned by every handler: keep going, or halt the whole pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineControl {
  Continue,
  /// Stop immediately. Remaining handlers of the step and all later steps are skipped.
  Stop,
}

/// Outcome of a pipeline run that did not error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineResult {
  Completed,
  /// A handler returned [`PipelineControl::Stop`].
  Stopped,
}
