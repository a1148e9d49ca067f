// core/src/pipeline/execution.rs

//! `Pipeline::run()`: walks the steps in order and drives each phase's handlers.

use crate::core::context::Handler;
use crate::core::context_data::ContextData;
use crate::core::control::{PipelineControl, PipelineResult};
use crate::error::FlowError;
use crate::pipeline::definition::Pipeline;
use crate::pipeline::listener::{StepEvent, StepPhase};
use tracing::{event, instrument, span, Level};

/// Result of driving one phase (before/on/after) of a step.
enum PhaseOutcome {
  Continue,
  Stopped,
}

impl<TData, Err> Pipeline<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  fn notify(&self, ctx_data: &ContextData<TData>, step: &str, index: usize, phase: StepPhase, error: Option<String>) {
    if self.listeners.is_empty() {
      return;
    }
    let step_event = StepEvent {
      step: step.to_string(),
      index,
      phase,
      error,
    };
    for listener in &self.listeners {
      listener(&step_event, ctx_data);
    }
  }

  async fn run_phase(
    phase_name: &'static str,
    handlers: Option<&Vec<Handler<TData, Err>>>,
    ctx_data: &ContextData<TData>,
  ) -> Result<PhaseOutcome, Err> {
    let Some(handlers) = handlers else {
      return Ok(PhaseOutcome::Continue);
    };
    for (handler_idx, handler_fn) in handlers.iter().enumerate() {
      event!(Level::TRACE, phase = phase_name, handler_index = handler_idx, "Executing handler.");
      match handler_fn(ctx_data.clone()).await {
        Ok(PipelineControl::Continue) => {}
        Ok(PipelineControl::Stop) => {
          event!(Level::INFO, phase = phase_name, "Pipeline stopped by a handler.");
          return Ok(PhaseOutcome::Stopped);
        }
        Err(e) => {
          event!(Level::ERROR, phase = phase_name, error = %e, "Handler failed.");
          return Err(e);
        }
      }
    }
    Ok(PhaseOutcome::Continue)
  }

  /// Executes every step in order against `ctx_data`.
  ///
  /// Each step runs its `before`, `on` and `after` handlers in that order. The first
  /// handler error aborts the run and is returned unchanged; a `Stop` ends the run with
  /// [`PipelineResult::Stopped`]. Listeners see `Started` and then exactly one of
  /// `Completed`, `Stopped` or `Failed` for every step that was entered, or `Skipped`.
  #[instrument(
    name = "Pipeline::run",
    skip_all,
    fields(
      pipeline_context_data_type = %std::any::type_name::<TData>(),
      num_steps = self.steps.len(),
    ),
    err(Display)
  )]
  pub async fn run(&self, ctx_data: ContextData<TData>) -> Result<PipelineResult, Err> {
    event!(Level::DEBUG, "Pipeline execution starting.");

    for (step_idx, step_def) in self.steps.iter().enumerate() {
      let step_name = step_def.name.as_str();
      let step_span = span!(
        Level::INFO,
        "pipeline_step",
        step_name = step_name,
        step_index = step_idx,
        optional = step_def.optional
      );

      if let Some(skip_cond_fn) = &step_def.skip_if {
        if skip_cond_fn(ctx_data.clone()) {
          step_span.in_scope(|| event!(Level::INFO, "Step skipped by its skip_if condition."));
          self.notify(&ctx_data, step_name, step_idx, StepPhase::Skipped, None);
          continue;
        }
      }

      let before = self.before.get(step_name).filter(|v| !v.is_empty());
      let on = self.on.get(step_name).filter(|v| !v.is_empty());
      let after = self.after.get(step_name).filter(|v| !v.is_empty());

      if before.is_none() && on.is_none() && after.is_none() {
        if step_def.optional {
          step_span.in_scope(|| event!(Level::DEBUG, "Optional step has no handlers, skipping."));
          self.notify(&ctx_data, step_name, step_idx, StepPhase::Skipped, None);
          continue;
        }
        step_span.in_scope(|| event!(Level::ERROR, "Non-optional step has no handlers."));
        let missing = FlowError::HandlerMissing {
          step_name: step_def.name.clone(),
        };
        self.notify(&ctx_data, step_name, step_idx, StepPhase::Failed, Some(missing.to_string()));
        return Err(Err::from(missing));
      }

      self.notify(&ctx_data, step_name, step_idx, StepPhase::Started, None);

      let mut outcome = Ok(PhaseOutcome::Continue);
      for (phase_name, handlers) in [("before", before), ("on", on), ("after", after)] {
        outcome = Self::run_phase(phase_name, handlers, &ctx_data).await;
        if !matches!(outcome, Ok(PhaseOutcome::Continue)) {
          break;
        }
      }

      match outcome {
        Ok(PhaseOutcome::Continue) => {
          self.notify(&ctx_data, step_name, step_idx, StepPhase::Completed, None);
          step_span.in_scope(|| event!(Level::DEBUG, "Step finished."));
        }
        Ok(PhaseOutcome::Stopped) => {
          self.notify(&ctx_data, step_name, step_idx, StepPhase::Stopped, None);
          return Ok(PipelineResult::Stopped);
        }
        Err(e) => {
          self.notify(&ctx_data, step_name, step_idx, StepPhase::Failed, Some(e.to_string()));
          return Err(e);
        }
      }
    }

    event!(Level::DEBUG, "Pipeline execution completed.");
    Ok(PipelineResult::Completed)
  }
}
