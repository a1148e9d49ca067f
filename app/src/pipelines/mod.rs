// app/src/pipelines/mod.rs

//! Defines and registers the sketchflow pipelines used by the application.

use crate::errors::AppError;
use sketchflow::FlowRegistry;

pub mod contexts;
pub mod deliverables_pipeline;

/// Registers every pipeline with `flows`. Called once at startup.
pub fn register_all_pipelines(flows: &FlowRegistry<AppError>) {
  tracing::info!("Registering pipelines...");
  deliverables_pipeline::register_deliverables_pipeline(flows);
  tracing::info!("All application pipelines registered.");
}
