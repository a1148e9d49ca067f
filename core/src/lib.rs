// core/src/lib.rs

//! sketchflow: the async step pipeline behind Soulsketch order fulfillment.
//!
//! A pipeline is an ordered list of named steps operating on one shared,
//! lockable context. It provides:
//!  - before/on/after handlers per step, all asynchronous.
//!  - Early stopping via [`PipelineControl::Stop`].
//!  - Per-step `skip_if` predicates and optional steps.
//!  - Step listeners that observe every transition (used for audit trails).
//!  - A type-keyed registry so callers can run a pipeline by its context type.

pub mod core;
pub mod error;
pub mod pipeline;
pub mod registry;

pub use crate::core::context::Handler;
pub use crate::core::context_data::ContextData;
pub use crate::core::control::{PipelineControl, PipelineResult};
pub use crate::core::step::{SkipCondition, StepDef};

pub use crate::pipeline::definition::Pipeline;
pub use crate::pipeline::listener::{StepEvent, StepListener, StepPhase};

pub use crate::error::{FlowError, FlowResult};

pub use crate::registry::FlowRegistry;
