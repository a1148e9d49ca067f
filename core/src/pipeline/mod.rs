pub mod definition;
pub mod execution;
pub mod hooks;
pub mod listener;

pub use definition::Pipeline;
pub use listener::{StepEvent, StepListener, StepPhase};
