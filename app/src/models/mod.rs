// app/src/models/mod.rs

//! Order record, catalogue enums and the structured quiz.

pub mod catalog;
pub mod order;
pub mod quiz;

pub use catalog::{Addon, AddonSet, Tier};
pub use order::{Order, OrderRow, OrderStatus};
pub use quiz::QuizAnswers;
