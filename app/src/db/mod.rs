// app/src/db/mod.rs

pub mod order_store;

pub use order_store::{NewOrder, OrderStore};
