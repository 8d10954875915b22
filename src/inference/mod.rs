//! Model evaluation and persisted-model verification

pub mod evaluator;

pub use evaluator::{evaluate, Evaluation};
