//! Utility modules: error types, logging, and evaluation metrics.

pub mod error;
pub mod logging;
pub mod metrics;
