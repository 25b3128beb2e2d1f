pub mod classify;
pub mod engine;
pub mod metrics;

pub use engine::EvaluationEngine;
