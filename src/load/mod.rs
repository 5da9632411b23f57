//! Cognitive-load estimation and adaptive UI directives

pub mod estimator;
pub mod strategy;

pub use estimator::{CognitiveLoad, LoadEstimator, LoadIndicators, LoadLevel};
pub use strategy::AdaptationStrategy;
