//! Intention records and the heuristic classifier

pub mod classifier;
pub mod types;

pub use classifier::IntentionClassifier;
pub use types::{Intention, IntentionKind, IntentionLog};
