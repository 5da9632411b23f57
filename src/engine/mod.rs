//! The owned engine service object

pub mod service;

pub use service::IntentionEngine;
