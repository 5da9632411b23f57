//! # Intention Engine
//!
//! A deterministic, session-scoped heuristic engine that turns raw user
//! interaction signals (mouse movement, keystrokes, hover dwell, form
//! validation failures) into classified *intentions*, a *cognitive load*
//! estimate, and three externally visible effects: speculative data
//! preloading, adaptive UI simplification directives, and an empathic help
//! escalation after repeated form errors.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use intention_engine::{EngineConfig, IntentionEngine, SystemClock};
//! use intention_engine::preload::source::StaticPreloadSource;
//!
//! let config = EngineConfig::default();
//! let mut engine = IntentionEngine::new(
//!     config,
//!     Arc::new(SystemClock::new()),
//!     Arc::new(StaticPreloadSource::empty()),
//! ).expect("valid config");
//!
//! engine.record_mouse_movement(120.0, 340.0);
//! engine.track_hover("folha-preview");
//! // ... later, on pointer-leave ...
//! engine.leave_hover("folha-preview");
//!
//! for intention in engine.current_intentions() {
//!     println!("{} -> {:.2}", intention.target, intention.confidence);
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`time`]: engine-relative millisecond timestamps and the injectable clock
//! - [`signal`]: event normalization, rolling ring buffers, hover registry
//! - [`intent`]: intention records and the heuristic classifier
//! - [`load`]: cognitive-load estimation and the adaptive UI strategy table
//! - [`forms`]: per-form error counters gating the empathic help flow
//! - [`preload`]: TTL-bounded speculative fetch cache and its async source
//! - [`engine`]: the owned service object wiring everything together
//! - [`replay`]: offline session-trace replay and reporting
//! - [`app`]: CLI and configuration management
//!
//! ## Signal Pipeline
//!
//! ```text
//! ┌─────────────┐    ┌─────────────┐    ┌─────────────┐    ┌──────────────┐
//! │ Host events │───▶│  Collector  │───▶│Ring buffers │───▶│  Classifier  │
//! │ (DOM/trace) │    │ (normalize) │    │ + hover reg │    │ (intentions) │
//! └─────────────┘    └─────────────┘    └─────────────┘    └──────────────┘
//!                                                                 │
//!                          ┌──────────────────┬───────────────────┤
//!                          ▼                  ▼                   ▼
//!                   ┌─────────────┐    ┌─────────────┐    ┌──────────────┐
//!                   │  Preload    │    │ Cognitive   │    │  Empathic    │
//!                   │  cache      │    │ load + UI   │    │  help gate   │
//!                   └─────────────┘    └─────────────┘    └──────────────┘
//! ```
//!
//! All engine state is created on `IntentionEngine::new` and discarded on
//! `dispose`; nothing survives the session.

pub mod time;
pub mod signal;
pub mod intent;
pub mod load;
pub mod forms;
pub mod preload;
pub mod engine;
pub mod replay;
pub mod app;

// Re-export commonly used types
pub use app::config::EngineConfig;
pub use engine::service::IntentionEngine;
pub use intent::types::{Intention, IntentionKind};
pub use load::estimator::{CognitiveLoad, LoadIndicators, LoadLevel};
pub use load::strategy::AdaptationStrategy;
pub use signal::types::{Signal, SignalKind};
pub use time::clock::{Clock, ManualClock, SystemClock, Timestamp};

/// Result type alias for the intention engine
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the intention engine
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Preload fetch error: {0}")]
    Preload(String),

    #[error("Trace error: {0}")]
    Trace(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
