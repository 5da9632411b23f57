//! Offline session-trace replay

pub mod trace;

pub use trace::{replay_trace, SessionReport, TraceAction, TraceEvent};
