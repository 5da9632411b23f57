//! Signal ingestion: normalization, rolling buffers, hover registry

pub mod buffer;
pub mod collector;
pub mod hover;
pub mod types;

pub use buffer::{BufferStats, SignalBuffer};
pub use collector::{CollectorStats, SignalCollector};
pub use hover::{DwellFire, HoverOutcome, HoverRecord, HoverTracker};
pub use types::{HostEvent, KeyStroke, MousePoint, Signal, SignalKind, SignalPayload};
