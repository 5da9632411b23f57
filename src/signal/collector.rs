//! Signal Collector
//!
//! The normalization boundary between the host's input event stream and the
//! engine. Malformed events (non-finite coordinates, empty key names, empty
//! element ids) are dropped here so partial state never reaches the buffers.

use super::types::{HostEvent, Signal, SignalPayload};
use crate::time::clock::Timestamp;
use tracing::debug;

/// Collector statistics
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CollectorStats {
    /// Events normalized into signals
    pub accepted: u64,
    /// Events dropped as malformed
    pub rejected: u64,
}

/// Normalizes raw host events into [`Signal`] values.
#[derive(Debug, Default)]
pub struct SignalCollector {
    stats: CollectorStats,
}

impl SignalCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalize one host event, stamping it with `now`.
    ///
    /// Returns `None` for malformed events; no state changes besides the
    /// rejection counter.
    pub fn normalize(&mut self, event: HostEvent, now: Timestamp) -> Option<Signal> {
        let payload = match event {
            HostEvent::PointerMove { x, y } => {
                if !x.is_finite() || !y.is_finite() {
                    debug!("dropping pointer event with non-finite coordinates");
                    self.stats.rejected += 1;
                    return None;
                }
                SignalPayload::MouseMove { x, y }
            }
            HostEvent::KeyDown { key, target } => {
                let key = key.trim().to_string();
                if key.is_empty() {
                    debug!("dropping keyboard event with empty key");
                    self.stats.rejected += 1;
                    return None;
                }
                // An empty target is the same as no target
                let target = target.map(|t| t.trim().to_string()).filter(|t| !t.is_empty());
                SignalPayload::KeyPress { key, target }
            }
            HostEvent::PointerEnter { element_id } => {
                let element_id = element_id.trim().to_string();
                if element_id.is_empty() {
                    debug!("dropping hover-enter with empty element id");
                    self.stats.rejected += 1;
                    return None;
                }
                SignalPayload::HoverEnter { element_id }
            }
            HostEvent::PointerLeave { element_id } => {
                let element_id = element_id.trim().to_string();
                if element_id.is_empty() {
                    debug!("dropping hover-leave with empty element id");
                    self.stats.rejected += 1;
                    return None;
                }
                SignalPayload::HoverLeave { element_id }
            }
        };

        self.stats.accepted += 1;
        Some(Signal {
            timestamp: now,
            payload,
        })
    }

    pub fn stats(&self) -> CollectorStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::types::SignalKind;

    fn ts(ms: u64) -> Timestamp {
        Timestamp::from_millis(ms)
    }

    #[test]
    fn test_normalize_pointer_move() {
        let mut collector = SignalCollector::new();
        let signal = collector
            .normalize(HostEvent::PointerMove { x: 10.0, y: 20.0 }, ts(5))
            .expect("valid pointer event");

        assert_eq!(signal.kind(), SignalKind::MouseMove);
        assert_eq!(signal.timestamp, ts(5));
        assert_eq!(collector.stats().accepted, 1);
    }

    #[test]
    fn test_rejects_non_finite_coordinates() {
        let mut collector = SignalCollector::new();
        assert!(collector
            .normalize(HostEvent::PointerMove { x: f64::NAN, y: 0.0 }, ts(0))
            .is_none());
        assert!(collector
            .normalize(
                HostEvent::PointerMove {
                    x: 0.0,
                    y: f64::INFINITY
                },
                ts(0)
            )
            .is_none());
        assert_eq!(collector.stats().rejected, 2);
        assert_eq!(collector.stats().accepted, 0);
    }

    #[test]
    fn test_rejects_empty_key() {
        let mut collector = SignalCollector::new();
        assert!(collector
            .normalize(
                HostEvent::KeyDown {
                    key: "   ".to_string(),
                    target: None
                },
                ts(0)
            )
            .is_none());
        assert_eq!(collector.stats().rejected, 1);
    }

    #[test]
    fn test_empty_target_becomes_none() {
        let mut collector = SignalCollector::new();
        let signal = collector
            .normalize(
                HostEvent::KeyDown {
                    key: "Enter".to_string(),
                    target: Some("".to_string()),
                },
                ts(0),
            )
            .expect("valid key event");

        match signal.payload {
            SignalPayload::KeyPress { ref key, ref target } => {
                assert_eq!(key, "Enter");
                assert!(target.is_none());
            }
            _ => panic!("Expected KeyPress payload"),
        }
    }

    #[test]
    fn test_rejects_empty_element_id() {
        let mut collector = SignalCollector::new();
        assert!(collector
            .normalize(
                HostEvent::PointerEnter {
                    element_id: "".to_string()
                },
                ts(0)
            )
            .is_none());
        assert!(collector
            .normalize(
                HostEvent::PointerLeave {
                    element_id: " ".to_string()
                },
                ts(0)
            )
            .is_none());
        assert_eq!(collector.stats().rejected, 2);
    }

    #[test]
    fn test_hover_ids_are_trimmed() {
        let mut collector = SignalCollector::new();
        let signal = collector
            .normalize(
                HostEvent::PointerEnter {
                    element_id: " folha-preview ".to_string(),
                },
                ts(0),
            )
            .expect("valid hover event");

        match signal.payload {
            SignalPayload::HoverEnter { ref element_id } => {
                assert_eq!(element_id, "folha-preview");
            }
            _ => panic!("Expected HoverEnter payload"),
        }
    }
}
