//! Hover Registry & Dwell Gates
//!
//! Tracks pointer presence over elements and the 500 ms dwell gate that
//! separates transient passes from intentional hovers. Dwell deadlines are
//! explicit, cancellable entries keyed by element id; they fire when polled
//! past their deadline, or at pointer-leave if still pending. Cancellation
//! (early leave, teardown) is a first-class operation, not a side effect of
//! event ordering.

use super::buffer::SignalBuffer;
use crate::time::clock::Timestamp;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A live hover with a pending or fired dwell gate
#[derive(Debug, Clone, Copy)]
struct HoverEntry {
    /// When the pointer entered the element
    started_at: Timestamp,
    /// When the dwell gate is due
    deadline: Timestamp,
    /// Whether the gate has already fired for this hover
    fired: bool,
}

/// A completed hover, kept in the bounded hover history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoverRecord {
    pub element_id: String,
    /// Total time the pointer stayed over the element
    pub duration_ms: u64,
    /// Whether the dwell gate fired (duration reached the gate)
    pub engaged: bool,
}

/// A dwell gate firing, to be handed to the classifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DwellFire {
    pub element_id: String,
    /// Hover duration measured at fire time
    pub elapsed_ms: u64,
}

/// Result of a pointer-leave
#[derive(Debug, Clone, PartialEq)]
pub struct HoverOutcome {
    /// The completed hover record (also stored in the history)
    pub record: HoverRecord,
    /// Set when the gate was still pending at leave but the dwell had been
    /// reached; carries the total duration for classification
    pub dwell_fire: Option<u64>,
}

/// Registry of live hovers plus a bounded history of completed ones.
pub struct HoverTracker {
    entries: HashMap<String, HoverEntry>,
    history: SignalBuffer<HoverRecord>,
    dwell_ms: u64,
}

impl HoverTracker {
    pub fn new(dwell_ms: u64, history_capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            history: SignalBuffer::with_capacity(history_capacity),
            dwell_ms,
        }
    }

    /// Pointer entered `element_id`. Re-entering restarts the dwell gate.
    pub fn enter(&mut self, element_id: &str, now: Timestamp) {
        self.entries.insert(
            element_id.to_string(),
            HoverEntry {
                started_at: now,
                deadline: now.plus_millis(self.dwell_ms),
                fired: false,
            },
        );
    }

    /// Fire all gates whose deadline has passed.
    ///
    /// Elapsed time is measured at fire time, so it is always >= the dwell
    /// gate and keeps accruing between polls.
    pub fn poll_due(&mut self, now: Timestamp) -> Vec<DwellFire> {
        let mut fired = Vec::new();
        for (element_id, entry) in self.entries.iter_mut() {
            if !entry.fired && now >= entry.deadline {
                entry.fired = true;
                fired.push(DwellFire {
                    element_id: element_id.clone(),
                    elapsed_ms: now.millis_since(entry.started_at),
                });
            }
        }
        fired
    }

    /// Pointer left `element_id`.
    ///
    /// A leave before the gate cancels the gate and stores a short
    /// (`engaged = false`) record. A leave at or past the gate with the gate
    /// still pending fires it here, with the total duration. Unknown ids
    /// return `None` (fresh zero-state, never an error).
    pub fn leave(&mut self, element_id: &str, now: Timestamp) -> Option<HoverOutcome> {
        let entry = self.entries.remove(element_id)?;
        let duration_ms = now.millis_since(entry.started_at);

        let dwell_fire = if !entry.fired && now >= entry.deadline {
            Some(duration_ms)
        } else {
            None
        };
        let engaged = entry.fired || dwell_fire.is_some();

        let record = HoverRecord {
            element_id: element_id.to_string(),
            duration_ms,
            engaged,
        };
        self.history.push(record.clone());

        Some(HoverOutcome { record, dwell_fire })
    }

    /// Cancel a live hover without recording it. Returns true if one existed.
    pub fn cancel(&mut self, element_id: &str) -> bool {
        self.entries.remove(element_id).is_some()
    }

    /// Cancel every live hover. Used on teardown so no gate outlives the
    /// engine. Returns how many were cancelled.
    pub fn cancel_all(&mut self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        count
    }

    /// Number of live hovers.
    pub fn active_count(&self) -> usize {
        self.entries.len()
    }

    /// Completed-hover history, oldest first.
    pub fn history(&self) -> &SignalBuffer<HoverRecord> {
        &self.history
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }
}
