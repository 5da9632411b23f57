//! Intention Records
//!
//! An intention is a classified, timestamped hypothesis about what the user
//! is about to do, with a confidence score in [0, 1]. Intentions are created
//! only by the classifier and are immutable once created; the engine keeps
//! them in a capped log that evicts oldest-first.

use crate::time::clock::Timestamp;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use uuid::Uuid;

/// Closed set of intention categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IntentionKind {
    /// User is about to navigate elsewhere
    Navigation,
    /// User is about to trigger an action (button, menu)
    Action,
    /// User wants to inspect data (preview, detail view)
    DataView,
    /// User is about to submit a form
    FormSubmission,
}

impl IntentionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntentionKind::Navigation => "navigation",
            IntentionKind::Action => "action",
            IntentionKind::DataView => "data_view",
            IntentionKind::FormSubmission => "form_submission",
        }
    }
}

/// A classified user intention
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intention {
    /// Unique intention id
    pub id: Uuid,
    pub kind: IntentionKind,
    /// Element id or semantic tag the intention is aimed at
    pub target: String,
    /// Confidence in [0, 1]
    pub confidence: f32,
    pub timestamp: Timestamp,
    /// Free-form context supplied by the caller or the classifier
    pub context: Option<serde_json::Value>,
}

impl Intention {
    /// Create a new intention. Confidence is clamped to [0, 1].
    pub fn new(
        kind: IntentionKind,
        target: impl Into<String>,
        confidence: f32,
        timestamp: Timestamp,
        context: Option<serde_json::Value>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            target: target.into(),
            confidence: confidence.clamp(0.0, 1.0),
            timestamp,
            context,
        }
    }

    /// Human-readable description.
    pub fn describe(&self) -> String {
        format!(
            "{} '{}' ({:.2})",
            self.kind.as_str(),
            self.target,
            self.confidence
        )
    }
}

/// Capped intention history, oldest evicted beyond the cap.
pub struct IntentionLog {
    entries: VecDeque<Intention>,
    cap: usize,
}

impl IntentionLog {
    /// Create a log holding at most `cap` intentions.
    ///
    /// # Panics
    /// Panics if `cap` is 0.
    pub fn with_cap(cap: usize) -> Self {
        assert!(cap > 0, "Intention log cap must be > 0");
        Self {
            entries: VecDeque::with_capacity(cap),
            cap,
        }
    }

    /// Append an intention, evicting the oldest if at the cap.
    pub fn push(&mut self, intention: Intention) {
        if self.entries.len() == self.cap {
            self.entries.pop_front();
        }
        self.entries.push_back(intention);
    }

    /// Intentions created at or after `since`, oldest first.
    pub fn count_since(&self, since: Timestamp) -> usize {
        // Entries are in arrival order; scan from the newest end.
        self.entries
            .iter()
            .rev()
            .take_while(|i| i.timestamp >= since)
            .count()
    }

    /// Snapshot of the current log, oldest first.
    pub fn snapshot(&self) -> Vec<Intention> {
        self.entries.iter().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Intention> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
