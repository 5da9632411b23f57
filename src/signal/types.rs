//! Core types for signal ingestion
//!
//! Defines the normalized signal shape consumed by the buffers and the
//! classifier, plus the raw host-event shapes the collector validates.

use crate::time::clock::Timestamp;
use serde::{Deserialize, Serialize};

/// Signal categories produced by the collector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalKind {
    /// Pointer moved
    MouseMove,
    /// Key pressed
    KeyPress,
    /// Pointer entered a tracked element
    HoverEnter,
    /// Pointer left a tracked element
    HoverLeave,
}

impl SignalKind {
    /// Check if this is a pointer-position signal
    pub fn is_pointer(&self) -> bool {
        matches!(self, SignalKind::MouseMove)
    }

    /// Check if this is a keyboard signal
    pub fn is_keyboard(&self) -> bool {
        matches!(self, SignalKind::KeyPress)
    }

    /// Check if this is a hover-boundary signal
    pub fn is_hover(&self) -> bool {
        matches!(self, SignalKind::HoverEnter | SignalKind::HoverLeave)
    }
}

/// Typed payload of a normalized signal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SignalPayload {
    /// Pointer position in viewport coordinates
    MouseMove { x: f64, y: f64 },
    /// Key name plus the focused element, when the host knows it
    KeyPress {
        key: String,
        target: Option<String>,
    },
    /// Pointer entered the element
    HoverEnter { element_id: String },
    /// Pointer left the element
    HoverLeave { element_id: String },
}

/// A normalized interaction signal.
///
/// Ephemeral: consumed into the rolling buffers or the hover registry,
/// never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    /// When the signal was observed
    pub timestamp: Timestamp,
    /// Typed payload
    pub payload: SignalPayload,
}

impl Signal {
    /// The signal's category.
    pub fn kind(&self) -> SignalKind {
        match self.payload {
            SignalPayload::MouseMove { .. } => SignalKind::MouseMove,
            SignalPayload::KeyPress { .. } => SignalKind::KeyPress,
            SignalPayload::HoverEnter { .. } => SignalKind::HoverEnter,
            SignalPayload::HoverLeave { .. } => SignalKind::HoverLeave,
        }
    }
}

/// A buffered pointer sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MousePoint {
    pub x: f64,
    pub y: f64,
    pub timestamp: Timestamp,
}

impl MousePoint {
    pub fn new(x: f64, y: f64, timestamp: Timestamp) -> Self {
        Self { x, y, timestamp }
    }

    /// Euclidean distance to another sample.
    pub fn distance_to(&self, other: &MousePoint) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// A buffered keystroke
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyStroke {
    /// Key name as reported by the host ("a", "Enter", "Backspace", ...)
    pub key: String,
    /// Focused element id, when the host supplies one
    pub target: Option<String>,
    pub timestamp: Timestamp,
}

impl KeyStroke {
    pub fn new(key: String, target: Option<String>, timestamp: Timestamp) -> Self {
        Self {
            key,
            target,
            timestamp,
        }
    }

    /// Check if this keystroke is a correction (Backspace/Delete).
    pub fn is_correction(&self) -> bool {
        matches!(self.key.as_str(), "Backspace" | "Delete")
    }

    /// Check if this keystroke submits the focused input.
    pub fn is_submit(&self) -> bool {
        self.key == "Enter"
    }
}

/// Raw host input events, pre-normalization.
///
/// Pointer events carry viewport coordinates; keyboard events carry the key
/// name and optionally the focused element; hover events carry the tracked
/// element id. Timestamps are assigned by the engine clock at collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HostEvent {
    PointerMove { x: f64, y: f64 },
    KeyDown {
        key: String,
        #[serde(default)]
        target: Option<String>,
    },
    PointerEnter { element_id: String },
    PointerLeave { element_id: String },
}
