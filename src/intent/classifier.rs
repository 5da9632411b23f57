//! Intention Classification
//!
//! Two entry paths produce intentions: explicit calls from the host (a
//! submit keystroke inside an input, a navigation the host already knows
//! about) at confidence 1.0, and fired hover dwell gates on recognized
//! data-preview targets, where confidence grows linearly with dwell time and
//! saturates at the configured ceiling.

use super::types::{Intention, IntentionKind};
use crate::signal::types::KeyStroke;
use crate::time::clock::Timestamp;
use crate::{Error, Result};
use regex::RegexSet;

/// Default patterns for targets whose hover suggests a data preview
pub const DEFAULT_PREVIEW_PATTERNS: &[&str] = &[
    r"-preview$",
    r"^data-",
    r"-row$",
    r"-card$",
    r"-detail$",
];

/// Heuristic intention classifier.
pub struct IntentionClassifier {
    preview_patterns: RegexSet,
    /// Dwell duration at which confidence saturates at 1.0
    dwell_saturation_ms: u64,
}

impl IntentionClassifier {
    /// Build a classifier from pattern strings.
    ///
    /// Fails if a pattern is not a valid regex.
    pub fn new(preview_patterns: &[String], dwell_saturation_ms: u64) -> Result<Self> {
        let preview_patterns = RegexSet::new(preview_patterns)
            .map_err(|e| Error::Config(format!("invalid preview pattern: {e}")))?;
        Ok(Self {
            preview_patterns,
            dwell_saturation_ms: dwell_saturation_ms.max(1),
        })
    }

    /// Classifier with the default preview patterns and 2000 ms saturation.
    pub fn with_defaults() -> Self {
        let patterns: Vec<String> = DEFAULT_PREVIEW_PATTERNS
            .iter()
            .map(|p| p.to_string())
            .collect();
        Self::new(&patterns, 2_000).expect("default patterns are valid")
    }

    /// Check whether a target matches a recognized data-preview pattern.
    pub fn is_preview_target(&self, target: &str) -> bool {
        self.preview_patterns.is_match(target)
    }

    /// Explicit path: the host already knows the intention; confidence 1.0.
    pub fn classify_explicit(
        &self,
        kind: IntentionKind,
        target: &str,
        context: Option<serde_json::Value>,
        now: Timestamp,
    ) -> Intention {
        Intention::new(kind, target, 1.0, now, context)
    }

    /// Keystroke path: a submit key inside an input is a form submission.
    ///
    /// Other keystrokes carry no intention on their own.
    pub fn classify_keypress(&self, stroke: &KeyStroke, now: Timestamp) -> Option<Intention> {
        if !stroke.is_submit() {
            return None;
        }
        let target = stroke.target.as_deref()?;
        Some(Intention::new(
            IntentionKind::FormSubmission,
            target,
            1.0,
            now,
            None,
        ))
    }

    /// Dwell path: a fired hover gate on a data-preview target.
    ///
    /// `confidence = min(1.0, elapsed / saturation)`; at the 500 ms gate with
    /// the default 2000 ms saturation that is 0.25, rising linearly. Targets
    /// outside the preview patterns produce nothing.
    pub fn classify_dwell(
        &self,
        element_id: &str,
        elapsed_ms: u64,
        now: Timestamp,
    ) -> Option<Intention> {
        if !self.is_preview_target(element_id) {
            return None;
        }
        let confidence = (elapsed_ms as f32 / self.dwell_saturation_ms as f32).min(1.0);
        Some(Intention::new(
            IntentionKind::DataView,
            element_id,
            confidence,
            now,
            None,
        ))
    }
}
