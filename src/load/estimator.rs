//! Cognitive Load Estimation
//!
//! Combines four weighted indicators into a load level driving UI
//! adaptation. The indicators are heuristic but deterministic: mouse
//! hesitation from slow/erratic pointer segments, error frequency from the
//! form-error tracker, navigation churn from recent intention volume, and
//! typing stress from keystroke interval variance plus correction keys.
//! The level is a pure function of the indicator vector.

use crate::signal::types::{KeyStroke, MousePoint};
use crate::time::clock::Timestamp;
use serde::{Deserialize, Serialize};

/// Indicator weights: hesitation, errors, navigation churn, typing stress
const W_MOUSE: f32 = 0.25;
const W_ERROR: f32 = 0.35;
const W_NAV: f32 = 0.15;
const W_TYPING: f32 = 0.25;

/// Band boundaries for the weighted score
const LOW_BAND: f32 = 0.33;
const MEDIUM_BAND: f32 = 0.66;

/// Overall load level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoadLevel {
    Low,
    Medium,
    High,
}

/// The four normalized load indicators, each in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LoadIndicators {
    pub mouse_hesitation: f32,
    pub error_frequency: f32,
    pub navigation_patterns: f32,
    pub typing_stress: f32,
}

impl LoadIndicators {
    /// Clamp every indicator into [0, 1].
    pub fn clamped(self) -> Self {
        Self {
            mouse_hesitation: self.mouse_hesitation.clamp(0.0, 1.0),
            error_frequency: self.error_frequency.clamp(0.0, 1.0),
            navigation_patterns: self.navigation_patterns.clamp(0.0, 1.0),
            typing_stress: self.typing_stress.clamp(0.0, 1.0),
        }
    }

    /// Weighted score in [0, 1].
    pub fn score(&self) -> f32 {
        W_MOUSE * self.mouse_hesitation
            + W_ERROR * self.error_frequency
            + W_NAV * self.navigation_patterns
            + W_TYPING * self.typing_stress
    }
}

/// Derived load state. Never mutated directly; always recomputed from the
/// indicators.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CognitiveLoad {
    pub level: LoadLevel,
    pub indicators: LoadIndicators,
    pub adaptation_required: bool,
}

impl CognitiveLoad {
    /// Pure derivation: identical indicator vectors always yield identical
    /// levels.
    pub fn from_indicators(indicators: LoadIndicators) -> Self {
        let indicators = indicators.clamped();
        let score = indicators.score();
        let level = if score < LOW_BAND {
            LoadLevel::Low
        } else if score < MEDIUM_BAND {
            LoadLevel::Medium
        } else {
            LoadLevel::High
        };
        Self {
            level,
            indicators,
            adaptation_required: level != LoadLevel::Low,
        }
    }
}

impl Default for CognitiveLoad {
    fn default() -> Self {
        Self::from_indicators(LoadIndicators::default())
    }
}

/// Computes indicators from recent buffer state.
pub struct LoadEstimator {
    /// Lookback window for mouse samples (ms)
    pub mouse_window_ms: u64,
    /// Lookback window for keystrokes (ms)
    pub typing_window_ms: u64,
    /// Lookback window for intention churn (ms)
    pub nav_window_ms: u64,
    /// Pointer velocity below this (px/ms) counts as hesitant
    pub slow_velocity_px_per_ms: f64,
    /// Form errors at which error_frequency saturates
    pub error_saturation: u32,
    /// Intentions per window at which navigation_patterns saturates
    pub nav_saturation: usize,
    /// Keystroke-interval coefficient of variation mapping to full stress
    pub interval_cv_ceiling: f64,
}

impl LoadEstimator {
    pub fn new() -> Self {
        Self {
            mouse_window_ms: 3_000,
            typing_window_ms: 5_000,
            nav_window_ms: 10_000,
            slow_velocity_px_per_ms: 0.05,
            error_saturation: 5,
            nav_saturation: 8,
            interval_cv_ceiling: 1.5,
        }
    }

    /// Mouse hesitation: fraction of slow segments combined with the
    /// sharp-turn rate over samples in the lookback window.
    pub fn mouse_hesitation<'a>(
        &self,
        samples: impl Iterator<Item = &'a MousePoint>,
        now: Timestamp,
    ) -> f32 {
        let cutoff = Timestamp::from_millis(now.as_millis().saturating_sub(self.mouse_window_ms));
        let recent: Vec<&MousePoint> = samples.filter(|p| p.timestamp >= cutoff).collect();
        if recent.len() < 3 {
            return 0.0;
        }

        let mut slow = 0usize;
        let mut segments = 0usize;
        for pair in recent.windows(2) {
            let dt = pair[1].timestamp.millis_since(pair[0].timestamp);
            if dt == 0 {
                continue;
            }
            let velocity = pair[0].distance_to(pair[1]) / dt as f64;
            segments += 1;
            if velocity < self.slow_velocity_px_per_ms {
                slow += 1;
            }
        }
        if segments == 0 {
            return 0.0;
        }
        let slow_frac = slow as f64 / segments as f64;

        // Sharp turns: angle between consecutive segment vectors, normalized
        // by pi; > 0.25 (45 degrees) counts as a direction change.
        let mut sharp = 0usize;
        let mut vertices = 0usize;
        for triple in recent.windows(3) {
            let v1 = (triple[1].x - triple[0].x, triple[1].y - triple[0].y);
            let v2 = (triple[2].x - triple[1].x, triple[2].y - triple[1].y);
            let mag1 = (v1.0 * v1.0 + v1.1 * v1.1).sqrt();
            let mag2 = (v2.0 * v2.0 + v2.1 * v2.1).sqrt();
            if mag1 < 1e-3 || mag2 < 1e-3 {
                continue;
            }
            let dot = v1.0 * v2.0 + v1.1 * v2.1;
            let cross = v1.0 * v2.1 - v1.1 * v2.0;
            let angle = cross.atan2(dot).abs() / std::f64::consts::PI;
            vertices += 1;
            if angle > 0.25 {
                sharp += 1;
            }
        }
        let sharp_frac = if vertices > 0 {
            sharp as f64 / vertices as f64
        } else {
            0.0
        };

        (0.6 * slow_frac + 0.4 * sharp_frac).clamp(0.0, 1.0) as f32
    }

    /// Typing stress: inter-key interval coefficient of variation combined
    /// with the correction-key ratio over the lookback window.
    pub fn typing_stress<'a>(
        &self,
        strokes: impl Iterator<Item = &'a KeyStroke>,
        now: Timestamp,
    ) -> f32 {
        let cutoff = Timestamp::from_millis(now.as_millis().saturating_sub(self.typing_window_ms));
        let recent: Vec<&KeyStroke> = strokes.filter(|k| k.timestamp >= cutoff).collect();
        if recent.is_empty() {
            return 0.0;
        }

        let corrections = recent.iter().filter(|k| k.is_correction()).count();
        let correction_ratio = corrections as f64 / recent.len() as f64;

        let intervals: Vec<f64> = recent
            .windows(2)
            .map(|pair| pair[1].timestamp.millis_since(pair[0].timestamp) as f64)
            .collect();
        let cv_norm = if intervals.len() >= 2 {
            let mean = intervals.iter().sum::<f64>() / intervals.len() as f64;
            if mean > 0.0 {
                let variance = intervals.iter().map(|i| (i - mean).powi(2)).sum::<f64>()
                    / intervals.len() as f64;
                (variance.sqrt() / mean / self.interval_cv_ceiling).min(1.0)
            } else {
                0.0
            }
        } else {
            0.0
        };

        (0.6 * cv_norm + 0.4 * correction_ratio).clamp(0.0, 1.0) as f32
    }

    /// Error frequency: active form errors, saturating at the configured
    /// count.
    pub fn error_frequency(&self, active_errors: u32) -> f32 {
        if self.error_saturation == 0 {
            return 0.0;
        }
        (active_errors as f32 / self.error_saturation as f32).min(1.0)
    }

    /// Navigation churn: intentions created inside the lookback window,
    /// saturating at the configured count.
    pub fn navigation_patterns(&self, recent_intentions: usize) -> f32 {
        if self.nav_saturation == 0 {
            return 0.0;
        }
        (recent_intentions as f32 / self.nav_saturation as f32).min(1.0)
    }
}

impl Default for LoadEstimator {
    fn default() -> Self {
        Self::new()
    }
}
