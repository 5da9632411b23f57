//! Adaptive UI Strategy
//!
//! Pure mapping from the current load level to UI simplification directives.
//! No state, no side effects; presentation collaborators read the directives
//! and apply them.

use super::estimator::LoadLevel;
use serde::{Deserialize, Serialize};

/// UI directives for the current load level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AdaptationStrategy {
    /// Hide non-essential, advanced controls
    pub hide_advanced_features: bool,
    /// Visually emphasize the primary actions
    pub highlight_primary_actions: bool,
    /// Surface inline help hints
    pub show_help_hints: bool,
    /// Disable decorative animations
    pub reduce_animations: bool,
}

impl AdaptationStrategy {
    /// Resolve the directives for a load level.
    ///
    /// | level  | hide adv. | highlight | hints | reduce anim. |
    /// |--------|-----------|-----------|-------|--------------|
    /// | Low    | no        | no        | no    | no           |
    /// | Medium | no        | yes       | no    | no           |
    /// | High   | yes       | yes       | yes   | yes          |
    pub fn for_level(level: LoadLevel) -> Self {
        match level {
            LoadLevel::Low => Self::default(),
            LoadLevel::Medium => Self {
                highlight_primary_actions: true,
                ..Self::default()
            },
            LoadLevel::High => Self {
                hide_advanced_features: true,
                highlight_primary_actions: true,
                show_help_hints: true,
                reduce_animations: true,
            },
        }
    }
}
