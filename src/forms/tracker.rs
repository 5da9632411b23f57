//! Empathic Error Tracking
//!
//! Per-form validation-failure counters. Repeated failures on the same form
//! open the empathic help gate; a successful validation closes it again.
//! Forms are independent of one another, and unknown form ids read as fresh
//! zero-state.

use crate::time::clock::Timestamp;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Consecutive errors at which the help gate opens
pub const DEFAULT_HELP_THRESHOLD: u32 = 3;

/// Error state for a single form
#[derive(Debug, Clone, PartialEq)]
struct ErrorCounter {
    count: u32,
    last_error_at: Timestamp,
    last_error_type: String,
}

/// Context handed to the host's help dialog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HelpContext {
    pub form_id: String,
    pub error_count: u32,
    /// The most recent error type, if any errors were recorded
    pub last_error_type: Option<String>,
}

/// Tracks validation failures per form.
pub struct FormErrorTracker {
    counters: HashMap<String, ErrorCounter>,
    help_threshold: u32,
}

impl FormErrorTracker {
    pub fn new(help_threshold: u32) -> Self {
        Self {
            counters: HashMap::new(),
            help_threshold: help_threshold.max(1),
        }
    }

    /// Record a validation failure. Returns the new error count.
    pub fn record_error(&mut self, form_id: &str, error_type: &str, now: Timestamp) -> u32 {
        let counter = self
            .counters
            .entry(form_id.to_string())
            .or_insert(ErrorCounter {
                count: 0,
                last_error_at: now,
                last_error_type: error_type.to_string(),
            });
        counter.count += 1;
        counter.last_error_at = now;
        counter.last_error_type = error_type.to_string();
        counter.count
    }

    /// Record a successful validation, resetting the form's counter to 0.
    pub fn record_success(&mut self, form_id: &str) {
        self.counters.remove(form_id);
    }

    /// True once the form has accumulated `help_threshold` errors.
    pub fn should_show_help(&self, form_id: &str) -> bool {
        self.error_count(form_id) >= self.help_threshold
    }

    /// Current error count for a form (0 for unknown ids).
    pub fn error_count(&self, form_id: &str) -> u32 {
        self.counters.get(form_id).map(|c| c.count).unwrap_or(0)
    }

    /// Sum of active (unreset) errors across all forms. Feeds the load
    /// estimator's error-frequency indicator.
    pub fn total_active_errors(&self) -> u32 {
        self.counters.values().map(|c| c.count).sum()
    }

    /// Context for the host help dialog. Unknown ids yield zero-state.
    pub fn help_context(&self, form_id: &str) -> HelpContext {
        match self.counters.get(form_id) {
            Some(counter) => HelpContext {
                form_id: form_id.to_string(),
                error_count: counter.count,
                last_error_type: Some(counter.last_error_type.clone()),
            },
            None => HelpContext {
                form_id: form_id.to_string(),
                error_count: 0,
                last_error_type: None,
            },
        }
    }

    /// Forms whose help gate is currently open, sorted for stable output.
    pub fn forms_needing_help(&self) -> Vec<String> {
        let mut forms: Vec<String> = self
            .counters
            .iter()
            .filter(|(_, c)| c.count >= self.help_threshold)
            .map(|(id, _)| id.clone())
            .collect();
        forms.sort();
        forms
    }

    /// Drop all counters.
    pub fn clear(&mut self) {
        self.counters.clear();
    }
}

impl Default for FormErrorTracker {
    fn default() -> Self {
        Self::new(DEFAULT_HELP_THRESHOLD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(ms: u64) -> Timestamp {
        Timestamp::from_millis(ms)
    }

    #[test]
    fn test_help_gate_opens_on_third_error() {
        let mut tracker = FormErrorTracker::default();

        assert!(!tracker.should_show_help("demo_form"));
        tracker.record_error("demo_form", "email", ts(100));
        assert!(!tracker.should_show_help("demo_form"));
        tracker.record_error("demo_form", "email", ts(200));
        assert!(!tracker.should_show_help("demo_form"));
        tracker.record_error("demo_form", "email", ts(300));
        assert!(tracker.should_show_help("demo_form"));
    }

    #[test]
    fn test_gate_stays_open_past_threshold() {
        let mut tracker = FormErrorTracker::default();
        for i in 0..5 {
            tracker.record_error("f", "required", ts(i * 100));
        }
        assert!(tracker.should_show_help("f"));
        assert_eq!(tracker.error_count("f"), 5);
    }

    #[test]
    fn test_success_resets_counter() {
        let mut tracker = FormErrorTracker::default();
        for i in 0..3 {
            tracker.record_error("demo_form", "email", ts(i * 100));
        }
        assert!(tracker.should_show_help("demo_form"));

        tracker.record_success("demo_form");
        assert!(!tracker.should_show_help("demo_form"));
        assert_eq!(tracker.error_count("demo_form"), 0);
    }

    #[test]
    fn test_forms_are_independent() {
        let mut tracker = FormErrorTracker::default();
        for i in 0..3 {
            tracker.record_error("checkout", "cpf", ts(i * 100));
        }
        tracker.record_error("login", "password", ts(400));

        assert!(tracker.should_show_help("checkout"));
        assert!(!tracker.should_show_help("login"));

        tracker.record_success("checkout");
        assert_eq!(tracker.error_count("login"), 1);
    }

    #[test]
    fn test_unknown_form_reads_zero_state() {
        let tracker = FormErrorTracker::default();
        assert_eq!(tracker.error_count("ghost"), 0);
        assert!(!tracker.should_show_help("ghost"));

        let context = tracker.help_context("ghost");
        assert_eq!(context.error_count, 0);
        assert!(context.last_error_type.is_none());
    }

    #[test]
    fn test_success_on_unknown_form_is_noop() {
        let mut tracker = FormErrorTracker::default();
        tracker.record_success("never-seen");
        assert_eq!(tracker.total_active_errors(), 0);
    }

    #[test]
    fn test_total_active_errors() {
        let mut tracker = FormErrorTracker::default();
        tracker.record_error("a", "x", ts(0));
        tracker.record_error("a", "x", ts(10));
        tracker.record_error("b", "y", ts(20));
        assert_eq!(tracker.total_active_errors(), 3);

        tracker.record_success("a");
        assert_eq!(tracker.total_active_errors(), 1);
    }

    #[test]
    fn test_forms_needing_help_is_sorted() {
        let mut tracker = FormErrorTracker::default();
        for form in ["zeta", "alpha"] {
            for i in 0..3 {
                tracker.record_error(form, "required", ts(i * 10));
            }
        }
        tracker.record_error("mid", "required", ts(100));

        assert_eq!(
            tracker.forms_needing_help(),
            vec!["alpha".to_string(), "zeta".to_string()]
        );
    }

    #[test]
    fn test_help_context_carries_latest_error_type() {
        let mut tracker = FormErrorTracker::default();
        tracker.record_error("demo_form", "email", ts(0));
        tracker.record_error("demo_form", "cpf", ts(100));

        let context = tracker.help_context("demo_form");
        assert_eq!(context.error_count, 2);
        assert_eq!(context.last_error_type.as_deref(), Some("cpf"));
    }
}
