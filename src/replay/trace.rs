//! Session Traces & Reports
//!
//! A trace is a JSONL stream of timestamped interaction events captured from
//! a live session. Replaying one drives the engine through a manual clock
//! and yields a `SessionReport`: the intentions the engine classified, the
//! final load estimate and UI directives, and the speculative-fetch outcome.
//! Replay is deterministic: identical traces yield identical reports (modulo
//! generated ids).

use crate::engine::service::IntentionEngine;
use crate::intent::types::Intention;
use crate::load::estimator::CognitiveLoad;
use crate::load::strategy::AdaptationStrategy;
use crate::time::clock::ManualClock;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::BufRead;
use std::path::Path;
use tracing::warn;
use uuid::Uuid;

/// Current trace format version
pub const TRACE_FORMAT_VERSION: &str = "1.0";

/// One recorded interaction event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceEvent {
    /// Session-relative time of the event (ms)
    pub at_ms: u64,
    #[serde(flatten)]
    pub action: TraceAction,
}

/// The recorded action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum TraceAction {
    MouseMove { x: f64, y: f64 },
    KeyPress {
        key: String,
        #[serde(default)]
        target: Option<String>,
    },
    HoverEnter { element_id: String },
    HoverLeave { element_id: String },
    FormError { form_id: String, error_type: String },
    FormSuccess { form_id: String },
    /// Host-supplied next-target predictions for speculative preload
    Predictions { targets: HashMap<String, f64> },
    /// Explicit cooperative timer poll
    Tick,
}

/// Outcome of replaying a trace through the engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReport {
    /// Unique report id
    pub session_id: Uuid,
    /// Wall-clock time the report was produced
    pub generated_at: DateTime<Utc>,
    /// Trace format version
    pub format_version: String,
    /// Events fed into the engine
    pub events_replayed: usize,
    /// Malformed trace lines skipped during parsing
    pub events_skipped: usize,
    /// Session span covered by the trace (ms)
    pub duration_ms: u64,
    /// Intentions classified during the session, oldest first
    pub intentions: Vec<Intention>,
    /// Final load estimate
    pub cognitive_load: CognitiveLoad,
    /// UI directives for the final load level
    pub strategy: AdaptationStrategy,
    /// Keys with a live preload entry at session end
    pub preloaded_keys: Vec<String>,
    /// Forms whose empathic help gate ended open
    pub forms_needing_help: Vec<String>,
    /// Collector accept counter
    pub signals_accepted: u64,
    /// Collector reject counter
    pub signals_rejected: u64,
}

impl SessionReport {
    /// Save the report as pretty JSON.
    pub fn save(&self, path: &Path) -> crate::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// Parse a JSONL trace. Scattered malformed lines are skipped with a
/// warning, not surfaced as errors; the skip count is returned alongside the
/// events. A non-empty input with no parseable event at all is an error.
pub fn parse_trace(reader: impl BufRead) -> crate::Result<(Vec<TraceEvent>, usize)> {
    let mut events = Vec::new();
    let mut skipped = 0usize;

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        match serde_json::from_str::<TraceEvent>(trimmed) {
            Ok(event) => events.push(event),
            Err(e) => {
                warn!("trace line {}: skipping malformed event: {e}", line_no + 1);
                skipped += 1;
            }
        }
    }

    if events.is_empty() && skipped > 0 {
        return Err(crate::Error::Trace(format!(
            "no parseable events ({skipped} malformed lines)"
        )));
    }

    Ok((events, skipped))
}

/// Parse a trace file from disk.
pub fn load_trace(path: &Path) -> crate::Result<(Vec<TraceEvent>, usize)> {
    let file = std::fs::File::open(path)?;
    parse_trace(std::io::BufReader::new(file))
}

/// Replay parsed events through an engine driven by `clock`.
///
/// The clock must be the one injected into the engine. Trace timestamps move
/// it forward (never backward); preload predictions are awaited inline so
/// their completions land in issue order.
pub async fn replay_trace(
    engine: &mut IntentionEngine,
    clock: &ManualClock,
    events: &[TraceEvent],
    events_skipped: usize,
) -> SessionReport {
    for event in events {
        clock.set(event.at_ms);
        match &event.action {
            TraceAction::MouseMove { x, y } => engine.record_mouse_movement(*x, *y),
            TraceAction::KeyPress { key, target } => {
                engine.record_keypress(key, target.as_deref())
            }
            TraceAction::HoverEnter { element_id } => engine.track_hover(element_id),
            TraceAction::HoverLeave { element_id } => engine.leave_hover(element_id),
            TraceAction::FormError {
                form_id,
                error_type,
            } => engine.record_form_error(form_id, error_type),
            TraceAction::FormSuccess { form_id } => engine.record_form_success(form_id),
            TraceAction::Predictions { targets } => {
                engine.preload_high_probability_targets(targets).await;
            }
            TraceAction::Tick => engine.tick(),
        }
    }
    // Final poll so gates due at the last timestamp fire
    engine.tick();

    let duration_ms = events.last().map(|e| e.at_ms).unwrap_or(0);
    SessionReport {
        session_id: Uuid::new_v4(),
        generated_at: Utc::now(),
        format_version: TRACE_FORMAT_VERSION.to_string(),
        events_replayed: events.len(),
        events_skipped,
        duration_ms,
        intentions: engine.current_intentions(),
        cognitive_load: engine.cognitive_load(),
        strategy: engine.adaptation_strategy(),
        preloaded_keys: engine.preloaded_keys(),
        forms_needing_help: engine.forms_needing_help(),
        signals_accepted: engine.collector_stats().accepted,
        signals_rejected: engine.collector_stats().rejected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::config::EngineConfig;
    use crate::preload::source::StaticPreloadSource;
    use std::io::Cursor;
    use std::sync::Arc;

    fn make_engine() -> (IntentionEngine, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let engine = IntentionEngine::new(
            EngineConfig::default(),
            clock.clone(),
            Arc::new(StaticPreloadSource::empty()),
        )
        .expect("default config");
        (engine, clock)
    }

    #[test]
    fn test_parse_trace_lines() {
        let input = concat!(
            r#"{"at_ms":0,"action":"hover_enter","element_id":"folha-preview"}"#,
            "\n",
            r#"{"at_ms":600,"action":"hover_leave","element_id":"folha-preview"}"#,
            "\n",
        );
        let (events, skipped) = parse_trace(Cursor::new(input)).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(skipped, 0);
        assert_eq!(
            events[0].action,
            TraceAction::HoverEnter {
                element_id: "folha-preview".to_string()
            }
        );
    }

    #[test]
    fn test_parse_skips_malformed_lines() {
        let input = concat!(
            r#"{"at_ms":0,"action":"tick"}"#,
            "\n",
            "not json at all\n",
            r#"{"at_ms":5,"action":"unknown_action"}"#,
            "\n",
            "\n",
            r#"{"at_ms":10,"action":"mouse_move","x":1.0,"y":2.0}"#,
            "\n",
        );
        let (events, skipped) = parse_trace(Cursor::new(input)).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(skipped, 2);
    }

    #[test]
    fn test_parse_entirely_malformed_trace_is_error() {
        let input = "garbage\nmore garbage\n";
        let result = parse_trace(Cursor::new(input));
        assert!(matches!(result, Err(crate::Error::Trace(_))));
    }

    #[test]
    fn test_parse_empty_trace_is_ok() {
        let (events, skipped) = parse_trace(Cursor::new("")).unwrap();
        assert!(events.is_empty());
        assert_eq!(skipped, 0);
    }

    #[test]
    fn test_trace_event_roundtrip() {
        let event = TraceEvent {
            at_ms: 120,
            action: TraceAction::KeyPress {
                key: "Enter".to_string(),
                target: Some("demo_form".to_string()),
            },
        };
        let json = serde_json::to_string(&event).unwrap();
        let back: TraceEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }

    #[tokio::test]
    async fn test_replay_hover_scenario() {
        let (mut engine, clock) = make_engine();
        let events = vec![
            TraceEvent {
                at_ms: 0,
                action: TraceAction::HoverEnter {
                    element_id: "folha-preview".to_string(),
                },
            },
            TraceEvent {
                at_ms: 600,
                action: TraceAction::HoverLeave {
                    element_id: "folha-preview".to_string(),
                },
            },
        ];

        let report = replay_trace(&mut engine, &clock, &events, 0).await;
        assert_eq!(report.events_replayed, 2);
        assert_eq!(report.duration_ms, 600);
        assert_eq!(report.intentions.len(), 1);
        assert!((report.intentions[0].confidence - 0.30).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_replay_preload_predictions() {
        let (mut engine, clock) = make_engine();
        let mut targets = HashMap::new();
        targets.insert("payroll_data".to_string(), 0.95);
        targets.insert("ignored".to_string(), 0.9);

        let events = vec![TraceEvent {
            at_ms: 100,
            action: TraceAction::Predictions { targets },
        }];

        let report = replay_trace(&mut engine, &clock, &events, 0).await;
        assert_eq!(report.preloaded_keys, vec!["payroll_data".to_string()]);
    }

    #[tokio::test]
    async fn test_replay_form_errors_open_help_gate() {
        let (mut engine, clock) = make_engine();
        let events: Vec<TraceEvent> = (0..3)
            .map(|i| TraceEvent {
                at_ms: i * 100,
                action: TraceAction::FormError {
                    form_id: "demo_form".to_string(),
                    error_type: "email".to_string(),
                },
            })
            .collect();

        let report = replay_trace(&mut engine, &clock, &events, 0).await;
        assert_eq!(report.forms_needing_help, vec!["demo_form".to_string()]);
    }

    #[tokio::test]
    async fn test_replay_is_deterministic() {
        let events = vec![
            TraceEvent {
                at_ms: 0,
                action: TraceAction::HoverEnter {
                    element_id: "data-grid".to_string(),
                },
            },
            TraceEvent {
                at_ms: 800,
                action: TraceAction::HoverLeave {
                    element_id: "data-grid".to_string(),
                },
            },
            TraceEvent {
                at_ms: 900,
                action: TraceAction::FormError {
                    form_id: "f".to_string(),
                    error_type: "required".to_string(),
                },
            },
        ];

        let (mut a, clock_a) = make_engine();
        let (mut b, clock_b) = make_engine();
        let report_a = replay_trace(&mut a, &clock_a, &events, 0).await;
        let report_b = replay_trace(&mut b, &clock_b, &events, 0).await;

        assert_eq!(report_a.cognitive_load, report_b.cognitive_load);
        assert_eq!(report_a.strategy, report_b.strategy);
        assert_eq!(report_a.intentions.len(), report_b.intentions.len());
        for (x, y) in report_a.intentions.iter().zip(report_b.intentions.iter()) {
            assert_eq!(x.kind, y.kind);
            assert_eq!(x.target, y.target);
            assert_eq!(x.confidence, y.confidence);
            assert_eq!(x.timestamp, y.timestamp);
        }
    }

    #[tokio::test]
    async fn test_report_save() {
        let (mut engine, clock) = make_engine();
        let report = replay_trace(&mut engine, &clock, &[], 0).await;

        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("report.json");
        report.save(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let parsed: SessionReport = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed.events_replayed, 0);
        assert_eq!(parsed.format_version, TRACE_FORMAT_VERSION);
    }
}
