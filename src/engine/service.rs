//! Engine Service
//!
//! `IntentionEngine` owns all session state and exposes the API consumed by
//! presentation collaborators. Mutation is synchronous and single-threaded:
//! every recording call runs inside the host's event loop. The one
//! asynchronous operation is the preload fetch, whose continuation re-enters
//! the shared cache through an `Arc` and is dropped if the engine was
//! disposed in the meantime.
//!
//! Dwell gates are fired cooperatively: every recording call (and the public
//! `tick`) polls the hover registry for due deadlines before mutating state,
//! and a pointer-leave fires a still-pending gate itself. The engine never
//! raises fatal errors; malformed input degrades to "no state change".

use crate::app::config::EngineConfig;
use crate::forms::tracker::{FormErrorTracker, HelpContext};
use crate::intent::classifier::IntentionClassifier;
use crate::intent::types::{Intention, IntentionKind, IntentionLog};
use crate::load::estimator::{CognitiveLoad, LoadEstimator, LoadIndicators};
use crate::load::strategy::AdaptationStrategy;
use crate::preload::cache::PreloadCache;
use crate::preload::source::PreloadSource;
use crate::signal::buffer::{BufferStats, SignalBuffer};
use crate::signal::collector::{CollectorStats, SignalCollector};
use crate::signal::hover::HoverTracker;
use crate::signal::types::{HostEvent, KeyStroke, MousePoint, SignalPayload};
use crate::time::clock::{Clock, Timestamp};
use crate::Result;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// The interaction-intention engine service.
///
/// Created on mount, discarded on unmount; see [`IntentionEngine::dispose`].
pub struct IntentionEngine {
    clock: Arc<dyn Clock>,
    collector: SignalCollector,
    mouse: SignalBuffer<MousePoint>,
    typing: SignalBuffer<KeyStroke>,
    hover: HoverTracker,
    classifier: IntentionClassifier,
    estimator: LoadEstimator,
    intentions: IntentionLog,
    load: CognitiveLoad,
    forms: FormErrorTracker,
    cache: Arc<PreloadCache>,
    source: Arc<dyn PreloadSource>,
    preload_threshold: f64,
    disposed: Arc<AtomicBool>,
}

impl IntentionEngine {
    /// Build an engine from a validated config, an injected clock, and the
    /// preload data collaborator.
    pub fn new(
        config: EngineConfig,
        clock: Arc<dyn Clock>,
        source: Arc<dyn PreloadSource>,
    ) -> Result<Self> {
        config.validate()?;

        let classifier =
            IntentionClassifier::new(&config.patterns.preview, config.hover.saturation_ms)?;
        let estimator = LoadEstimator {
            mouse_window_ms: config.load.mouse_window_ms,
            typing_window_ms: config.load.typing_window_ms,
            nav_window_ms: config.load.nav_window_ms,
            slow_velocity_px_per_ms: config.load.slow_velocity_px_per_ms,
            error_saturation: config.load.error_saturation,
            nav_saturation: config.load.nav_saturation,
            interval_cv_ceiling: config.load.interval_cv_ceiling,
        };

        Ok(Self {
            clock,
            collector: SignalCollector::new(),
            mouse: SignalBuffer::with_capacity(config.buffers.mouse_capacity),
            typing: SignalBuffer::with_capacity(config.buffers.typing_capacity),
            hover: HoverTracker::new(config.hover.dwell_ms, config.buffers.hover_history_capacity),
            classifier,
            estimator,
            intentions: IntentionLog::with_cap(config.buffers.intention_cap),
            load: CognitiveLoad::default(),
            forms: FormErrorTracker::new(config.forms.help_threshold),
            cache: Arc::new(PreloadCache::new(config.preload.ttl_ms)),
            source,
            preload_threshold: config.preload.confidence_threshold,
            disposed: Arc::new(AtomicBool::new(false)),
        })
    }

    // ------------------------------------------------------------------
    // Signal recording
    // ------------------------------------------------------------------

    /// Record a pointer position sample.
    pub fn record_mouse_movement(&mut self, x: f64, y: f64) {
        if self.is_disposed() {
            return;
        }
        self.fire_due_gates();

        let now = self.clock.now();
        let Some(signal) = self
            .collector
            .normalize(HostEvent::PointerMove { x, y }, now)
        else {
            return;
        };
        if let SignalPayload::MouseMove { x, y } = signal.payload {
            self.mouse.push(MousePoint::new(x, y, now));
        }
        self.update_load();
    }

    /// Record a keystroke. `target` is the focused element id, when the host
    /// knows it; a submit key inside an input yields a `FormSubmission`
    /// intention at confidence 1.0.
    pub fn record_keypress(&mut self, key: &str, target: Option<&str>) {
        if self.is_disposed() {
            return;
        }
        self.fire_due_gates();

        let now = self.clock.now();
        let Some(signal) = self.collector.normalize(
            HostEvent::KeyDown {
                key: key.to_string(),
                target: target.map(|t| t.to_string()),
            },
            now,
        ) else {
            return;
        };
        if let SignalPayload::KeyPress { key, target } = signal.payload {
            let stroke = KeyStroke::new(key, target, now);
            if let Some(intention) = self.classifier.classify_keypress(&stroke, now) {
                debug!("intention: {}", intention.describe());
                self.intentions.push(intention);
            }
            self.typing.push(stroke);
        }
        self.update_load();
    }

    /// Pointer entered a tracked element; arms the dwell gate.
    pub fn track_hover(&mut self, element_id: &str) {
        if self.is_disposed() {
            return;
        }
        self.fire_due_gates();

        let now = self.clock.now();
        let Some(signal) = self.collector.normalize(
            HostEvent::PointerEnter {
                element_id: element_id.to_string(),
            },
            now,
        ) else {
            return;
        };
        if let SignalPayload::HoverEnter { element_id } = signal.payload {
            self.hover.enter(&element_id, now);
        }
    }

    /// Pointer left a tracked element. Fires a still-pending dwell gate with
    /// the total duration and records the completed hover either way.
    pub fn leave_hover(&mut self, element_id: &str) {
        if self.is_disposed() {
            return;
        }
        self.fire_due_gates();

        let now = self.clock.now();
        let Some(signal) = self.collector.normalize(
            HostEvent::PointerLeave {
                element_id: element_id.to_string(),
            },
            now,
        ) else {
            return;
        };
        let SignalPayload::HoverLeave { element_id } = signal.payload else {
            return;
        };
        let Some(outcome) = self.hover.leave(&element_id, now) else {
            // Leave without a tracked enter: fresh zero-state, nothing to do
            return;
        };
        if let Some(elapsed_ms) = outcome.dwell_fire {
            if let Some(intention) = self.classifier.classify_dwell(&element_id, elapsed_ms, now) {
                debug!("intention: {}", intention.describe());
                self.intentions.push(intention);
            }
        }
        self.update_load();
    }

    /// Cooperative timer poll: fires due dwell gates and refreshes the load
    /// estimate. Hosts without a convenient signal cadence call this from
    /// their frame loop.
    pub fn tick(&mut self) {
        if self.is_disposed() {
            return;
        }
        if self.fire_due_gates() > 0 {
            self.update_load();
        }
    }

    // ------------------------------------------------------------------
    // Classification
    // ------------------------------------------------------------------

    /// Explicit classification path: the host names the intention and the
    /// engine records it at confidence 1.0.
    pub fn detect_intention(
        &mut self,
        kind: IntentionKind,
        target: &str,
        context: Option<serde_json::Value>,
    ) -> Intention {
        let now = self.clock.now();
        let intention = self.classifier.classify_explicit(kind, target, context, now);
        if !self.is_disposed() {
            self.intentions.push(intention.clone());
            self.update_load();
        }
        intention
    }

    /// Snapshot of the current intention log, oldest first.
    pub fn current_intentions(&self) -> Vec<Intention> {
        self.intentions.snapshot()
    }

    // ------------------------------------------------------------------
    // Load & adaptation
    // ------------------------------------------------------------------

    /// The current derived cognitive load.
    pub fn cognitive_load(&self) -> CognitiveLoad {
        self.load
    }

    /// UI directives for the current load level.
    pub fn adaptation_strategy(&self) -> AdaptationStrategy {
        AdaptationStrategy::for_level(self.load.level)
    }

    // ------------------------------------------------------------------
    // Forms
    // ------------------------------------------------------------------

    /// Record a form validation failure.
    pub fn record_form_error(&mut self, form_id: &str, error_type: &str) {
        if self.is_disposed() {
            return;
        }
        let now = self.clock.now();
        let count = self.forms.record_error(form_id, error_type, now);
        debug!("form {form_id}: error #{count} ({error_type})");
        self.update_load();
    }

    /// Record a successful validation, closing the form's help gate.
    pub fn record_form_success(&mut self, form_id: &str) {
        if self.is_disposed() {
            return;
        }
        self.forms.record_success(form_id);
        self.update_load();
    }

    /// True once the form has accumulated enough errors for the empathic
    /// help escalation.
    pub fn should_show_empathic_help(&self, form_id: &str) -> bool {
        self.forms.should_show_help(form_id)
    }

    /// Context for the host's help dialog.
    pub fn help_context(&self, form_id: &str) -> HelpContext {
        self.forms.help_context(form_id)
    }

    /// Forms whose help gate is open.
    pub fn forms_needing_help(&self) -> Vec<String> {
        self.forms.forms_needing_help()
    }

    // ------------------------------------------------------------------
    // Preload
    // ------------------------------------------------------------------

    /// Check for a live preloaded payload. Expired and absent read the same;
    /// callers fall back to a normal fetch on `false`.
    pub fn is_data_preloaded(&self, key: &str) -> bool {
        self.cache.is_preloaded(key, self.clock.now())
    }

    /// Remove and return a live preloaded payload.
    pub fn take_preloaded(&self, key: &str) -> Option<serde_json::Value> {
        self.cache.take(key, self.clock.now())
    }

    /// Issue a speculative fetch for `key`.
    ///
    /// The request timestamp is captured now, at issue time; when the fetch
    /// completes, the result is applied only if no fresher request has
    /// written the key since (last-issued-wins) and the engine has not been
    /// disposed. Resolves to `true` if the entry was stored.
    pub fn request_preload(
        &self,
        key: &str,
        params: serde_json::Value,
    ) -> impl Future<Output = bool> + Send + 'static {
        let requested_at = self.clock.now();
        let source = Arc::clone(&self.source);
        let cache = Arc::clone(&self.cache);
        let disposed = Arc::clone(&self.disposed);
        let key = key.to_string();

        async move {
            if disposed.load(Ordering::SeqCst) {
                return false;
            }
            match source.fetch(&key, &params).await {
                Ok(payload) => {
                    if disposed.load(Ordering::SeqCst) {
                        debug!("preload {key}: engine disposed, dropping result");
                        return false;
                    }
                    let applied = cache.insert_if_fresher(&key, payload, requested_at);
                    if !applied {
                        debug!("preload {key}: stale response discarded");
                    }
                    applied
                }
                Err(e) => {
                    warn!("preload {key}: {e}");
                    false
                }
            }
        }
    }

    /// Issue preloads for every prediction strictly above the confidence
    /// threshold (default 0.9). Resolves to the number of entries stored.
    pub fn preload_high_probability_targets(
        &self,
        predictions: &HashMap<String, f64>,
    ) -> impl Future<Output = usize> + Send + 'static {
        let mut eligible: Vec<(&String, f64)> = predictions
            .iter()
            .filter(|(_, p)| **p > self.preload_threshold)
            .map(|(t, p)| (t, *p))
            .collect();
        // Stable issue order regardless of map iteration
        eligible.sort_by(|a, b| a.0.cmp(b.0));

        let requests: Vec<_> = eligible
            .into_iter()
            .map(|(target, probability)| {
                self.request_preload(target, serde_json::json!({ "probability": probability }))
            })
            .collect();

        async move {
            let mut applied = 0;
            for request in requests {
                if request.await {
                    applied += 1;
                }
            }
            applied
        }
    }

    // ------------------------------------------------------------------
    // Lifecycle & introspection
    // ------------------------------------------------------------------

    /// Tear the engine down: cancel outstanding dwell gates, discard all
    /// buffered state, and mark in-flight preload continuations for
    /// dropping. Subsequent signals are ignored.
    pub fn dispose(&mut self) {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        let cancelled = self.hover.cancel_all();
        if cancelled > 0 {
            debug!("dispose: cancelled {cancelled} pending dwell gates");
        }
        self.mouse.clear();
        self.typing.clear();
        self.hover.clear_history();
        self.intentions.clear();
        self.forms.clear();
        self.cache.clear();
        self.load = CognitiveLoad::default();
        info!("intention engine disposed");
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    /// Collector accept/reject counters.
    pub fn collector_stats(&self) -> CollectorStats {
        self.collector.stats()
    }

    /// Mouse buffer counters.
    pub fn mouse_stats(&self) -> BufferStats {
        self.mouse.stats()
    }

    /// Typing buffer counters.
    pub fn typing_stats(&self) -> BufferStats {
        self.typing.stats()
    }

    /// Live hover count (armed or fired, pointer still over the element).
    pub fn active_hovers(&self) -> usize {
        self.hover.active_count()
    }

    /// Keys with a live preload entry.
    pub fn preloaded_keys(&self) -> Vec<String> {
        self.cache.live_keys(self.clock.now())
    }

    // ------------------------------------------------------------------

    /// Fire all due dwell gates through the classifier. Returns how many
    /// intentions were created.
    fn fire_due_gates(&mut self) -> usize {
        let now = self.clock.now();
        let mut created = 0;
        for fire in self.hover.poll_due(now) {
            if let Some(intention) =
                self.classifier
                    .classify_dwell(&fire.element_id, fire.elapsed_ms, now)
            {
                debug!("intention: {}", intention.describe());
                self.intentions.push(intention);
                created += 1;
            }
        }
        created
    }

    /// Recompute the four indicators and derive the load level.
    fn update_load(&mut self) {
        let now = self.clock.now();
        let nav_cutoff =
            Timestamp::from_millis(now.as_millis().saturating_sub(self.estimator.nav_window_ms));

        let indicators = LoadIndicators {
            mouse_hesitation: self.estimator.mouse_hesitation(self.mouse.iter(), now),
            error_frequency: self
                .estimator
                .error_frequency(self.forms.total_active_errors()),
            navigation_patterns: self
                .estimator
                .navigation_patterns(self.intentions.count_since(nav_cutoff)),
            typing_stress: self.estimator.typing_stress(self.typing.iter(), now),
        };
        self.load = CognitiveLoad::from_indicators(indicators);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preload::source::StaticPreloadSource;
    use crate::time::clock::ManualClock;

    fn engine_with_clock() -> (IntentionEngine, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let engine = IntentionEngine::new(
            EngineConfig::default(),
            clock.clone(),
            Arc::new(StaticPreloadSource::empty()),
        )
        .expect("default config is valid");
        (engine, clock)
    }

    #[test]
    fn test_short_hover_creates_no_intention() {
        let (mut engine, clock) = engine_with_clock();

        engine.track_hover("folha-preview");
        clock.advance(300);
        engine.leave_hover("folha-preview");

        assert!(engine.current_intentions().is_empty());
    }

    #[test]
    fn test_hover_600ms_creates_data_view_at_030() {
        let (mut engine, clock) = engine_with_clock();

        engine.track_hover("folha-preview");
        clock.advance(600);
        engine.leave_hover("folha-preview");

        let intentions = engine.current_intentions();
        assert_eq!(intentions.len(), 1);
        assert_eq!(intentions[0].kind, IntentionKind::DataView);
        assert_eq!(intentions[0].target, "folha-preview");
        assert!((intentions[0].confidence - 0.30).abs() < 1e-6);
    }

    #[test]
    fn test_gate_fires_via_tick_while_hovering() {
        let (mut engine, clock) = engine_with_clock();

        engine.track_hover("data-grid");
        clock.advance(500);
        engine.tick();

        let intentions = engine.current_intentions();
        assert_eq!(intentions.len(), 1);
        assert!((intentions[0].confidence - 0.25).abs() < 1e-6);

        // The later leave does not double-classify
        clock.advance(1_000);
        engine.leave_hover("data-grid");
        assert_eq!(engine.current_intentions().len(), 1);
    }

    #[test]
    fn test_hover_on_non_preview_target_is_silent() {
        let (mut engine, clock) = engine_with_clock();

        engine.track_hover("save-button");
        clock.advance(900);
        engine.leave_hover("save-button");

        assert!(engine.current_intentions().is_empty());
    }

    #[test]
    fn test_enter_in_input_records_form_submission() {
        let (mut engine, _clock) = engine_with_clock();

        engine.record_keypress("a", Some("email"));
        engine.record_keypress("Enter", Some("demo_form"));

        let intentions = engine.current_intentions();
        assert_eq!(intentions.len(), 1);
        assert_eq!(intentions[0].kind, IntentionKind::FormSubmission);
        assert_eq!(intentions[0].confidence, 1.0);
    }

    #[test]
    fn test_detect_intention_explicit() {
        let (mut engine, _clock) = engine_with_clock();

        let intention = engine.detect_intention(IntentionKind::Navigation, "reports", None);
        assert_eq!(intention.confidence, 1.0);
        assert_eq!(engine.current_intentions().len(), 1);
    }

    #[test]
    fn test_empathic_help_flips_on_third_error() {
        let (mut engine, _clock) = engine_with_clock();

        engine.record_form_error("demo_form", "email");
        engine.record_form_error("demo_form", "email");
        assert!(!engine.should_show_empathic_help("demo_form"));

        engine.record_form_error("demo_form", "email");
        assert!(engine.should_show_empathic_help("demo_form"));

        engine.record_form_success("demo_form");
        assert!(!engine.should_show_empathic_help("demo_form"));
    }

    #[test]
    fn test_malformed_signals_change_nothing() {
        let (mut engine, _clock) = engine_with_clock();

        engine.record_mouse_movement(f64::NAN, 10.0);
        engine.record_keypress("", None);
        engine.track_hover("");

        assert_eq!(engine.mouse_stats().pushed, 0);
        assert_eq!(engine.typing_stats().pushed, 0);
        assert_eq!(engine.active_hovers(), 0);
        assert_eq!(engine.collector_stats().rejected, 3);
    }

    #[test]
    fn test_disposed_engine_drops_signals() {
        let (mut engine, clock) = engine_with_clock();

        engine.track_hover("folha-preview");
        engine.dispose();

        clock.advance(1_000);
        engine.tick();
        engine.record_mouse_movement(1.0, 2.0);
        engine.record_keypress("Enter", Some("demo_form"));
        engine.record_form_error("demo_form", "email");

        assert!(engine.current_intentions().is_empty());
        assert_eq!(engine.mouse_stats().pushed, 0);
        assert!(!engine.should_show_empathic_help("demo_form"));
        assert_eq!(engine.active_hovers(), 0);
    }

    #[tokio::test]
    async fn test_preload_roundtrip_and_ttl() {
        let (engine, clock) = engine_with_clock();

        assert!(engine.request_preload("payroll_data", serde_json::json!({})).await);
        assert!(engine.is_data_preloaded("payroll_data"));

        clock.advance(29_000);
        assert!(engine.is_data_preloaded("payroll_data"));

        clock.advance(2_000); // now 31s after issue
        assert!(!engine.is_data_preloaded("payroll_data"));
    }

    #[tokio::test]
    async fn test_out_of_order_responses_keep_fresher_issue() {
        let (engine, clock) = engine_with_clock();

        // Issue at t=0 and t=100, then let the earlier response arrive last
        let first = engine.request_preload("client_data", serde_json::json!({"issue": 0}));
        clock.advance(100);
        let second = engine.request_preload("client_data", serde_json::json!({"issue": 100}));

        assert!(second.await);
        assert!(!first.await); // stale, rejected

        let payload = engine.take_preloaded("client_data").expect("live entry");
        assert_eq!(payload["params"]["issue"], 100);
    }

    #[tokio::test]
    async fn test_preload_threshold_is_strict() {
        let (engine, _clock) = engine_with_clock();

        let mut predictions = HashMap::new();
        predictions.insert("exactly_at".to_string(), 0.9);
        predictions.insert("below".to_string(), 0.5);
        predictions.insert("above".to_string(), 0.95);

        let applied = engine.preload_high_probability_targets(&predictions).await;
        assert_eq!(applied, 1);
        assert!(engine.is_data_preloaded("above"));
        assert!(!engine.is_data_preloaded("exactly_at"));
        assert!(!engine.is_data_preloaded("below"));
    }

    #[tokio::test]
    async fn test_late_completion_after_dispose_is_dropped() {
        let (mut engine, _clock) = engine_with_clock();

        let pending = engine.request_preload("payroll_data", serde_json::json!({}));
        engine.dispose();

        assert!(!pending.await);
        assert!(!engine.is_data_preloaded("payroll_data"));
    }

    #[test]
    fn test_load_rises_with_form_errors() {
        let (mut engine, _clock) = engine_with_clock();
        assert_eq!(engine.cognitive_load().level, crate::LoadLevel::Low);

        for _ in 0..5 {
            engine.record_form_error("checkout", "cpf");
        }
        let load = engine.cognitive_load();
        assert_eq!(load.indicators.error_frequency, 1.0);
        assert!(load.adaptation_required);
        assert_eq!(
            engine.adaptation_strategy(),
            AdaptationStrategy::for_level(load.level)
        );
    }

    #[test]
    fn test_intention_log_is_capped() {
        let (mut engine, _clock) = engine_with_clock();
        for i in 0..60 {
            engine.detect_intention(IntentionKind::Action, &format!("button-{i}"), None);
        }
        assert_eq!(engine.current_intentions().len(), 50);
    }
}
