//! The emotion engine: gauges, mood, response table and arbiter composed
//! behind one owner.
//!
//! # Lifecycle
//!
//! ```text
//! new ──▶ init ──▶ { tick | handle_event | try_display }* ──▶ on_shutdown
//! ```
//!
//! Everything before `init` is a logged no-op. The engine keeps its own
//! monotonic clock (`now`, seconds) advanced only by [`EmotionEngine::tick`];
//! cooldowns, resets and the sleep limit are measured on it. The speed
//! multiplier scales gauge drain and rest regeneration only.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::arbiter::{DisplayArbiter, DisplayState, WakeCause};
use crate::classify::classify_display;
use crate::config::PurrConfig;
use crate::error::{PurrError, Result};
use crate::gauge::{GaugeBank, GaugeReadings};
use crate::metrics::{CounterSnapshot, EngineCounters};
use crate::mood::MoodEngine;
use crate::persistence::{BaselineStore, SqliteBaselineStore, StoredBaseline};
use crate::presentation::Presenter;
use crate::response::ResponseTable;
use crate::types::{Affect, AffectiveLabel, Expression, Need, SessionId, Trigger};

/// What the engine decided to show for one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmotionalResponse {
    /// Display to surface.
    pub display: Expression,
    /// The event, kept for overlay thoughts. `None` for unknown names.
    pub trigger: Option<Trigger>,
}

impl EmotionalResponse {
    fn neutral(trigger: Option<Trigger>) -> Self {
        Self {
            display: Expression::Neutral,
            trigger,
        }
    }
}

/// Result of [`EmotionEngine::handle_event`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventOutcome {
    /// What the engine wanted to show.
    pub response: EmotionalResponse,
    /// Whether the arbiter let it through.
    pub shown: bool,
}

/// Serializable view of the whole engine, for status output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSnapshot {
    /// Current session, if initialised.
    pub session_id: Option<SessionId>,
    /// Engine clock.
    pub now: f64,
    /// Gauge values.
    pub gauges: GaugeReadings,
    /// Persistent baseline.
    pub long_term: Affect,
    /// Session point.
    pub session_mood: Affect,
    /// Label of the baseline.
    pub temperament: AffectiveLabel,
    /// Label of the session point.
    pub current_mood: AffectiveLabel,
    /// Arbiter bookkeeping.
    pub display: DisplayState,
    /// Counters.
    pub counters: CounterSnapshot,
}

impl EngineSnapshot {
    /// Pretty JSON.
    ///
    /// # Errors
    /// Returns `PurrError::Serialization` if encoding fails.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| PurrError::Serialization(e.to_string()))
    }
}

/// The engine. Owns its presenter and (optionally) a baseline store.
pub struct EmotionEngine<P: Presenter> {
    config: PurrConfig,
    gauges: GaugeBank,
    mood: MoodEngine,
    table: Arc<ResponseTable>,
    arbiter: DisplayArbiter,
    presenter: P,
    store: Option<Box<dyn BaselineStore + Send>>,
    now: f64,
    session: Option<SessionId>,
    counters: EngineCounters,
    next_gauge_log: f64,
}

impl<P: Presenter> std::fmt::Debug for EmotionEngine<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmotionEngine")
            .field("session", &self.session)
            .field("now", &self.now)
            .field("gauges", &self.gauges.readings())
            .field("mood", &self.mood.current_mood())
            .field("display", self.arbiter.state())
            .field("has_store", &self.store.is_some())
            .finish_non_exhaustive()
    }
}

impl<P: Presenter> EmotionEngine<P> {
    /// Build an engine around an already-loaded response table.
    #[must_use]
    pub fn new(config: PurrConfig, table: Arc<ResponseTable>, presenter: P) -> Self {
        Self {
            gauges: GaugeBank::from_config(&config.gauges),
            mood: MoodEngine::new(&config.mood),
            arbiter: DisplayArbiter::new(&config.display),
            table,
            presenter,
            store: None,
            now: 0.0,
            session: None,
            counters: EngineCounters::new(),
            next_gauge_log: 0.0,
            config,
        }
    }

    /// Build an engine from configuration alone: load the response table
    /// from `responses.path` and, when persistence is enabled, open the
    /// SQLite baseline store at `persistence.path`.
    ///
    /// Neither failure is fatal: an unreadable table becomes an empty one,
    /// and a store that cannot be opened is logged and left out.
    #[must_use]
    pub fn from_config(config: PurrConfig, presenter: P) -> Self {
        let table = Arc::new(ResponseTable::load(&config.responses.path));
        let store = if config.persistence.enabled {
            match SqliteBaselineStore::open(&config.persistence.path, config.persistence.wal_mode) {
                Ok(store) => Some(store),
                Err(e) => {
                    error!(path = %config.persistence.path, error = %e, "failed to open baseline store");
                    None
                }
            }
        } else {
            None
        };
        let engine = Self::new(config, table, presenter);
        match store {
            Some(store) => engine.with_store(store),
            None => engine,
        }
    }

    /// Attach a baseline store.
    #[must_use]
    pub fn with_store(mut self, store: impl BaselineStore + Send + 'static) -> Self {
        self.store = Some(Box::new(store));
        self
    }

    fn ready(&self, operation: &'static str) -> bool {
        if self.arbiter.is_initialized() {
            true
        } else {
            warn!(operation, "engine used before init");
            false
        }
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Load the baseline, start a session and open the arbiter.
    ///
    /// A store that fails to load is logged and the configured defaults
    /// are used. Calling `init` twice is a logged no-op.
    pub fn init(&mut self) {
        if self.arbiter.is_initialized() {
            warn!("init called twice");
            return;
        }

        let stored = match self.store.as_ref().map(|s| s.load()) {
            Some(Ok(stored)) => stored,
            Some(Err(e)) => {
                warn!(error = %e, "baseline load failed, using defaults");
                StoredBaseline::default()
            }
            None => StoredBaseline::default(),
        };

        self.gauges = GaugeBank::from_config(&self.config.gauges);
        self.mood.begin_session(stored);
        self.arbiter.initialize(self.now);
        self.next_gauge_log = self.now;

        let session = SessionId::new();
        self.session = Some(session);
        info!(
            %session,
            companion = %self.config.general.name,
            temperament = %self.mood.temperament(),
            mood = %self.mood.current_mood(),
            baseline = %self.mood.long_term(),
            "session started"
        );
    }

    /// Fold the session into the baseline and save it.
    ///
    /// With persistence disabled the baseline is returned untouched.
    ///
    /// # Errors
    /// `PurrError::NotInitialized` before `init`; store errors on save.
    pub fn on_shutdown(&mut self) -> Result<Affect> {
        if !self.ready("on_shutdown") {
            return Err(PurrError::NotInitialized {
                operation: "on_shutdown",
            });
        }
        if !self.config.persistence.enabled {
            info!(session = ?self.session, "session ended, persistence disabled");
            return Ok(self.mood.long_term());
        }

        let baseline = self.mood.end_session();
        match self.store.as_mut() {
            Some(store) => {
                if let Err(e) = store.save(&baseline) {
                    error!(error = %e, "baseline save failed");
                    return Err(e);
                }
                EngineCounters::bump(&self.counters.saves);
            }
            None => debug!("no baseline store attached, nothing saved"),
        }
        info!(session = ?self.session, %baseline, "session ended");
        Ok(baseline)
    }

    // ------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------

    /// Decide what to show for an event name, without showing it.
    ///
    /// Unknown names and table misses give `neutral`.
    pub fn calculate_emotional_response(&mut self, trigger: &str) -> EmotionalResponse {
        if !self.ready("calculate_emotional_response") {
            return EmotionalResponse::neutral(None);
        }
        match trigger.parse::<Trigger>() {
            Ok(t) => self.respond(t),
            Err(_) => {
                EngineCounters::bump(&self.counters.events_handled);
                EngineCounters::bump(&self.counters.table_misses);
                warn!(trigger, "unknown trigger, using neutral");
                EmotionalResponse::neutral(None)
            }
        }
    }

    /// Typed form of [`EmotionEngine::calculate_emotional_response`].
    pub fn respond(&mut self, trigger: Trigger) -> EmotionalResponse {
        if !self.ready("respond") {
            return EmotionalResponse::neutral(Some(trigger));
        }
        EngineCounters::bump(&self.counters.events_handled);

        if trigger == Trigger::LoudNoise {
            if self.is_asleep() {
                self.wake_up(WakeCause::Interrupt);
            }
            return EmotionalResponse {
                display: Expression::LoudNoise,
                trigger: Some(trigger),
            };
        }

        if self.is_asleep() {
            return EmotionalResponse {
                display: Expression::Sleep,
                trigger: Some(trigger),
            };
        }

        let mood = self.mood.reclassify();
        let Some(response) = self.table.lookup(trigger, mood).copied() else {
            EngineCounters::bump(&self.counters.table_misses);
            warn!(%trigger, %mood, "no response row, using neutral");
            return EmotionalResponse::neutral(Some(trigger));
        };

        response.apply_to(&mut self.gauges);
        let fuzzed = self.mood.fuzz(&response);
        let new_mood = self.mood.absorb(fuzzed);
        let expression = classify_display(fuzzed.valence, fuzzed.arousal);

        debug!(
            %trigger,
            %mood,
            %fuzzed,
            display = %expression,
            new_mood = %new_mood,
            "emotional response"
        );
        EmotionalResponse {
            display: expression,
            trigger: Some(trigger),
        }
    }

    /// Calculate a response and hand it to the arbiter. `loudnoise` skips
    /// the cooldown.
    pub fn handle_event(&mut self, trigger: &str) -> EventOutcome {
        let response = self.calculate_emotional_response(trigger);
        self.show(response)
    }

    /// Typed form of [`EmotionEngine::handle_event`].
    pub fn handle_trigger(&mut self, trigger: Trigger) -> EventOutcome {
        let response = self.respond(trigger);
        self.show(response)
    }

    fn show(&mut self, response: EmotionalResponse) -> EventOutcome {
        let bypass = response.display == Expression::LoudNoise;
        let shown = self.present(response.display, response.trigger, bypass);
        EventOutcome { response, shown }
    }

    fn present(&mut self, display: Expression, trigger: Option<Trigger>, bypass: bool) -> bool {
        let shown = self
            .arbiter
            .try_display(display, trigger, bypass, self.now, &mut self.presenter);
        if shown {
            EngineCounters::bump(&self.counters.displays_accepted);
        } else {
            EngineCounters::bump(&self.counters.displays_rejected);
        }
        shown
    }

    /// Ask the arbiter to show a display by name.
    ///
    /// Unknown display names fall back to `neutral`; an empty or unknown
    /// trigger name means "no trigger".
    pub fn try_display(&mut self, emotion: &str, trigger: &str, bypass_cooldown: bool) -> bool {
        let display = emotion.parse::<Expression>().unwrap_or_else(|_| {
            warn!(emotion, "unknown display, using neutral");
            Expression::Neutral
        });
        let trigger = if trigger.trim().is_empty() {
            None
        } else {
            match trigger.parse::<Trigger>() {
                Ok(t) => Some(t),
                Err(_) => {
                    warn!(trigger, "unknown trigger on display request, ignoring");
                    None
                }
            }
        };
        self.present(display, trigger, bypass_cooldown)
    }

    // ------------------------------------------------------------------
    // Time
    // ------------------------------------------------------------------

    /// Advance the engine clock by `delta_seconds`.
    ///
    /// Awake: drain gauges, route threshold crossings through
    /// [`EmotionEngine::handle_trigger`], fall asleep when rest empties.
    /// Asleep: refill rest and wake when it is full or the sleep limit
    /// has passed. Then service display deadlines and the passive face.
    pub fn tick(&mut self, delta_seconds: f64) {
        if !self.ready("tick") {
            return;
        }
        let delta = if delta_seconds.is_finite() && delta_seconds >= 0.0 {
            delta_seconds
        } else {
            warn!(delta_seconds, "ignoring invalid tick delta");
            0.0
        };
        self.now += delta;
        let multiplier = self.config.time.speed_multiplier();
        #[allow(clippy::cast_possible_truncation)]
        let delta_f32 = delta as f32;

        if self.is_asleep() {
            self.gauges
                .regenerate_rest(self.config.sleep.rest_regen_per_second, delta_f32, multiplier);
            let slept = self
                .arbiter
                .state()
                .sleep_start_time
                .map_or(0.0, |start| self.now - start);
            if self.gauges.value(Need::Rest) >= 100.0 || slept >= self.config.sleep.max_duration_secs {
                self.wake_up(WakeCause::Natural);
            }
        } else {
            for trigger in self.gauges.tick(delta_f32, multiplier) {
                EngineCounters::bump(&self.counters.threshold_crossings);
                self.handle_trigger(trigger);
            }
            if self.gauges.rest_depleted() {
                self.sleep_onset();
            }
        }

        self.arbiter
            .update(self.now, self.mood.current_mood(), &mut self.presenter);

        if self.now >= self.next_gauge_log {
            let g = self.gauges.readings();
            debug!(
                touch = g.touch,
                rest = g.rest,
                social = g.social,
                hunger = g.hunger,
                "gauges"
            );
            self.next_gauge_log = self.now + self.config.general.gauge_log_interval_secs;
        }
    }

    /// Fall asleep now. Returns `false` if already asleep or not initialised.
    pub fn sleep_onset(&mut self) -> bool {
        if !self.ready("sleep_onset") {
            return false;
        }
        let slept = self.arbiter.enter_sleep(self.now, &mut self.presenter);
        if slept {
            EngineCounters::bump(&self.counters.sleeps);
        }
        slept
    }

    /// Wake up. Returns the time slept, or `None` if not asleep.
    ///
    /// A natural wake also resets the display to neutral.
    pub fn wake_up(&mut self, cause: WakeCause) -> Option<f64> {
        if !self.ready("wake_up") {
            return None;
        }
        let slept = self.arbiter.wake(self.now, cause, &mut self.presenter)?;
        EngineCounters::bump(&self.counters.wakes);
        if cause == WakeCause::Natural {
            self.present(Expression::Neutral, None, true);
        }
        Some(slept)
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// Engine clock, seconds since construction.
    #[must_use]
    pub fn now(&self) -> f64 {
        self.now
    }

    /// Whether `init` has run.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.arbiter.is_initialized()
    }

    /// Whether the companion is asleep.
    #[must_use]
    pub fn is_asleep(&self) -> bool {
        self.arbiter.state().is_asleep
    }

    /// Current session id.
    #[must_use]
    pub fn session_id(&self) -> Option<SessionId> {
        self.session
    }

    /// Need gauges.
    #[must_use]
    pub fn gauges(&self) -> &GaugeBank {
        &self.gauges
    }

    /// Add to one gauge, clamped.
    pub fn apply_gauge_delta(&mut self, need: Need, amount: f32) {
        self.gauges.apply_delta(need, amount);
    }

    /// Mood state.
    #[must_use]
    pub fn mood(&self) -> &MoodEngine {
        &self.mood
    }

    /// Mutable mood state.
    pub fn mood_mut(&mut self) -> &mut MoodEngine {
        &mut self.mood
    }

    /// Label of the session mood.
    #[must_use]
    pub fn current_mood(&self) -> AffectiveLabel {
        self.mood.current_mood()
    }

    /// Arbiter bookkeeping.
    #[must_use]
    pub fn display_state(&self) -> &DisplayState {
        self.arbiter.state()
    }

    /// The arbiter.
    #[must_use]
    pub fn arbiter(&self) -> &DisplayArbiter {
        &self.arbiter
    }

    /// The response table.
    #[must_use]
    pub fn table(&self) -> &Arc<ResponseTable> {
        &self.table
    }

    /// The presenter.
    #[must_use]
    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    /// Mutable presenter.
    pub fn presenter_mut(&mut self) -> &mut P {
        &mut self.presenter
    }

    /// Configuration in use.
    #[must_use]
    pub fn config(&self) -> &PurrConfig {
        &self.config
    }

    /// Counter values.
    #[must_use]
    pub fn counters(&self) -> CounterSnapshot {
        self.counters.snapshot()
    }

    /// Everything at once.
    #[must_use]
    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            session_id: self.session,
            now: self.now,
            gauges: self.gauges.readings(),
            long_term: self.mood.long_term(),
            session_mood: self.mood.session(),
            temperament: self.mood.temperament(),
            current_mood: self.mood.current_mood(),
            display: self.arbiter.state().clone(),
            counters: self.counters.snapshot(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryBaselineStore;
    use crate::presentation::{CommandLog, PresentationCommand};

    fn config() -> PurrConfig {
        let mut config = PurrConfig::default();
        config.mood.rng_seed = Some(42);
        config.mood.session_jitter = 0.0;
        config.persistence.enabled = false;
        config
    }

    fn engine_with(config: PurrConfig) -> EmotionEngine<CommandLog> {
        let mut engine =
            EmotionEngine::new(config, Arc::new(ResponseTable::builtin()), CommandLog::new());
        engine.init();
        engine
    }

    fn engine() -> EmotionEngine<CommandLog> {
        engine_with(config())
    }

    #[test]
    fn everything_is_a_no_op_before_init() {
        let mut engine =
            EmotionEngine::new(config(), Arc::new(ResponseTable::builtin()), CommandLog::new());
        assert_eq!(engine.handle_event("NameHeard").response.display, Expression::Neutral);
        assert!(!engine.try_display("happy", "", true));
        assert!(!engine.sleep_onset());
        engine.tick(10.0);
        assert_eq!(engine.now(), 0.0);
        assert!(matches!(
            engine.on_shutdown(),
            Err(PurrError::NotInitialized { .. })
        ));
        assert!(engine.presenter().commands().is_empty());
    }

    #[test]
    fn init_starts_a_happy_session_from_defaults() {
        let engine = engine();
        assert!(engine.session_id().is_some());
        assert_eq!(engine.mood().temperament(), AffectiveLabel::Happy);
        assert_eq!(engine.gauges().value(Need::Touch), 50.0);
    }

    #[test]
    fn unknown_trigger_is_neutral() {
        let mut engine = engine();
        let response = engine.calculate_emotional_response("Sneeze");
        assert_eq!(response, EmotionalResponse::neutral(None));
        assert_eq!(engine.counters().table_misses, 1);
    }

    #[test]
    fn table_miss_is_neutral_and_keeps_the_trigger() {
        let mut engine = EmotionEngine::new(config(), Arc::new(ResponseTable::empty()), CommandLog::new());
        engine.init();
        let response = engine.calculate_emotional_response("NameHeard");
        assert_eq!(response, EmotionalResponse::neutral(Some(Trigger::NameHeard)));
    }

    #[test]
    fn stroke_applies_gauge_deltas() {
        let mut engine = engine();
        engine.calculate_emotional_response("strokefronttoback");
        assert_eq!(engine.gauges().value(Need::Touch), 65.0);
        assert_eq!(engine.gauges().value(Need::Social), 55.0);
    }

    #[test]
    fn loudnoise_skips_the_table_and_the_cooldown() {
        let mut engine = engine();
        assert!(engine.try_display("happy", "", false));
        let outcome = engine.handle_event("LoudNoise");
        assert!(outcome.shown);
        assert_eq!(outcome.response.display, Expression::LoudNoise);
        assert_eq!(engine.gauges().value(Need::Touch), 50.0);
    }

    #[test]
    fn asleep_events_answer_sleep() {
        let mut engine = engine();
        assert!(engine.sleep_onset());
        let outcome = engine.handle_event("NameHeard");
        assert_eq!(outcome.response.display, Expression::Sleep);
        assert!(!outcome.shown);
    }

    #[test]
    fn loudnoise_interrupts_sleep() {
        let mut engine = engine();
        engine.sleep_onset();
        let outcome = engine.handle_event("loudnoise");
        assert!(outcome.shown);
        assert!(!engine.is_asleep());
        assert_eq!(engine.counters().wakes, 1);
    }

    #[test]
    fn response_alone_wakes_to_a_neutral_display() {
        let mut engine = engine();
        engine.sleep_onset();
        let response = engine.calculate_emotional_response("loudnoise");
        assert_eq!(response.display, Expression::LoudNoise);
        assert!(!engine.is_asleep());
        assert_eq!(engine.display_state().current_display, Expression::Neutral);
    }

    #[test]
    fn oversized_fuzz_range_never_panics() {
        let mut config = config();
        config.mood.fuzz_range = 3e38;
        config.mood.session_jitter = f32::INFINITY;
        let mut engine = engine_with(config);
        let outcome = engine.handle_event("NameHeard");
        let session = engine.mood().session();
        assert!(session.valence.abs() <= 10.0 && session.arousal.abs() <= 10.0);
        assert!(outcome.response.trigger.is_some());
    }

    #[test]
    fn rest_running_out_puts_the_companion_to_sleep() {
        let mut config = config();
        config.gauges.rest_decay_per_second = 10.0;
        let mut engine = engine_with(config);

        for _ in 0..6 {
            engine.tick(1.0);
        }
        assert!(engine.is_asleep());
        assert!(engine
            .presenter()
            .contains(&PresentationCommand::ShowThought("sleep".into())));
    }

    #[test]
    fn sleep_ends_when_rest_is_full() {
        let mut config = config();
        config.sleep.rest_regen_per_second = 25.0;
        let mut engine = engine_with(config);
        engine.sleep_onset();

        engine.tick(1.0);
        assert!(engine.is_asleep());
        engine.tick(1.0);
        assert!(!engine.is_asleep());
        assert_eq!(engine.display_state().current_display, Expression::Neutral);
        assert!(engine
            .presenter()
            .contains(&PresentationCommand::TailsEmotion("wakeup".into())));
    }

    #[test]
    fn sleep_ends_at_the_limit() {
        let mut config = config();
        config.sleep.rest_regen_per_second = 0.0;
        config.sleep.max_duration_secs = 30.0;
        let mut engine = engine_with(config);
        engine.sleep_onset();

        engine.tick(29.0);
        assert!(engine.is_asleep());
        engine.tick(1.0);
        assert!(!engine.is_asleep());
    }

    #[test]
    fn threshold_crossings_are_displayed_with_overlay() {
        let mut engine = engine();
        engine.apply_gauge_delta(Need::Hunger, -25.0);
        engine.tick(0.1);
        assert!(engine
            .presenter()
            .contains(&PresentationCommand::ShowThought("hunger".into())));
        assert_eq!(engine.counters().threshold_crossings, 1);
    }

    #[test]
    fn shutdown_blends_and_saves() {
        let mut config = config();
        config.persistence.enabled = true;
        let mut engine = EmotionEngine::new(config, Arc::new(ResponseTable::builtin()), CommandLog::new())
            .with_store(MemoryBaselineStore::with_baseline(Affect::new(0.0, 0.0)));
        engine.init();
        engine.mood_mut().set_session(Affect::new(5.0, -5.0));

        let baseline = engine.on_shutdown().expect("saved");
        assert!((baseline.valence - 0.5).abs() < 1e-5);
        assert!((baseline.arousal + 0.5).abs() < 1e-5);
        assert_eq!(engine.counters().saves, 1);
    }

    #[test]
    fn shutdown_without_persistence_keeps_the_baseline() {
        let mut engine = engine();
        engine.mood_mut().set_session(Affect::new(-10.0, -10.0));
        assert_eq!(engine.on_shutdown().expect("ok"), Affect::new(10.0, 0.0));
    }

    #[test]
    fn snapshot_serializes() {
        let engine = engine();
        let json = engine.snapshot().to_json().expect("json");
        assert!(json.contains("\"temperament\": \"Happy\""));
    }
}
