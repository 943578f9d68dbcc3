//! Display arbitration.
//!
//! Decides whether a display may replace what is on screen, and runs the
//! timers that take it down again. Three phases:
//!
//! ```text
//!            try_display(e)               reset deadline
//!   Idle ─────────────────────▶ Displaying ───────────────▶ Idle
//!    │  ▲                                                     │
//!    │  └──────────── wake (natural / interrupt) ◀── Asleep ◀─┘ enter_sleep
//! ```
//!
//! Timers are deadlines (`Option<f64>`) compared with the engine clock on
//! every [`DisplayArbiter::update`]. Accepting a new display overwrites
//! them, which is all "cancel" means here.
//!
//! Two channels share the face. The triggered channel shows displays from
//! events. The passive channel re-derives a face from the current mood
//! every `passive_update_interval_secs`, but only while idle, so a
//! triggered display always wins.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::DisplayConfig;
use crate::presentation::Presenter;
use crate::types::{AffectiveLabel, Expression, Trigger};

/// Why the companion woke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WakeCause {
    /// Rest refilled or the sleep limit passed.
    Natural,
    /// A priority event (loud noise) cut the sleep short.
    Interrupt,
}

/// Why a display request was turned down. Rejections are normal outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// The engine has not run `init` yet.
    NotInitialized,
    /// Asleep, and the display is not the wake override.
    Asleep,
    /// Too soon after the previous emotional display.
    Cooldown,
    /// Another emotional display is still up.
    Busy,
}

/// Coarse arbiter phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArbiterPhase {
    /// Nothing emotional on screen; the passive channel owns the face.
    Idle,
    /// An emotional display is up.
    Displaying(Expression),
    /// Asleep.
    Asleep,
}

/// Display bookkeeping. Only the arbiter mutates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayState {
    /// What was last accepted.
    pub current_display: Expression,
    /// Event behind the current display, if any.
    pub current_trigger: Option<Trigger>,
    /// An emotional display is up and blocks non-bypass requests.
    pub is_showing_emotional_display: bool,
    /// Engine time of the last accepted emotional display.
    pub last_display_time: Option<f64>,
    /// Asleep. Never true together with `is_showing_emotional_display`.
    pub is_asleep: bool,
    /// Engine time sleep began.
    pub sleep_start_time: Option<f64>,
}

impl Default for DisplayState {
    fn default() -> Self {
        Self {
            current_display: Expression::Neutral,
            current_trigger: None,
            is_showing_emotional_display: false,
            last_display_time: None,
            is_asleep: false,
            sleep_start_time: None,
        }
    }
}

/// Thought icon forced by an event, whatever the display.
#[must_use]
pub fn overlay_thought(trigger: Trigger) -> Option<&'static str> {
    match trigger {
        Trigger::HungerNeeded => Some("hunger"),
        Trigger::TouchNeeded => Some("hand"),
        Trigger::RestNeeded => Some("bed"),
        Trigger::SocialNeeded => Some("people"),
        Trigger::FoodHeard => Some("food"),
        Trigger::NameHeard => Some("heart"),
        Trigger::TooFarAway => Some("beckon"),
        _ => None,
    }
}

/// The display state machine.
#[derive(Debug, Clone)]
pub struct DisplayArbiter {
    config: DisplayConfig,
    wake_override: Expression,
    state: DisplayState,
    initialized: bool,
    reset_at: Option<f64>,
    thought_hide_at: Option<f64>,
    next_passive_at: Option<f64>,
    current_face: Expression,
}

impl DisplayArbiter {
    /// A new, uninitialised arbiter.
    #[must_use]
    pub fn new(config: &DisplayConfig) -> Self {
        let wake_override = config.wake_override.parse().unwrap_or_else(|_| {
            warn!(name = %config.wake_override, "unknown wake override display, using loudnoise");
            Expression::LoudNoise
        });
        Self {
            config: config.clone(),
            wake_override,
            state: DisplayState::default(),
            initialized: false,
            reset_at: None,
            thought_hide_at: None,
            next_passive_at: None,
            current_face: Expression::Neutral,
        }
    }

    /// Allow displays from now on.
    pub fn initialize(&mut self, now: f64) {
        self.initialized = true;
        self.next_passive_at = Some(now);
    }

    /// Whether [`DisplayArbiter::initialize`] has run.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Current bookkeeping.
    #[must_use]
    pub fn state(&self) -> &DisplayState {
        &self.state
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> ArbiterPhase {
        if self.state.is_asleep {
            ArbiterPhase::Asleep
        } else if self.state.is_showing_emotional_display {
            ArbiterPhase::Displaying(self.state.current_display)
        } else {
            ArbiterPhase::Idle
        }
    }

    /// Face last sent to the presenter by either channel.
    #[must_use]
    pub fn current_face(&self) -> Expression {
        self.current_face
    }

    /// Pending auto-reset deadline.
    #[must_use]
    pub fn reset_deadline(&self) -> Option<f64> {
        self.reset_at
    }

    /// Whether a request would be accepted right now.
    ///
    /// # Errors
    /// Returns the [`Rejection`] that would apply.
    pub fn check(&self, expression: Expression, bypass_cooldown: bool, now: f64) -> Result<(), Rejection> {
        if !self.initialized {
            return Err(Rejection::NotInitialized);
        }
        if self.state.is_asleep && expression != self.wake_override {
            return Err(Rejection::Asleep);
        }
        if !bypass_cooldown {
            if self.state.is_showing_emotional_display {
                return Err(Rejection::Busy);
            }
            if self
                .state
                .last_display_time
                .is_some_and(|t| now - t < self.config.cooldown_secs)
            {
                return Err(Rejection::Cooldown);
            }
        }
        Ok(())
    }

    /// Try to put `expression` on screen.
    ///
    /// Returns `false` (and changes nothing) when rejected. Accepting the
    /// wake override while asleep wakes the companion first.
    pub fn try_display<P: Presenter + ?Sized>(
        &mut self,
        expression: Expression,
        trigger: Option<Trigger>,
        bypass_cooldown: bool,
        now: f64,
        presenter: &mut P,
    ) -> bool {
        if let Err(reason) = self.check(expression, bypass_cooldown, now) {
            if reason == Rejection::NotInitialized {
                warn!(display = %expression, "display requested before init");
            } else {
                debug!(display = %expression, ?reason, "display rejected");
            }
            return false;
        }

        if self.state.is_asleep {
            self.wake(now, WakeCause::Interrupt, presenter);
        }

        self.reset_at = None;
        let emotional = !matches!(expression, Expression::Neutral | Expression::Sleep);
        self.state.is_showing_emotional_display = emotional;
        if emotional {
            self.state.last_display_time = Some(now);
        }
        self.state.current_display = expression;
        self.state.current_trigger = trigger;

        self.present(expression, presenter);

        if let Some(thought) = trigger.and_then(overlay_thought) {
            presenter.show_thought(thought);
            self.thought_hide_at = Some(now + self.config.thought_duration_secs);
        }

        if emotional {
            self.reset_at = Some(now + self.config.duration_secs);
        } else {
            self.next_passive_at = Some(now + self.config.passive_update_interval_secs);
        }

        debug!(display = %expression, trigger = ?trigger, bypass = bypass_cooldown, "display accepted");
        true
    }

    fn present<P: Presenter + ?Sized>(&mut self, expression: Expression, presenter: &mut P) {
        if expression == Expression::Neutral {
            presenter.hide_light_sphere();
        } else {
            let family = expression.family();
            presenter.show_coloured_light(family.light_colour());
            presenter.play_sound(family.as_str());
            presenter.tails_emotion(family.tail_animation());
        }
        presenter.set_face_expression(expression.as_str());
        self.current_face = expression;
    }

    /// Service deadlines and the passive channel.
    pub fn update<P: Presenter + ?Sized>(&mut self, now: f64, mood: AffectiveLabel, presenter: &mut P) {
        if !self.initialized {
            return;
        }

        if self.reset_at.is_some_and(|t| now >= t) {
            self.reset_at = None;
            self.try_display(Expression::Neutral, None, true, now, presenter);
        }

        if self.thought_hide_at.is_some_and(|t| now >= t) {
            self.thought_hide_at = None;
            presenter.hide_thought();
        }

        if self.state.is_showing_emotional_display || self.state.is_asleep {
            return;
        }
        if self.next_passive_at.is_none_or(|t| now >= t) {
            self.next_passive_at = Some(now + self.config.passive_update_interval_secs);
            let face = mood.passive_expression();
            if face != self.current_face {
                debug!(face = %face, mood = %mood, "passive face");
                presenter.set_face_expression(face.as_str());
                self.current_face = face;
            }
        }
    }

    /// Fall asleep. Returns `false` if already asleep.
    pub fn enter_sleep<P: Presenter + ?Sized>(&mut self, now: f64, presenter: &mut P) -> bool {
        if self.state.is_asleep {
            return false;
        }
        self.state.is_asleep = true;
        self.state.is_showing_emotional_display = false;
        self.state.sleep_start_time = Some(now);
        self.state.current_display = Expression::Sleep;
        self.state.current_trigger = None;
        self.reset_at = None;
        self.thought_hide_at = None;

        presenter.hide_light_sphere();
        presenter.set_face_expression(Expression::Sleep.as_str());
        presenter.show_thought("sleep");
        presenter.tails_emotion(Expression::Sleep.family().tail_animation());
        self.current_face = Expression::Sleep;

        info!(at = now, "fell asleep");
        true
    }

    /// Wake up. Returns how long the companion slept, or `None` if awake.
    ///
    /// A natural wake hides the sleep thought at once and plays the wake-up
    /// tail. An interrupt leaves the thought up for one thought duration.
    pub fn wake<P: Presenter + ?Sized>(&mut self, now: f64, cause: WakeCause, presenter: &mut P) -> Option<f64> {
        if !self.state.is_asleep {
            return None;
        }
        let slept = self.state.sleep_start_time.map_or(0.0, |start| (now - start).max(0.0));
        self.state.is_asleep = false;
        self.state.sleep_start_time = None;
        self.state.current_display = Expression::Neutral;
        self.state.current_trigger = None;
        self.next_passive_at = Some(now);

        match cause {
            WakeCause::Natural => {
                self.thought_hide_at = None;
                presenter.hide_thought();
                presenter.tails_emotion("wakeup");
            }
            WakeCause::Interrupt => {
                self.thought_hide_at = Some(now + self.config.thought_duration_secs);
            }
        }

        info!(?cause, slept_secs = slept, "woke up");
        Some(slept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presentation::{CommandLog, PresentationCommand};

    fn ready() -> (DisplayArbiter, CommandLog) {
        let mut arbiter = DisplayArbiter::new(&DisplayConfig::default());
        arbiter.initialize(0.0);
        (arbiter, CommandLog::new())
    }

    #[test]
    fn rejects_before_initialize() {
        let mut arbiter = DisplayArbiter::new(&DisplayConfig::default());
        let mut log = CommandLog::new();
        assert!(!arbiter.try_display(Expression::Happy, None, true, 0.0, &mut log));
        assert!(log.commands().is_empty());
    }

    #[test]
    fn accepted_display_presents_family_commands() {
        let (mut arbiter, mut log) = ready();
        assert!(arbiter.try_display(Expression::Cheerful, None, false, 1.0, &mut log));

        assert!(log.contains(&PresentationCommand::ShowColouredLight("pink".into())));
        assert!(log.contains(&PresentationCommand::PlaySound("happy".into())));
        assert!(log.contains(&PresentationCommand::SetFaceExpression("cheerful".into())));
        assert!(log.contains(&PresentationCommand::TailsEmotion("horizontal wag".into())));
        assert_eq!(arbiter.phase(), ArbiterPhase::Displaying(Expression::Cheerful));
        assert_eq!(arbiter.reset_deadline(), Some(5.0));
    }

    #[test]
    fn second_display_is_rejected_while_busy_and_in_cooldown() {
        let (mut arbiter, mut log) = ready();
        assert!(arbiter.try_display(Expression::Happy, None, false, 0.0, &mut log));
        assert_eq!(arbiter.check(Expression::Sad, false, 1.0), Err(Rejection::Busy));

        arbiter.update(4.0, AffectiveLabel::Happy, &mut log);
        assert_eq!(arbiter.phase(), ArbiterPhase::Idle);
        assert_eq!(arbiter.check(Expression::Sad, false, 5.0), Err(Rejection::Cooldown));
        assert!(arbiter.try_display(Expression::Sad, None, false, 6.0, &mut log));
    }

    #[test]
    fn bypass_ignores_cooldown_and_busy() {
        let (mut arbiter, mut log) = ready();
        assert!(arbiter.try_display(Expression::Happy, None, false, 0.0, &mut log));
        assert!(arbiter.try_display(Expression::LoudNoise, None, true, 0.5, &mut log));
        assert_eq!(arbiter.state().current_display, Expression::LoudNoise);
    }

    #[test]
    fn auto_reset_returns_to_neutral() {
        let (mut arbiter, mut log) = ready();
        arbiter.try_display(Expression::Angry, None, false, 0.0, &mut log);
        log.drain();

        arbiter.update(3.9, AffectiveLabel::Happy, &mut log);
        assert!(arbiter.state().is_showing_emotional_display);

        arbiter.update(4.0, AffectiveLabel::Happy, &mut log);
        assert!(!arbiter.state().is_showing_emotional_display);
        assert_eq!(arbiter.state().current_display, Expression::Neutral);
        assert!(log.contains(&PresentationCommand::HideLightSphere));
        assert_eq!(log.last_face(), Some("neutral"));
    }

    #[test]
    fn neutral_is_idempotent_and_does_not_start_cooldown() {
        let (mut arbiter, mut log) = ready();
        assert!(arbiter.try_display(Expression::Neutral, None, true, 2.0, &mut log));
        let once = arbiter.state().clone();
        assert!(arbiter.try_display(Expression::Neutral, None, true, 2.0, &mut log));
        assert_eq!(arbiter.state(), &once);
        assert_eq!(once.last_display_time, None);
        assert!(arbiter.try_display(Expression::Happy, None, false, 2.1, &mut log));
    }

    #[test]
    fn overlay_thought_follows_the_trigger_not_the_display() {
        let (mut arbiter, mut log) = ready();
        arbiter.try_display(Expression::Ecstatic, Some(Trigger::HungerNeeded), false, 0.0, &mut log);
        assert!(log.contains(&PresentationCommand::ShowThought("hunger".into())));

        log.drain();
        arbiter.update(3.0, AffectiveLabel::Happy, &mut log);
        assert!(log.contains(&PresentationCommand::HideThought));
    }

    #[test]
    fn asleep_rejects_everything_but_the_wake_override() {
        let (mut arbiter, mut log) = ready();
        assert!(arbiter.enter_sleep(0.0, &mut log));
        assert!(!arbiter.enter_sleep(1.0, &mut log));

        assert_eq!(arbiter.check(Expression::Happy, true, 10.0), Err(Rejection::Asleep));
        assert!(arbiter.try_display(Expression::LoudNoise, None, true, 10.0, &mut log));
        assert!(!arbiter.state().is_asleep);
        assert!(arbiter.state().is_showing_emotional_display);
    }

    #[test]
    fn sleep_and_showing_are_exclusive() {
        let (mut arbiter, mut log) = ready();
        arbiter.try_display(Expression::Happy, None, false, 0.0, &mut log);
        arbiter.enter_sleep(1.0, &mut log);
        let state = arbiter.state();
        assert!(state.is_asleep && !state.is_showing_emotional_display);
        assert_eq!(arbiter.reset_deadline(), None);
    }

    #[test]
    fn natural_wake_hides_thought_and_wags_awake() {
        let (mut arbiter, mut log) = ready();
        arbiter.enter_sleep(5.0, &mut log);
        log.drain();

        assert_eq!(arbiter.wake(65.0, WakeCause::Natural, &mut log), Some(60.0));
        assert_eq!(
            log.commands(),
            &[
                PresentationCommand::HideThought,
                PresentationCommand::TailsEmotion("wakeup".into()),
            ]
        );
        assert_eq!(arbiter.wake(66.0, WakeCause::Natural, &mut log), None);
    }

    #[test]
    fn waking_clears_the_sleep_display() {
        let (mut arbiter, mut log) = ready();
        arbiter.enter_sleep(0.0, &mut log);
        assert_eq!(arbiter.state().current_display, Expression::Sleep);

        arbiter.wake(10.0, WakeCause::Interrupt, &mut log);
        assert_eq!(arbiter.state().current_display, Expression::Neutral);
        assert_eq!(arbiter.phase(), ArbiterPhase::Idle);
    }

    #[test]
    fn passive_face_tracks_mood_only_while_idle() {
        let (mut arbiter, mut log) = ready();
        arbiter.update(0.0, AffectiveLabel::Relaxed, &mut log);
        assert_eq!(log.last_face(), Some("relaxed"));

        // Unchanged mood: no repeat command.
        log.drain();
        arbiter.update(2.0, AffectiveLabel::Relaxed, &mut log);
        assert!(log.commands().is_empty());

        arbiter.try_display(Expression::Angry, None, false, 2.5, &mut log);
        log.drain();
        arbiter.update(4.5, AffectiveLabel::Sad, &mut log);
        assert!(log.last_face().is_none());
    }

    #[test]
    fn passive_channel_waits_for_its_interval() {
        let (mut arbiter, mut log) = ready();
        arbiter.update(0.0, AffectiveLabel::Happy, &mut log);
        log.drain();
        arbiter.update(1.0, AffectiveLabel::Sad, &mut log);
        assert!(log.commands().is_empty());
        arbiter.update(2.0, AffectiveLabel::Sad, &mut log);
        assert_eq!(log.last_face(), Some("sad"));
    }
}
