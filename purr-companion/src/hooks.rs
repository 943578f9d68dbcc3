//! Sensor hooks.
//!
//! The free functions turn raw device readings (touch zones, head angle)
//! into [`SensorEvent`]s. [`SensorHooks`] then resolves events into engine
//! triggers, keeping the little state that edge detection needs: whether
//! the user is already too far away, which way they were facing, and when
//! the last loud noise fired.

use purr_core::Trigger;
use tracing::{debug, warn};

use crate::config::SensorsConfig;
use crate::events::{KeywordKind, SensorEvent, StrokeDirection};

/// Touch-sensitive zone on the companion's back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchZone {
    /// Near the head.
    Front,
    /// Near the tail.
    Back,
    /// Left flank.
    Left,
    /// Right flank.
    Right,
}

/// Build a stroke event from the first and last zones touched.
///
/// Returns `None` if the sweep took longer than `max_secs` or the zones do
/// not form a stroke.
#[must_use]
pub fn on_stroke(
    first: TouchZone,
    last: TouchZone,
    elapsed_secs: f64,
    max_secs: f64,
) -> Option<SensorEvent> {
    if elapsed_secs > max_secs {
        debug!(elapsed_secs, max_secs, "stroke too slow");
        return None;
    }
    let direction = match (first, last) {
        (TouchZone::Front, TouchZone::Back) => StrokeDirection::FrontToBack,
        (TouchZone::Back, TouchZone::Front) => StrokeDirection::BackToFront,
        (TouchZone::Left, TouchZone::Right) | (TouchZone::Right, TouchZone::Left) => {
            StrokeDirection::Sideways
        }
        _ => return None,
    };
    Some(SensorEvent::Stroke { direction })
}

/// Build a gaze event from the angle between the user's head direction and
/// the direction to the companion.
#[must_use]
pub fn on_head_angle(angle_degrees: f32, threshold_degrees: f32) -> SensorEvent {
    SensorEvent::Gaze {
        facing: angle_degrees < threshold_degrees,
    }
}

/// Build a keyword event from recogniser output.
#[must_use]
pub fn on_phrase(phrase: impl Into<String>) -> SensorEvent {
    SensorEvent::Keyword {
        phrase: phrase.into(),
    }
}

/// Lowercase alphanumeric tokens.
fn tokens(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Word lists, pre-tokenised. Multi-word entries ("good morning") match
/// as a contiguous run.
#[derive(Debug, Clone, Default)]
struct WordLists {
    name: Vec<Vec<String>>,
    greeting: Vec<Vec<String>>,
    food: Vec<Vec<String>>,
}

impl WordLists {
    fn from_config(config: &SensorsConfig) -> Self {
        let prepare = |words: &[String]| -> Vec<Vec<String>> {
            words
                .iter()
                .map(|w| tokens(w))
                .filter(|t| !t.is_empty())
                .collect()
        };
        Self {
            name: prepare(&config.name_words),
            greeting: prepare(&config.greeting_words),
            food: prepare(&config.food_words),
        }
    }

    fn any_in(list: &[Vec<String>], phrase: &[String]) -> bool {
        list.iter().any(|entry| {
            phrase
                .windows(entry.len())
                .any(|window| window == entry.as_slice())
        })
    }
}

/// Which keyword kinds a phrase contains, in name, greeting, food order.
/// Each kind appears at most once.
#[must_use]
pub fn spot_keywords(phrase: &str, config: &SensorsConfig) -> Vec<KeywordKind> {
    spot_with(&WordLists::from_config(config), phrase)
}

fn spot_with(lists: &WordLists, phrase: &str) -> Vec<KeywordKind> {
    let words = tokens(phrase);
    [
        (KeywordKind::Name, &lists.name),
        (KeywordKind::Greeting, &lists.greeting),
        (KeywordKind::Food, &lists.food),
    ]
    .into_iter()
    .filter(|(_, list)| WordLists::any_in(list, &words))
    .map(|(kind, _)| kind)
    .collect()
}

/// Stateful event resolver.
#[derive(Debug, Clone)]
pub struct SensorHooks {
    config: SensorsConfig,
    words: WordLists,
    too_far: bool,
    facing: bool,
    last_loud: Option<f64>,
}

impl SensorHooks {
    /// Hooks with no history. The user starts close and not facing.
    #[must_use]
    pub fn new(config: SensorsConfig) -> Self {
        Self {
            words: WordLists::from_config(&config),
            config,
            too_far: false,
            facing: false,
            last_loud: None,
        }
    }

    /// Resolve one event into zero or more triggers. `now` is the engine
    /// clock, used to space out loud-noise reactions.
    pub fn observe(&mut self, event: &SensorEvent, now: f64) -> Vec<Trigger> {
        let triggers = match event {
            SensorEvent::Keyword { phrase } => spot_with(&self.words, phrase)
                .into_iter()
                .map(KeywordKind::trigger)
                .collect(),
            SensorEvent::Proximity { meters } => self.proximity(*meters).into_iter().collect(),
            SensorEvent::Gaze { facing } => self.gaze(*facing).into_iter().collect(),
            SensorEvent::Loudness { level } => self.loudness(*level, now).into_iter().collect(),
            SensorEvent::Raw { name } => match event.direct_trigger() {
                Some(t) => vec![t],
                None => {
                    warn!(name = %name, "unknown event name");
                    Vec::new()
                }
            },
            SensorEvent::Stroke { .. } | SensorEvent::Held => {
                event.direct_trigger().into_iter().collect()
            }
        };
        if !triggers.is_empty() {
            debug!(sensor = event.kind(), ?triggers, "sensor event resolved");
        }
        triggers
    }

    /// Fires once when the distance first exceeds the limit; re-arms when
    /// the user comes back within it.
    fn proximity(&mut self, meters: f32) -> Option<Trigger> {
        if meters.is_nan() {
            return None;
        }
        let far = meters > self.config.too_far_meters;
        let crossed = far && !self.too_far;
        self.too_far = far;
        crossed.then_some(Trigger::TooFarAway)
    }

    fn gaze(&mut self, facing: bool) -> Option<Trigger> {
        if facing == self.facing {
            return None;
        }
        self.facing = facing;
        Some(if facing {
            Trigger::LookingTowards
        } else {
            Trigger::LookingAway
        })
    }

    fn loudness(&mut self, level: f32, now: f64) -> Option<Trigger> {
        if level.is_nan() || level <= self.config.loudness_threshold {
            return None;
        }
        let rested = self
            .last_loud
            .is_none_or(|t| now - t >= self.config.loudness_min_interval_secs);
        if !rested {
            return None;
        }
        self.last_loud = Some(now);
        Some(Trigger::LoudNoise)
    }

    /// [`on_stroke`] with the configured time limit.
    #[must_use]
    pub fn stroke(&self, first: TouchZone, last: TouchZone, elapsed_secs: f64) -> Option<SensorEvent> {
        on_stroke(first, last, elapsed_secs, self.config.max_stroke_secs)
    }

    /// Whether the user is currently beyond the distance limit.
    #[must_use]
    pub fn is_too_far(&self) -> bool {
        self.too_far
    }

    /// Whether the user is currently facing the companion.
    #[must_use]
    pub fn is_facing(&self) -> bool {
        self.facing
    }

    /// The configured thresholds.
    #[must_use]
    pub fn config(&self) -> &SensorsConfig {
        &self.config
    }
}
