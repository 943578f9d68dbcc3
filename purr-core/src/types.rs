//! Core type definitions for the purr affect engine.
//!
//! Every label the engine produces is a closed enum here; strings only
//! appear at the edges (sensor names, table rows, presenter commands).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Identity Types
// ---------------------------------------------------------------------------

/// Identifier for one engine session (init → shutdown), used in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    /// Create a new random session ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Returned by the `FromStr` impls in this module for names outside the
/// fixed vocabulary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownName(pub String);

impl fmt::Display for UnknownName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown name: {:?}", self.0)
    }
}

impl std::error::Error for UnknownName {}

// ---------------------------------------------------------------------------
// Needs
// ---------------------------------------------------------------------------

/// One of the four decaying need gauges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Need {
    /// Wants to be stroked or held.
    Touch,
    /// Wants to sleep. Reaching zero puts the companion to sleep.
    Rest,
    /// Wants company and attention.
    Social,
    /// Wants food.
    Hunger,
}

impl Need {
    /// All needs in gauge order.
    pub const ALL: [Need; 4] = [Need::Touch, Need::Rest, Need::Social, Need::Hunger];

    /// Capitalised name, as used in event names (`TouchNeeded`).
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Touch => "Touch",
            Self::Rest => "Rest",
            Self::Social => "Social",
            Self::Hunger => "Hunger",
        }
    }

    /// Position of this need in [`Need::ALL`].
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            Self::Touch => 0,
            Self::Rest => 1,
            Self::Social => 2,
            Self::Hunger => 3,
        }
    }
}

impl fmt::Display for Need {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Need {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Need::ALL
            .into_iter()
            .find(|need| need.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownName(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Trigger events
// ---------------------------------------------------------------------------

/// A named discrete stimulus. Sensors and the gauge bank raise these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Trigger {
    /// Stroked along the fur.
    StrokeFrontToBack,
    /// Stroked against the fur.
    StrokeBackToFront,
    /// Picked up and held.
    BeingHeld,
    /// Touch gauge dropped below its needed threshold.
    TouchNeeded,
    /// Touch gauge rose above its fulfilled threshold.
    TouchFulfilled,
    /// Rest gauge dropped below its needed threshold.
    RestNeeded,
    /// Rest gauge rose above its fulfilled threshold.
    RestFulfilled,
    /// Social gauge dropped below its needed threshold.
    SocialNeeded,
    /// Social gauge rose above its fulfilled threshold.
    SocialFulfilled,
    /// Hunger gauge dropped below its needed threshold.
    HungerNeeded,
    /// Hunger gauge rose above its fulfilled threshold.
    HungerFulfilled,
    /// A sudden loud sound. Wakes the companion and skips the table.
    LoudNoise,
    /// The companion's name was spoken.
    NameHeard,
    /// A greeting was spoken.
    GreetingHeard,
    /// A food word was spoken.
    FoodHeard,
    /// The user moved out of comfortable range.
    TooFarAway,
    /// The user turned to face the companion.
    LookingTowards,
    /// The user turned away.
    LookingAway,
}

impl Trigger {
    /// Every known trigger.
    pub const ALL: [Trigger; 18] = [
        Trigger::StrokeFrontToBack,
        Trigger::StrokeBackToFront,
        Trigger::BeingHeld,
        Trigger::TouchNeeded,
        Trigger::TouchFulfilled,
        Trigger::RestNeeded,
        Trigger::RestFulfilled,
        Trigger::SocialNeeded,
        Trigger::SocialFulfilled,
        Trigger::HungerNeeded,
        Trigger::HungerFulfilled,
        Trigger::LoudNoise,
        Trigger::NameHeard,
        Trigger::GreetingHeard,
        Trigger::FoodHeard,
        Trigger::TooFarAway,
        Trigger::LookingTowards,
        Trigger::LookingAway,
    ];

    /// Canonical event name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::StrokeFrontToBack => "StrokeFrontToBack",
            Self::StrokeBackToFront => "StrokeBackToFront",
            Self::BeingHeld => "BeingHeld",
            Self::TouchNeeded => "TouchNeeded",
            Self::TouchFulfilled => "TouchFulfilled",
            Self::RestNeeded => "RestNeeded",
            Self::RestFulfilled => "RestFulfilled",
            Self::SocialNeeded => "SocialNeeded",
            Self::SocialFulfilled => "SocialFulfilled",
            Self::HungerNeeded => "HungerNeeded",
            Self::HungerFulfilled => "HungerFulfilled",
            Self::LoudNoise => "LoudNoise",
            Self::NameHeard => "NameHeard",
            Self::GreetingHeard => "GreetingHeard",
            Self::FoodHeard => "FoodHeard",
            Self::TooFarAway => "TooFarAway",
            Self::LookingTowards => "LookingTowards",
            Self::LookingAway => "LookingAway",
        }
    }

    /// The `<Need>Needed` event for a gauge.
    #[must_use]
    pub fn needed(need: Need) -> Self {
        match need {
            Need::Touch => Self::TouchNeeded,
            Need::Rest => Self::RestNeeded,
            Need::Social => Self::SocialNeeded,
            Need::Hunger => Self::HungerNeeded,
        }
    }

    /// The `<Need>Fulfilled` event for a gauge.
    #[must_use]
    pub fn fulfilled(need: Need) -> Self {
        match need {
            Need::Touch => Self::TouchFulfilled,
            Need::Rest => Self::RestFulfilled,
            Need::Social => Self::SocialFulfilled,
            Need::Hunger => Self::HungerFulfilled,
        }
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Trigger {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Trigger::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownName(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Affect: valence × arousal
// ---------------------------------------------------------------------------

/// Lower bound of both affect axes.
pub const AFFECT_MIN: f32 = -10.0;
/// Upper bound of both affect axes.
pub const AFFECT_MAX: f32 = 10.0;

/// Clamp one affect axis. NaN collapses to 0.
#[must_use]
pub fn clamp_axis(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(AFFECT_MIN, AFFECT_MAX)
    }
}

/// A point on the valence/arousal plane, always inside [-10, 10]².
///
/// - **Valence**: very negative (-10) → very positive (+10)
/// - **Arousal**: very calm (-10) → very excited (+10)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Affect {
    /// Pleasantness.
    pub valence: f32,
    /// Energy / activation.
    pub arousal: f32,
}

impl Affect {
    /// The origin.
    pub const NEUTRAL: Self = Self {
        valence: 0.0,
        arousal: 0.0,
    };

    /// Create an affect point, clamping both axes to [-10, 10].
    #[must_use]
    pub fn new(valence: f32, arousal: f32) -> Self {
        Self {
            valence: clamp_axis(valence),
            arousal: clamp_axis(arousal),
        }
    }

    /// Move by a delta, clamping the result.
    #[must_use]
    pub fn shifted(self, d_valence: f32, d_arousal: f32) -> Self {
        Self::new(self.valence + d_valence, self.arousal + d_arousal)
    }

    /// Component-wise difference `self - other` (not clamped).
    #[must_use]
    pub fn delta_from(self, other: Self) -> (f32, f32) {
        (self.valence - other.valence, self.arousal - other.arousal)
    }
}

impl fmt::Display for Affect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(v={:.2}, a={:.2})", self.valence, self.arousal)
    }
}

// ---------------------------------------------------------------------------
// Affective labels (coarse classifier output)
// ---------------------------------------------------------------------------

/// Named affective state produced by the coarse mood classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AffectiveLabel {
    /// Positive and activated.
    Excited,
    /// Positive, moderate energy.
    Happy,
    /// Positive and calm.
    Relaxed,
    /// Neutral valence, very high arousal.
    Surprised,
    /// Neutral valence, high arousal.
    Energetic,
    /// Centre of the plane.
    Neutral,
    /// Neutral valence, low arousal.
    Tired,
    /// Mildly negative and activated.
    Tense,
    /// Very negative, very high arousal.
    Scared,
    /// Very negative, high arousal.
    Angry,
    /// Negative, moderate energy.
    Miserable,
    /// Negative and low energy.
    Sad,
    /// Negative and very low energy.
    Gloomy,
    /// Asleep. Never produced from a valence/arousal point.
    Sleep,
}

impl AffectiveLabel {
    /// Every label, in table order.
    pub const ALL: [AffectiveLabel; 14] = [
        AffectiveLabel::Excited,
        AffectiveLabel::Happy,
        AffectiveLabel::Relaxed,
        AffectiveLabel::Surprised,
        AffectiveLabel::Energetic,
        AffectiveLabel::Neutral,
        AffectiveLabel::Tired,
        AffectiveLabel::Tense,
        AffectiveLabel::Scared,
        AffectiveLabel::Angry,
        AffectiveLabel::Miserable,
        AffectiveLabel::Sad,
        AffectiveLabel::Gloomy,
        AffectiveLabel::Sleep,
    ];

    /// Capitalised label name, as written in the response table.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Excited => "Excited",
            Self::Happy => "Happy",
            Self::Relaxed => "Relaxed",
            Self::Surprised => "Surprised",
            Self::Energetic => "Energetic",
            Self::Neutral => "Neutral",
            Self::Tired => "Tired",
            Self::Tense => "Tense",
            Self::Scared => "Scared",
            Self::Angry => "Angry",
            Self::Miserable => "Miserable",
            Self::Sad => "Sad",
            Self::Gloomy => "Gloomy",
            Self::Sleep => "Sleep",
        }
    }

    /// Face shown by the passive expression channel for this mood.
    #[must_use]
    pub fn passive_expression(self) -> Expression {
        match self {
            Self::Excited => Expression::Excited,
            Self::Happy => Expression::Happy,
            Self::Relaxed => Expression::Relaxed,
            Self::Surprised => Expression::Surprised,
            Self::Energetic => Expression::Alert,
            Self::Neutral => Expression::Neutral,
            Self::Tired => Expression::Sleepy,
            Self::Tense => Expression::Tense,
            Self::Scared => Expression::Scared,
            Self::Angry => Expression::Angry,
            Self::Miserable => Expression::Miserable,
            Self::Sad => Expression::Sad,
            Self::Gloomy => Expression::Gloomy,
            Self::Sleep => Expression::Sleep,
        }
    }
}

impl fmt::Display for AffectiveLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AffectiveLabel {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AffectiveLabel::ALL
            .into_iter()
            .find(|l| l.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownName(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Expressions (display strings)
// ---------------------------------------------------------------------------

/// A display the companion can surface. Produced by the fine display table,
/// plus the special `neutral`, `sleep` and `loudnoise` displays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Expression {
    /// Overjoyed and bouncing.
    Ecstatic,
    /// Thrilled.
    Excited,
    /// Plainly happy.
    Happy,
    /// Quietly satisfied.
    Content,
    /// Happy and drowsy.
    HappySleepy,
    /// Bright and upbeat.
    Cheerful,
    /// Mildly pleased.
    Pleased,
    /// At ease.
    Relaxed,
    /// Startled.
    Surprised,
    /// Attentive, ears up.
    Alert,
    /// Resting face.
    Neutral,
    /// Calm and still.
    Calm,
    /// Drowsy.
    Sleepy,
    /// On edge.
    Tense,
    /// Irritated.
    Annoyed,
    /// Mildly unhappy.
    Unhappy,
    /// Sad.
    Sad,
    /// Sad and drowsy.
    SadSleepy,
    /// Frightened.
    Scared,
    /// Angry.
    Angry,
    /// Miserable.
    Miserable,
    /// Withdrawn and low.
    Gloomy,
    /// Asleep.
    Sleep,
    /// Reaction to a sudden loud noise.
    LoudNoise,
}

impl Expression {
    /// Every expression.
    pub const ALL: [Expression; 24] = [
        Expression::Ecstatic,
        Expression::Excited,
        Expression::Happy,
        Expression::Content,
        Expression::HappySleepy,
        Expression::Cheerful,
        Expression::Pleased,
        Expression::Relaxed,
        Expression::Surprised,
        Expression::Alert,
        Expression::Neutral,
        Expression::Calm,
        Expression::Sleepy,
        Expression::Tense,
        Expression::Annoyed,
        Expression::Unhappy,
        Expression::Sad,
        Expression::SadSleepy,
        Expression::Scared,
        Expression::Angry,
        Expression::Miserable,
        Expression::Gloomy,
        Expression::Sleep,
        Expression::LoudNoise,
    ];

    /// The display string handed to the presentation layer.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ecstatic => "ecstatic",
            Self::Excited => "excited",
            Self::Happy => "happy",
            Self::Content => "content",
            Self::HappySleepy => "happy sleepy",
            Self::Cheerful => "cheerful",
            Self::Pleased => "pleased",
            Self::Relaxed => "relaxed",
            Self::Surprised => "surprised",
            Self::Alert => "alert",
            Self::Neutral => "neutral",
            Self::Calm => "calm",
            Self::Sleepy => "sleepy",
            Self::Tense => "tense",
            Self::Annoyed => "annoyed",
            Self::Unhappy => "unhappy",
            Self::Sad => "sad",
            Self::SadSleepy => "sad sleepy",
            Self::Scared => "scared",
            Self::Angry => "angry",
            Self::Miserable => "miserable",
            Self::Gloomy => "gloomy",
            Self::Sleep => "sleep",
            Self::LoudNoise => "loudnoise",
        }
    }

    /// The presentation family that picks light, sound and tail.
    #[must_use]
    pub fn family(self) -> ExpressionFamily {
        match self {
            Self::Ecstatic | Self::Excited | Self::Happy | Self::Cheerful | Self::Pleased => {
                ExpressionFamily::Happy
            }
            Self::Content | Self::Relaxed | Self::Calm => ExpressionFamily::Calm,
            Self::Surprised | Self::Alert | Self::LoudNoise => ExpressionFamily::Surprised,
            Self::Neutral => ExpressionFamily::Neutral,
            Self::HappySleepy | Self::Sleepy | Self::SadSleepy | Self::Sleep => {
                ExpressionFamily::Sleepy
            }
            Self::Unhappy | Self::Sad | Self::Miserable | Self::Gloomy => ExpressionFamily::Sad,
            Self::Tense | Self::Scared => ExpressionFamily::Scared,
            Self::Annoyed | Self::Angry => ExpressionFamily::Angry,
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Expression {
    type Err = UnknownName;

    /// Case-insensitive; `_` and `-` are accepted in place of the space in
    /// compound names (`happy_sleepy`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().replace(['_', '-'], " ");
        Expression::ALL
            .into_iter()
            .find(|e| e.as_str().eq_ignore_ascii_case(&normalized))
            .ok_or_else(|| UnknownName(s.to_string()))
    }
}

/// Coarse grouping of expressions shared by the light, sound and tail
/// channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExpressionFamily {
    /// Positive, lively.
    Happy,
    /// Positive or neutral, quiet.
    Calm,
    /// Startled or attentive.
    Surprised,
    /// Baseline.
    Neutral,
    /// Drowsy or asleep.
    Sleepy,
    /// Negative, low energy.
    Sad,
    /// Negative, fearful.
    Scared,
    /// Negative, hostile.
    Angry,
}

impl ExpressionFamily {
    /// Emotion name sent to the light/sound/tail channels.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Happy => "happy",
            Self::Calm => "calm",
            Self::Surprised => "surprised",
            Self::Neutral => "neutral",
            Self::Sleepy => "sleepy",
            Self::Sad => "sad",
            Self::Scared => "scared",
            Self::Angry => "angry",
        }
    }

    /// Colour the light sphere takes for this family.
    #[must_use]
    pub fn light_colour(self) -> &'static str {
        match self {
            Self::Happy => "pink",
            Self::Calm => "green",
            Self::Surprised => "yellow",
            Self::Neutral => "white",
            Self::Sleepy => "purple",
            Self::Sad => "blue",
            Self::Scared => "grey",
            Self::Angry => "red",
        }
    }

    /// Tail animation played for this family.
    #[must_use]
    pub fn tail_animation(self) -> &'static str {
        match self {
            Self::Happy => "horizontal wag",
            Self::Calm => "slow sway",
            Self::Surprised => "surprised",
            Self::Neutral => "rest",
            Self::Sleepy => "sleepy",
            Self::Sad => "droop",
            Self::Scared => "tuck",
            Self::Angry => "bristle",
        }
    }
}

impl fmt::Display for ExpressionFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
