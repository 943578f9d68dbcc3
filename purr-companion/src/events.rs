//! Sensor events that feed the emotion engine.
//!
//! Discrete gestures (strokes, being held, spotted keywords) map straight
//! onto a [`Trigger`]. Continuous readings (distance, gaze, loudness) carry a
//! value and only become triggers once [`crate::hooks::SensorHooks`] sees an
//! edge.

use std::fmt;

use purr_core::Trigger;
use serde::{Deserialize, Serialize};

/// Direction of a stroke along the back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrokeDirection {
    /// Head to tail.
    FrontToBack,
    /// Tail to head, against the fur.
    BackToFront,
    /// Side to side. Recognised but not something the companion reacts to.
    Sideways,
}

/// Which word list a spotted keyword came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeywordKind {
    /// The companion's name.
    Name,
    /// A greeting ("hello", "morning", ...).
    Greeting,
    /// Something edible.
    Food,
}

impl KeywordKind {
    /// The trigger a keyword of this kind raises.
    #[must_use]
    pub fn trigger(self) -> Trigger {
        match self {
            Self::Name => Trigger::NameHeard,
            Self::Greeting => Trigger::GreetingHeard,
            Self::Food => Trigger::FoodHeard,
        }
    }
}

/// One reading or gesture from the companion's sensors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "sensor", rename_all = "snake_case")]
pub enum SensorEvent {
    /// A completed stroke.
    Stroke {
        /// Which way the hand moved.
        direction: StrokeDirection,
    },
    /// The companion was picked up.
    Held,
    /// A transcribed phrase from the speech recogniser.
    Keyword {
        /// Raw recogniser text.
        phrase: String,
    },
    /// Distance from the user.
    Proximity {
        /// Metres.
        meters: f32,
    },
    /// Whether the user is facing the companion.
    Gaze {
        /// `true` while the user looks towards it.
        facing: bool,
    },
    /// Microphone loudness.
    Loudness {
        /// Average absolute sample amplitude.
        level: f32,
    },
    /// An event already named in engine vocabulary.
    Raw {
        /// Trigger name, case-insensitive.
        name: String,
    },
}

impl SensorEvent {
    /// The trigger for gestures that need no history. `None` for readings
    /// that go through edge detection, sideways strokes and keyword phrases.
    #[must_use]
    pub fn direct_trigger(&self) -> Option<Trigger> {
        match self {
            Self::Stroke {
                direction: StrokeDirection::FrontToBack,
            } => Some(Trigger::StrokeFrontToBack),
            Self::Stroke {
                direction: StrokeDirection::BackToFront,
            } => Some(Trigger::StrokeBackToFront),
            Self::Held => Some(Trigger::BeingHeld),
            Self::Raw { name } => name.parse().ok(),
            Self::Stroke {
                direction: StrokeDirection::Sideways,
            }
            | Self::Keyword { .. }
            | Self::Proximity { .. }
            | Self::Gaze { .. }
            | Self::Loudness { .. } => None,
        }
    }

    /// Short sensor name for logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Stroke { .. } => "stroke",
            Self::Held => "held",
            Self::Keyword { .. } => "keyword",
            Self::Proximity { .. } => "proximity",
            Self::Gaze { .. } => "gaze",
            Self::Loudness { .. } => "loudness",
            Self::Raw { .. } => "raw",
        }
    }
}

impl fmt::Display for SensorEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stroke { direction } => write!(f, "stroke({direction:?})"),
            Self::Held => f.write_str("held"),
            Self::Keyword { phrase } => write!(f, "keyword({phrase:?})"),
            Self::Proximity { meters } => write!(f, "proximity({meters:.2}m)"),
            Self::Gaze { facing } => write!(f, "gaze(facing={facing})"),
            Self::Loudness { level } => write!(f, "loudness({level:.4})"),
            Self::Raw { name } => write!(f, "raw({name})"),
        }
    }
}

impl From<Trigger> for SensorEvent {
    fn from(trigger: Trigger) -> Self {
        Self::Raw {
            name: trigger.as_str().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strokes_map_by_direction() {
        let e = SensorEvent::Stroke {
            direction: StrokeDirection::FrontToBack,
        };
        assert_eq!(e.direct_trigger(), Some(Trigger::StrokeFrontToBack));
        let e = SensorEvent::Stroke {
            direction: StrokeDirection::BackToFront,
        };
        assert_eq!(e.direct_trigger(), Some(Trigger::StrokeBackToFront));
        let e = SensorEvent::Stroke {
            direction: StrokeDirection::Sideways,
        };
        assert_eq!(e.direct_trigger(), None);
    }

    #[test]
    fn raw_names_parse_case_insensitively() {
        let e = SensorEvent::Raw {
            name: "loudnoise".into(),
        };
        assert_eq!(e.direct_trigger(), Some(Trigger::LoudNoise));
        let e = SensorEvent::Raw {
            name: "Purring".into(),
        };
        assert_eq!(e.direct_trigger(), None);
    }

    #[test]
    fn readings_need_edge_detection() {
        assert_eq!(SensorEvent::Proximity { meters: 9.0 }.direct_trigger(), None);
        assert_eq!(SensorEvent::Gaze { facing: true }.direct_trigger(), None);
        assert_eq!(SensorEvent::Loudness { level: 1.0 }.direct_trigger(), None);
    }

    #[test]
    fn sensor_event_json_is_tagged() {
        let json = serde_json::to_string(&SensorEvent::Proximity { meters: 2.5 }).expect("encode");
        assert_eq!(json, r#"{"sensor":"proximity","meters":2.5}"#);
        let back: SensorEvent = serde_json::from_str(r#"{"sensor":"held"}"#).expect("decode");
        assert_eq!(back, SensorEvent::Held);
    }

    #[test]
    fn keyword_kinds_map_to_heard_triggers() {
        assert_eq!(KeywordKind::Name.trigger(), Trigger::NameHeard);
        assert_eq!(KeywordKind::Greeting.trigger(), Trigger::GreetingHeard);
        assert_eq!(KeywordKind::Food.trigger(), Trigger::FoodHeard);
    }
}
