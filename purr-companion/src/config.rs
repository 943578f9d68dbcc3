//! Companion configuration.
//!
//! One `purr.toml` carries both the engine sections (`[gauges]`, `[mood]`,
//! `[display]`, ...) and the companion-only `[runtime]` and `[sensors]`
//! tables. The engine part is flattened into [`PurrConfig`].

use purr_core::error::Result;
use purr_core::{PurrConfig, PurrError};
use serde::{Deserialize, Serialize};

/// Everything the companion binary needs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompanionConfig {
    /// Engine configuration.
    #[serde(flatten)]
    pub engine: PurrConfig,
    /// Driving loop.
    #[serde(default)]
    pub runtime: RuntimeConfig,
    /// Sensor adapters.
    #[serde(default)]
    pub sensors: SensorsConfig,
}

/// Driving loop timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Engine tick period in milliseconds.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// Bounded capacity of the inbound sensor queue.
    #[serde(default = "default_event_queue_capacity")]
    pub event_queue_capacity: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            event_queue_capacity: default_event_queue_capacity(),
        }
    }
}

/// Thresholds and word lists for the sensor hooks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorsConfig {
    /// Beyond this distance the companion feels left behind.
    #[serde(default = "default_too_far_meters")]
    pub too_far_meters: f32,
    /// Average amplitude that counts as a loud noise.
    #[serde(default = "default_loudness_threshold")]
    pub loudness_threshold: f32,
    /// Minimum seconds between two loud-noise reactions.
    #[serde(default = "default_loudness_min_interval_secs")]
    pub loudness_min_interval_secs: f64,
    /// Longest front-to-back sweep, in seconds, still counted as a stroke.
    #[serde(default = "default_max_stroke_secs")]
    pub max_stroke_secs: f64,
    /// Head-to-companion angle under which the user counts as facing it.
    #[serde(default = "default_gaze_angle_degrees")]
    pub gaze_angle_degrees: f32,
    /// Words that mean the companion's name was said.
    #[serde(default = "default_name_words")]
    pub name_words: Vec<String>,
    /// Greeting words.
    #[serde(default = "default_greeting_words")]
    pub greeting_words: Vec<String>,
    /// Food words.
    #[serde(default = "default_food_words")]
    pub food_words: Vec<String>,
}

impl Default for SensorsConfig {
    fn default() -> Self {
        Self {
            too_far_meters: default_too_far_meters(),
            loudness_threshold: default_loudness_threshold(),
            loudness_min_interval_secs: default_loudness_min_interval_secs(),
            max_stroke_secs: default_max_stroke_secs(),
            gaze_angle_degrees: default_gaze_angle_degrees(),
            name_words: default_name_words(),
            greeting_words: default_greeting_words(),
            food_words: default_food_words(),
        }
    }
}

impl CompanionConfig {
    /// Parse and validate a TOML document.
    ///
    /// # Errors
    /// Returns `PurrError::Config` on bad TOML or out-of-range values.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(toml_str).map_err(|e| PurrError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or is invalid.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Check engine and companion values.
    ///
    /// # Errors
    /// Returns `PurrError::Config` naming the first bad field.
    pub fn validate(&self) -> Result<()> {
        self.engine.validate()?;

        if self.runtime.tick_interval_ms == 0 {
            return Err(PurrError::Config("runtime.tick_interval_ms must be > 0".into()));
        }
        if self.runtime.event_queue_capacity == 0 {
            return Err(PurrError::Config(
                "runtime.event_queue_capacity must be > 0".into(),
            ));
        }

        let s = &self.sensors;
        if !(s.too_far_meters.is_finite() && s.too_far_meters > 0.0) {
            return Err(PurrError::Config("sensors.too_far_meters must be > 0".into()));
        }
        if !(s.loudness_threshold.is_finite() && s.loudness_threshold > 0.0) {
            return Err(PurrError::Config("sensors.loudness_threshold must be > 0".into()));
        }
        if !(s.loudness_min_interval_secs.is_finite() && s.loudness_min_interval_secs >= 0.0) {
            return Err(PurrError::Config(
                "sensors.loudness_min_interval_secs must be >= 0".into(),
            ));
        }
        if !(s.max_stroke_secs.is_finite() && s.max_stroke_secs > 0.0) {
            return Err(PurrError::Config("sensors.max_stroke_secs must be > 0".into()));
        }
        if !(s.gaze_angle_degrees > 0.0 && s.gaze_angle_degrees <= 180.0) {
            return Err(PurrError::Config(
                "sensors.gaze_angle_degrees must be in (0, 180]".into(),
            ));
        }
        Ok(())
    }

    /// Tick period as a `Duration`.
    #[must_use]
    pub fn tick_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.runtime.tick_interval_ms)
    }
}

// -- serde default helpers ----------------------------------------------------

fn default_tick_interval_ms() -> u64 {
    100
}
fn default_event_queue_capacity() -> usize {
    64
}
fn default_too_far_meters() -> f32 {
    1.5
}
fn default_loudness_threshold() -> f32 {
    0.05
}
fn default_loudness_min_interval_secs() -> f64 {
    2.0
}
fn default_max_stroke_secs() -> f64 {
    1.0
}
fn default_gaze_angle_degrees() -> f32 {
    10.0
}
fn default_name_words() -> Vec<String> {
    vec!["purr".into(), "kitty".into()]
}
fn default_greeting_words() -> Vec<String> {
    ["hello", "hi", "hey", "morning", "evening"]
        .into_iter()
        .map(String::from)
        .collect()
}
fn default_food_words() -> Vec<String> {
    ["food", "dinner", "breakfast", "treat", "snack", "fish"]
        .into_iter()
        .map(String::from)
        .collect()
}
