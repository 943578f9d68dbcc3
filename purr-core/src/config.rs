//! Configuration for the purr affect engine.
//!
//! Maps directly to `purr.toml`. Every field has a serde default, so an
//! empty file yields the stock companion.

use serde::{Deserialize, Serialize};

use crate::error::{PurrError, Result};
use crate::types::Need;

/// Top-level engine configuration, loadable from TOML.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PurrConfig {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,
    /// Need gauge thresholds, decay rates and starting values.
    #[serde(default)]
    pub gauges: GaugesConfig,
    /// Long-term/session mood behaviour.
    #[serde(default)]
    pub mood: MoodConfig,
    /// Display arbitration timing.
    #[serde(default)]
    pub display: DisplayConfig,
    /// Sleep cycle.
    #[serde(default)]
    pub sleep: SleepConfig,
    /// Time scaling.
    #[serde(default)]
    pub time: TimeConfig,
    /// Response table source.
    #[serde(default)]
    pub responses: ResponsesConfig,
    /// Baseline persistence.
    #[serde(default)]
    pub persistence: PersistenceConfig,
}

impl PurrConfig {
    /// Load configuration from a TOML string and validate it.
    ///
    /// # Errors
    /// Returns `PurrError::Config` if the TOML is invalid or a value is out
    /// of range.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(toml_str).map_err(|e| PurrError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Check ranges and orderings that serde cannot express.
    ///
    /// # Errors
    /// Returns `PurrError::Config` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        for need in Need::ALL {
            let g = self.gauges.for_need(need);
            let name = need.as_str().to_ascii_lowercase();
            if !(0.0..=100.0).contains(&g.initial) {
                return Err(invalid(format!("gauges.{name}_initial must be in [0, 100]")));
            }
            if !non_negative(g.decay_per_second) {
                return Err(invalid(format!("gauges.{name}_decay_per_second must be >= 0")));
            }
            if !(0.0..=100.0).contains(&g.needed) || !(0.0..=100.0).contains(&g.fulfilled) {
                return Err(invalid(format!("gauges.{name} thresholds must be in [0, 100]")));
            }
            if g.needed >= g.fulfilled {
                return Err(invalid(format!(
                    "gauges.{name}_needed ({}) must be below {name}_fulfilled ({})",
                    g.needed, g.fulfilled
                )));
            }
        }

        let m = &self.mood;
        for (field, v) in [
            ("default_valence", m.default_valence),
            ("default_arousal", m.default_arousal),
        ] {
            if !(-10.0..=10.0).contains(&v) {
                return Err(invalid(format!("mood.{field} must be in [-10, 10]")));
            }
        }
        for (field, v) in [("session_jitter", m.session_jitter), ("fuzz_range", m.fuzz_range)] {
            if !(0.0..=MAX_NOISE_RANGE).contains(&v) {
                return Err(invalid(format!(
                    "mood.{field} must be in [0, {MAX_NOISE_RANGE}]"
                )));
            }
        }
        for (field, v) in [("event_bleed", m.event_bleed), ("session_bleed", m.session_bleed)] {
            if !(0.0..=1.0).contains(&v) {
                return Err(invalid(format!("mood.{field} must be in [0, 1]")));
            }
        }

        let d = &self.display;
        for (field, v) in [
            ("duration_secs", d.duration_secs),
            ("cooldown_secs", d.cooldown_secs),
            ("thought_duration_secs", d.thought_duration_secs),
        ] {
            if !non_negative(v) {
                return Err(invalid(format!("display.{field} must be >= 0")));
            }
        }
        if !positive(d.passive_update_interval_secs) {
            return Err(invalid("display.passive_update_interval_secs must be > 0".into()));
        }

        if !positive(self.sleep.max_duration_secs) {
            return Err(invalid("sleep.max_duration_secs must be > 0".into()));
        }
        if !non_negative(self.sleep.rest_regen_per_second) {
            return Err(invalid("sleep.rest_regen_per_second must be >= 0".into()));
        }
        if !positive(self.time.testing_multiplier) {
            return Err(invalid("time.testing_multiplier must be > 0".into()));
        }
        if !non_negative(self.general.gauge_log_interval_secs) {
            return Err(invalid("general.gauge_log_interval_secs must be >= 0".into()));
        }
        Ok(())
    }
}

/// Widest noise band that still fits the affect plane (-10..=10).
pub const MAX_NOISE_RANGE: f32 = 20.0;

fn invalid(msg: String) -> PurrError {
    PurrError::Config(msg)
}

// NaN and infinities fail both checks.
fn non_negative(v: impl Into<f64>) -> bool {
    let v = v.into();
    v.is_finite() && v >= 0.0
}

fn positive(v: impl Into<f64>) -> bool {
    let v = v.into();
    v.is_finite() && v > 0.0
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Companion name, used in lifecycle logs.
    #[serde(default = "default_name")]
    pub name: String,
    /// Log level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Seconds between periodic gauge log lines (debug level).
    #[serde(default = "default_5_0")]
    pub gauge_log_interval_secs: f64,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            log_level: default_log_level(),
            gauge_log_interval_secs: 5.0,
        }
    }
}

/// Per-need gauge settings, flattened so each field can be overridden alone.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct GaugesConfig {
    #[serde(default = "default_50")]
    pub touch_initial: f32,
    #[serde(default = "default_50")]
    pub rest_initial: f32,
    #[serde(default = "default_50")]
    pub social_initial: f32,
    #[serde(default = "default_50")]
    pub hunger_initial: f32,

    /// Points lost per second. Default: empty in 3 hours.
    #[serde(default = "default_touch_decay")]
    pub touch_decay_per_second: f32,
    /// Default: empty in 12 hours.
    #[serde(default = "default_rest_decay")]
    pub rest_decay_per_second: f32,
    /// Default: empty in 6 hours.
    #[serde(default = "default_social_decay")]
    pub social_decay_per_second: f32,
    /// Default: empty in 6 hours.
    #[serde(default = "default_hunger_decay")]
    pub hunger_decay_per_second: f32,

    #[serde(default = "default_needed")]
    pub touch_needed: f32,
    #[serde(default = "default_needed")]
    pub rest_needed: f32,
    #[serde(default = "default_needed")]
    pub social_needed: f32,
    #[serde(default = "default_needed")]
    pub hunger_needed: f32,

    #[serde(default = "default_fulfilled")]
    pub touch_fulfilled: f32,
    #[serde(default = "default_fulfilled")]
    pub rest_fulfilled: f32,
    #[serde(default = "default_fulfilled")]
    pub social_fulfilled: f32,
    #[serde(default = "default_fulfilled")]
    pub hunger_fulfilled: f32,
}

/// The four settings of one gauge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NeedSettings {
    /// Value at session start.
    pub initial: f32,
    /// Points lost per (scaled) second.
    pub decay_per_second: f32,
    /// Crossing below this fires `<Need>Needed`.
    pub needed: f32,
    /// Crossing above this fires `<Need>Fulfilled`.
    pub fulfilled: f32,
}

impl GaugesConfig {
    /// Settings for one need.
    #[must_use]
    pub fn for_need(&self, need: Need) -> NeedSettings {
        match need {
            Need::Touch => NeedSettings {
                initial: self.touch_initial,
                decay_per_second: self.touch_decay_per_second,
                needed: self.touch_needed,
                fulfilled: self.touch_fulfilled,
            },
            Need::Rest => NeedSettings {
                initial: self.rest_initial,
                decay_per_second: self.rest_decay_per_second,
                needed: self.rest_needed,
                fulfilled: self.rest_fulfilled,
            },
            Need::Social => NeedSettings {
                initial: self.social_initial,
                decay_per_second: self.social_decay_per_second,
                needed: self.social_needed,
                fulfilled: self.social_fulfilled,
            },
            Need::Hunger => NeedSettings {
                initial: self.hunger_initial,
                decay_per_second: self.hunger_decay_per_second,
                needed: self.hunger_needed,
                fulfilled: self.hunger_fulfilled,
            },
        }
    }
}

impl Default for GaugesConfig {
    fn default() -> Self {
        Self {
            touch_initial: 50.0,
            rest_initial: 50.0,
            social_initial: 50.0,
            hunger_initial: 50.0,
            touch_decay_per_second: default_touch_decay(),
            rest_decay_per_second: default_rest_decay(),
            social_decay_per_second: default_social_decay(),
            hunger_decay_per_second: default_hunger_decay(),
            touch_needed: default_needed(),
            rest_needed: default_needed(),
            social_needed: default_needed(),
            hunger_needed: default_needed(),
            touch_fulfilled: default_fulfilled(),
            rest_fulfilled: default_fulfilled(),
            social_fulfilled: default_fulfilled(),
            hunger_fulfilled: default_fulfilled(),
        }
    }
}

/// Long-term and session mood behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoodConfig {
    /// Long-term valence used when nothing is persisted.
    #[serde(default = "default_10_0")]
    pub default_valence: f32,
    /// Long-term arousal used when nothing is persisted.
    #[serde(default)]
    pub default_arousal: f32,
    /// Session mood starts at long-term ± this (uniform, per axis).
    #[serde(default = "default_5_0_f32")]
    pub session_jitter: f32,
    /// Responses are fuzzed by ± this before use.
    #[serde(default = "default_3_0")]
    pub fuzz_range: f32,
    /// Fraction of every fuzzed response added to the session mood.
    #[serde(default = "default_0_01")]
    pub event_bleed: f32,
    /// Fraction of the net session delta folded into long-term at shutdown.
    #[serde(default = "default_0_1")]
    pub session_bleed: f32,
    /// Fixed RNG seed for reproducible runs. Entropy when absent.
    #[serde(default)]
    pub rng_seed: Option<u64>,
}

impl Default for MoodConfig {
    fn default() -> Self {
        Self {
            default_valence: 10.0,
            default_arousal: 0.0,
            session_jitter: 5.0,
            fuzz_range: 3.0,
            event_bleed: 0.01,
            session_bleed: 0.1,
            rng_seed: None,
        }
    }
}

/// Display arbitration timing. All values in engine seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// How long an emotional display stays before resetting to neutral.
    #[serde(default = "default_4_0")]
    pub duration_secs: f64,
    /// Minimum gap between two emotional displays.
    #[serde(default = "default_6_0")]
    pub cooldown_secs: f64,
    /// How often the passive face is re-derived from the current mood.
    #[serde(default = "default_2_0")]
    pub passive_update_interval_secs: f64,
    /// How long an overlay thought stays visible.
    #[serde(default = "default_3_0_f64")]
    pub thought_duration_secs: f64,
    /// The one display allowed through while asleep.
    #[serde(default = "default_wake_override")]
    pub wake_override: String,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            duration_secs: 4.0,
            cooldown_secs: 6.0,
            passive_update_interval_secs: 2.0,
            thought_duration_secs: 3.0,
            wake_override: default_wake_override(),
        }
    }
}

/// Sleep cycle settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SleepConfig {
    /// Forced natural wake after this many engine seconds asleep.
    #[serde(default = "default_3600_0")]
    pub max_duration_secs: f64,
    /// Rest points regained per (scaled) second asleep. Default: full in 2 hours.
    #[serde(default = "default_rest_regen")]
    pub rest_regen_per_second: f32,
}

impl Default for SleepConfig {
    fn default() -> Self {
        Self {
            max_duration_secs: 3600.0,
            rest_regen_per_second: default_rest_regen(),
        }
    }
}

/// Time scaling for gauge decay and rest regeneration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeConfig {
    /// Scale decay and regen by `testing_multiplier`.
    #[serde(default)]
    pub accelerated_testing: bool,
    /// Speed-up applied when `accelerated_testing` is on.
    #[serde(default = "default_180_0")]
    pub testing_multiplier: f32,
}

impl TimeConfig {
    /// The multiplier in effect.
    #[must_use]
    pub fn speed_multiplier(&self) -> f32 {
        if self.accelerated_testing {
            self.testing_multiplier
        } else {
            1.0
        }
    }
}

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            accelerated_testing: false,
            testing_multiplier: 180.0,
        }
    }
}

/// Where the response table lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponsesConfig {
    /// Path to the CSV file.
    #[serde(default = "default_responses_path")]
    pub path: String,
}

impl Default for ResponsesConfig {
    fn default() -> Self {
        Self {
            path: default_responses_path(),
        }
    }
}

/// Baseline persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// Whether the long-term baseline is saved at shutdown.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// SQLite database path.
    #[serde(default = "default_db_path")]
    pub path: String,
    /// Use SQLite WAL journal mode.
    #[serde(default = "default_true")]
    pub wal_mode: bool,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: default_db_path(),
            wal_mode: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Serde default helpers
// ---------------------------------------------------------------------------

fn default_true() -> bool { true }
fn default_name() -> String { "purr".to_string() }
fn default_log_level() -> String { "info".to_string() }
fn default_wake_override() -> String { "loudnoise".to_string() }
fn default_responses_path() -> String { "purr-core/data/responses.csv".to_string() }
fn default_db_path() -> String { "purr.db".to_string() }
fn default_touch_decay() -> f32 { 100.0 / (3.0 * 3600.0) }
fn default_rest_decay() -> f32 { 100.0 / (12.0 * 3600.0) }
fn default_social_decay() -> f32 { 100.0 / (6.0 * 3600.0) }
fn default_hunger_decay() -> f32 { 100.0 / (6.0 * 3600.0) }
fn default_rest_regen() -> f32 { 100.0 / (2.0 * 3600.0) }
fn default_needed() -> f32 { 30.0 }
fn default_fulfilled() -> f32 { 70.0 }
fn default_50() -> f32 { 50.0 }
fn default_0_01() -> f32 { 0.01 }
fn default_0_1() -> f32 { 0.1 }
fn default_3_0() -> f32 { 3.0 }
fn default_5_0_f32() -> f32 { 5.0 }
fn default_10_0() -> f32 { 10.0 }
fn default_180_0() -> f32 { 180.0 }
fn default_2_0() -> f64 { 2.0 }
fn default_3_0_f64() -> f64 { 3.0 }
fn default_4_0() -> f64 { 4.0 }
fn default_5_0() -> f64 { 5.0 }
fn default_6_0() -> f64 { 6.0 }
fn default_3600_0() -> f64 { 3600.0 }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_yields_defaults() {
        let config = PurrConfig::from_toml("").expect("empty config parses");
        assert_eq!(config.gauges.touch_needed, 30.0);
        assert_eq!(config.gauges.hunger_fulfilled, 70.0);
        assert_eq!(config.mood.default_valence, 10.0);
        assert_eq!(config.display.wake_override, "loudnoise");
        assert!((config.time.testing_multiplier - 180.0).abs() < f32::EPSILON);
        assert!(config.persistence.enabled);
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let config = PurrConfig::from_toml(
            r"
            [gauges]
            touch_needed = 25.0

            [time]
            accelerated_testing = true
            ",
        )
        .expect("config parses");
        assert_eq!(config.gauges.touch_needed, 25.0);
        assert!((config.gauges.touch_decay_per_second - 100.0 / 10_800.0).abs() < 1e-9);
        assert!((config.time.speed_multiplier() - 180.0).abs() < f32::EPSILON);
    }

    #[test]
    fn inverted_thresholds_are_rejected() {
        let err = PurrConfig::from_toml(
            r"
            [gauges]
            social_needed = 80.0
            social_fulfilled = 60.0
            ",
        )
        .expect_err("needed above fulfilled must fail");
        assert!(matches!(err, PurrError::Config(msg) if msg.contains("social")));
    }

    #[test]
    fn negative_decay_is_rejected() {
        let mut config = PurrConfig::default();
        config.gauges.rest_decay_per_second = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn malformed_toml_is_a_config_error() {
        let err = PurrConfig::from_toml("[mood\nfuzz_range = ").expect_err("bad toml");
        assert!(matches!(err, PurrError::Config(_)));
    }

    #[test]
    fn non_finite_values_are_rejected() {
        for toml in [
            "[mood]\nsession_jitter = inf\n",
            "[mood]\nfuzz_range = nan\n",
            "[display]\ncooldown_secs = inf\n",
            "[sleep]\nrest_regen_per_second = inf\n",
            "[time]\ntesting_multiplier = inf\n",
        ] {
            let err = PurrConfig::from_toml(toml).expect_err(toml);
            assert!(matches!(err, PurrError::Config(_)), "{toml}");
        }
    }

    #[test]
    fn noise_ranges_are_capped_at_the_plane_width() {
        let err = PurrConfig::from_toml("[mood]\nfuzz_range = 3e38\n").expect_err("too wide");
        assert!(matches!(err, PurrError::Config(msg) if msg.contains("fuzz_range")));

        let config = PurrConfig::from_toml("[mood]\nsession_jitter = 20.0\nfuzz_range = 20.0\n")
            .expect("plane width is allowed");
        assert!((config.mood.fuzz_range - MAX_NOISE_RANGE).abs() < f32::EPSILON);
    }

    #[test]
    fn speed_multiplier_is_one_unless_accelerated() {
        assert!((TimeConfig::default().speed_multiplier() - 1.0).abs() < f32::EPSILON);
    }
}
