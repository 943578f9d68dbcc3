//! Need gauges: touch, rest, social and hunger.
//!
//! Each gauge sits in [0, 100] and drains at a constant rate. Drain is
//! applied in whole points: the scaled drain is collected in an accumulator
//! and only `floor(accumulator)` is taken off the gauge, so slow rates lose
//! nothing to rounding.
//!
//! Threshold crossings are edge-triggered against the value seen by the
//! previous check, so a delta applied by an event between two ticks is
//! caught by the next tick exactly once.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::config::GaugesConfig;
use crate::types::{Need, Trigger};

/// Lowest gauge value.
pub const GAUGE_MIN: f32 = 0.0;
/// Highest gauge value.
pub const GAUGE_MAX: f32 = 100.0;

fn clamp_gauge(value: f32) -> f32 {
    if value.is_nan() {
        GAUGE_MIN
    } else {
        value.clamp(GAUGE_MIN, GAUGE_MAX)
    }
}

/// Decide whether moving from `previous` to `current` crossed a threshold.
///
/// - `<Need>Needed` when `previous >= needed && current < needed`
/// - `<Need>Fulfilled` when `previous <= fulfilled && current > fulfilled`
#[must_use]
pub fn crossing_check(
    need: Need,
    previous: f32,
    current: f32,
    needed: f32,
    fulfilled: f32,
) -> Option<Trigger> {
    if previous >= needed && current < needed {
        Some(Trigger::needed(need))
    } else if previous <= fulfilled && current > fulfilled {
        Some(Trigger::fulfilled(need))
    } else {
        None
    }
}

/// One decaying need.
#[derive(Debug, Clone, PartialEq)]
pub struct Gauge {
    /// Which need this gauge tracks.
    pub need: Need,
    value: f32,
    accumulator: f32,
    decay_per_second: f32,
    needed: f32,
    fulfilled: f32,
    last_checked: f32,
}

impl Gauge {
    fn new(need: Need, config: &GaugesConfig) -> Self {
        let s = config.for_need(need);
        let value = clamp_gauge(s.initial);
        Self {
            need,
            value,
            accumulator: 0.0,
            decay_per_second: s.decay_per_second.max(0.0),
            needed: s.needed,
            fulfilled: s.fulfilled,
            last_checked: value,
        }
    }

    /// Current value in [0, 100].
    #[must_use]
    pub fn value(&self) -> f32 {
        self.value
    }

    /// Fractional drain not yet taken off the gauge.
    #[must_use]
    pub fn accumulator(&self) -> f32 {
        self.accumulator
    }

    fn decay(&mut self, delta_seconds: f32, speed_multiplier: f32) {
        self.accumulator += self.decay_per_second * delta_seconds * speed_multiplier;
        if self.accumulator >= 1.0 {
            let whole = self.accumulator.floor();
            self.value = clamp_gauge(self.value - whole);
            self.accumulator -= whole;
        }
    }

    fn check(&mut self) -> Option<Trigger> {
        let fired = crossing_check(
            self.need,
            self.last_checked,
            self.value,
            self.needed,
            self.fulfilled,
        );
        self.last_checked = self.value;
        fired
    }
}

/// Plain copy of the four gauge values, for logs and snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GaugeReadings {
    /// Touch gauge.
    pub touch: f32,
    /// Rest gauge.
    pub rest: f32,
    /// Social gauge.
    pub social: f32,
    /// Hunger gauge.
    pub hunger: f32,
}

/// The four need gauges.
#[derive(Debug, Clone)]
pub struct GaugeBank {
    gauges: [Gauge; 4],
    rest_was_empty: bool,
}

impl GaugeBank {
    /// Build a bank at the configured starting values.
    #[must_use]
    pub fn from_config(config: &GaugesConfig) -> Self {
        let gauges = Need::ALL.map(|need| Gauge::new(need, config));
        let rest_was_empty = gauges[Need::Rest.index()].value <= GAUGE_MIN;
        Self {
            gauges,
            rest_was_empty,
        }
    }

    /// Drain every gauge, then report threshold crossings.
    ///
    /// Non-positive or non-finite `delta_seconds` skips the drain but still
    /// runs the crossing checks.
    pub fn tick(&mut self, delta_seconds: f32, speed_multiplier: f32) -> Vec<Trigger> {
        if delta_seconds.is_finite() && delta_seconds > 0.0 {
            for gauge in &mut self.gauges {
                gauge.decay(delta_seconds, speed_multiplier);
            }
        }
        self.check_crossings()
    }

    /// Compare every gauge against the value seen by the previous check.
    pub fn check_crossings(&mut self) -> Vec<Trigger> {
        let mut fired = Vec::new();
        for gauge in &mut self.gauges {
            if let Some(trigger) = gauge.check() {
                trace!(%trigger, value = gauge.value, "gauge threshold crossed");
                fired.push(trigger);
            }
        }
        fired
    }

    /// Add `amount` to a gauge, clamped to [0, 100].
    pub fn apply_delta(&mut self, need: Need, amount: f32) {
        let gauge = &mut self.gauges[need.index()];
        gauge.value = clamp_gauge(gauge.value + amount);
    }

    /// Add `amount` to the gauge named `name` ("touch", "Rest", …).
    ///
    /// Returns `false` and leaves every gauge untouched for unknown names.
    pub fn apply_named_delta(&mut self, name: &str, amount: f32) -> bool {
        match name.parse::<Need>() {
            Ok(need) => {
                self.apply_delta(need, amount);
                true
            }
            Err(_) => false,
        }
    }

    /// Refill rest while asleep. Regeneration is continuous, not whole-point.
    pub fn regenerate_rest(&mut self, per_second: f32, delta_seconds: f32, speed_multiplier: f32) {
        if delta_seconds.is_finite() && delta_seconds > 0.0 {
            self.apply_delta(Need::Rest, per_second * delta_seconds * speed_multiplier);
        }
    }

    /// `true` exactly once each time rest reaches 0 from above.
    pub fn rest_depleted(&mut self) -> bool {
        let empty = self.value(Need::Rest) <= GAUGE_MIN;
        let edge = empty && !self.rest_was_empty;
        self.rest_was_empty = empty;
        edge
    }

    /// Current value of one gauge.
    #[must_use]
    pub fn value(&self, need: Need) -> f32 {
        self.gauges[need.index()].value
    }

    /// The gauge for one need.
    #[must_use]
    pub fn gauge(&self, need: Need) -> &Gauge {
        &self.gauges[need.index()]
    }

    /// All four values.
    #[must_use]
    pub fn readings(&self) -> GaugeReadings {
        GaugeReadings {
            touch: self.value(Need::Touch),
            rest: self.value(Need::Rest),
            social: self.value(Need::Social),
            hunger: self.value(Need::Hunger),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bank() -> GaugeBank {
        GaugeBank::from_config(&GaugesConfig::default())
    }

    #[test]
    fn crossing_down_through_needed_fires_needed() {
        assert_eq!(
            crossing_check(Need::Touch, 30.0, 29.0, 30.0, 70.0),
            Some(Trigger::TouchNeeded)
        );
        assert_eq!(crossing_check(Need::Touch, 29.0, 28.0, 30.0, 70.0), None);
    }

    #[test]
    fn crossing_up_through_fulfilled_fires_fulfilled() {
        assert_eq!(
            crossing_check(Need::Social, 70.0, 71.0, 30.0, 70.0),
            Some(Trigger::SocialFulfilled)
        );
        assert_eq!(crossing_check(Need::Social, 71.0, 80.0, 30.0, 70.0), None);
    }

    #[test]
    fn decay_takes_whole_points_and_keeps_the_remainder() {
        let mut config = GaugesConfig::default();
        config.touch_decay_per_second = 0.4;
        let mut bank = GaugeBank::from_config(&config);

        bank.tick(1.0, 1.0);
        assert_eq!(bank.value(Need::Touch), 50.0);
        bank.tick(1.0, 1.0);
        assert_eq!(bank.value(Need::Touch), 50.0);
        bank.tick(1.0, 1.0);
        assert_eq!(bank.value(Need::Touch), 49.0);
        assert!((bank.gauge(Need::Touch).accumulator() - 0.2).abs() < 1e-5);
    }

    #[test]
    fn multiplier_scales_decay() {
        let mut config = GaugesConfig::default();
        config.hunger_decay_per_second = 0.01;
        let mut bank = GaugeBank::from_config(&config);

        bank.tick(1.0, 180.0);
        assert_eq!(bank.value(Need::Hunger), 49.0);
    }

    #[test]
    fn gauges_never_go_below_zero() {
        let mut config = GaugesConfig::default();
        config.social_decay_per_second = 1000.0;
        let mut bank = GaugeBank::from_config(&config);

        bank.tick(10.0, 1.0);
        assert_eq!(bank.value(Need::Social), 0.0);
    }

    #[test]
    fn apply_delta_clamps() {
        let mut bank = bank();
        bank.apply_delta(Need::Touch, 500.0);
        assert_eq!(bank.value(Need::Touch), 100.0);
        bank.apply_delta(Need::Touch, -500.0);
        assert_eq!(bank.value(Need::Touch), 0.0);
    }

    #[test]
    fn delta_between_ticks_is_caught_once() {
        let mut bank = bank();
        bank.apply_delta(Need::Touch, -25.0);

        assert_eq!(bank.tick(0.0, 1.0), vec![Trigger::TouchNeeded]);
        assert!(bank.tick(0.0, 1.0).is_empty());
    }

    #[test]
    fn named_delta_accepts_lowercase_and_rejects_unknown() {
        let mut bank = bank();
        assert!(bank.apply_named_delta("social", 10.0));
        assert_eq!(bank.value(Need::Social), 60.0);
        assert!(!bank.apply_named_delta("thirst", 10.0));
    }

    #[test]
    fn rest_depleted_is_an_edge() {
        let mut bank = bank();
        assert!(!bank.rest_depleted());

        bank.apply_delta(Need::Rest, -100.0);
        assert!(bank.rest_depleted());
        assert!(!bank.rest_depleted());

        bank.regenerate_rest(1.0, 5.0, 1.0);
        assert!(!bank.rest_depleted());
        bank.apply_delta(Need::Rest, -100.0);
        assert!(bank.rest_depleted());
    }

    #[test]
    fn invalid_delta_seconds_do_not_decay() {
        let mut config = GaugesConfig::default();
        config.touch_decay_per_second = 10.0;
        let mut bank = GaugeBank::from_config(&config);

        bank.tick(f32::NAN, 1.0);
        bank.tick(-5.0, 1.0);
        assert_eq!(bank.value(Need::Touch), 50.0);
    }
}
