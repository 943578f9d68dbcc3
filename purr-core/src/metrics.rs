//! Engine counters.
//!
//! Lock-free `AtomicU64` counters bumped on the hot path and read on
//! export. Reads are `Relaxed`; the numbers are for dashboards and logs,
//! not for synchronisation.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Running totals since the engine was built.
#[derive(Debug)]
pub struct EngineCounters {
    /// Events passed to the engine (including unknown names).
    pub events_handled: AtomicU64,
    /// Displays the arbiter accepted.
    pub displays_accepted: AtomicU64,
    /// Displays the arbiter rejected (cooldown, busy, asleep).
    pub displays_rejected: AtomicU64,
    /// Events with no table row, or unknown names.
    pub table_misses: AtomicU64,
    /// Gauge threshold crossings raised by ticks.
    pub threshold_crossings: AtomicU64,
    /// Times the companion fell asleep.
    pub sleeps: AtomicU64,
    /// Times the companion woke.
    pub wakes: AtomicU64,
    /// Baseline saves completed.
    pub saves: AtomicU64,
}

impl EngineCounters {
    /// Zeroed counters.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            events_handled: AtomicU64::new(0),
            displays_accepted: AtomicU64::new(0),
            displays_rejected: AtomicU64::new(0),
            table_misses: AtomicU64::new(0),
            threshold_crossings: AtomicU64::new(0),
            sleeps: AtomicU64::new(0),
            wakes: AtomicU64::new(0),
            saves: AtomicU64::new(0),
        }
    }

    /// Add one to a counter.
    pub fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Read every counter.
    #[must_use]
    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            events_handled: self.events_handled.load(Ordering::Relaxed),
            displays_accepted: self.displays_accepted.load(Ordering::Relaxed),
            displays_rejected: self.displays_rejected.load(Ordering::Relaxed),
            table_misses: self.table_misses.load(Ordering::Relaxed),
            threshold_crossings: self.threshold_crossings.load(Ordering::Relaxed),
            sleeps: self.sleeps.load(Ordering::Relaxed),
            wakes: self.wakes.load(Ordering::Relaxed),
            saves: self.saves.load(Ordering::Relaxed),
        }
    }
}

impl Default for EngineCounters {
    fn default() -> Self {
        Self::new()
    }
}

/// Counter values at one point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct CounterSnapshot {
    pub events_handled: u64,
    pub displays_accepted: u64,
    pub displays_rejected: u64,
    pub table_misses: u64,
    pub threshold_crossings: u64,
    pub sleeps: u64,
    pub wakes: u64,
    pub saves: u64,
}

impl CounterSnapshot {
    /// Format as Prometheus text exposition.
    #[must_use]
    pub fn to_prometheus(&self) -> String {
        let rows = [
            ("events_handled", "Events passed to the engine", self.events_handled),
            ("displays_accepted", "Displays accepted by the arbiter", self.displays_accepted),
            ("displays_rejected", "Displays rejected by the arbiter", self.displays_rejected),
            ("table_misses", "Events with no response row", self.table_misses),
            ("threshold_crossings", "Gauge threshold crossings", self.threshold_crossings),
            ("sleeps", "Sleep onsets", self.sleeps),
            ("wakes", "Wake-ups", self.wakes),
            ("saves", "Baseline saves", self.saves),
        ];
        let mut out = String::new();
        for (name, help, value) in rows {
            out.push_str(&format!(
                "# HELP purr_{name}_total {help}\n# TYPE purr_{name}_total counter\npurr_{name}_total {value}\n"
            ));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_default_zero() {
        assert_eq!(EngineCounters::new().snapshot(), CounterSnapshot::default());
    }

    #[test]
    fn bump_and_snapshot() {
        let c = EngineCounters::new();
        EngineCounters::bump(&c.events_handled);
        EngineCounters::bump(&c.events_handled);
        EngineCounters::bump(&c.sleeps);

        let snap = c.snapshot();
        assert_eq!(snap.events_handled, 2);
        assert_eq!(snap.sleeps, 1);
        assert_eq!(snap.wakes, 0);
    }

    #[test]
    fn prometheus_format_valid() {
        let c = EngineCounters::new();
        c.table_misses.fetch_add(42, Ordering::Relaxed);
        let prom = c.snapshot().to_prometheus();
        assert!(prom.contains("purr_table_misses_total 42"));
        assert!(prom.contains("# TYPE purr_saves_total counter"));
        assert!(prom.contains("# HELP"));
    }
}
