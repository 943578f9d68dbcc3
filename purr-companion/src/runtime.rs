//! The driving loop.
//!
//! One task owns the loop and selects between three sources:
//!
//! | Source              | Action                                   |
//! |---------------------|------------------------------------------|
//! | `interval` tick     | `engine.tick(elapsed)`                   |
//! | sensor event queue  | hooks resolve, `engine.handle_trigger`   |
//! | shutdown watch      | leave the loop                           |
//!
//! On exit the engine saves its baseline via `on_shutdown`. The engine sits
//! behind a [`SharedEngine`] so status readers and the loop never touch it
//! concurrently. The lock is never held across an `.await`.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use purr_core::error::Result;
use purr_core::metrics::CounterSnapshot;
use purr_core::{Affect, EmotionEngine};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::config::CompanionConfig;
use crate::events::SensorEvent;
use crate::hooks::SensorHooks;
use crate::presenter::ChannelPresenter;

/// The engine, serialised behind a mutex.
pub type SharedEngine = Arc<Mutex<EmotionEngine<ChannelPresenter>>>;

/// Returned by [`RuntimeHandle::send`] once the loop has stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("companion runtime has stopped")]
pub struct RuntimeClosed;

/// What a finished run did.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeSummary {
    /// Engine ticks driven.
    pub ticks: u64,
    /// Sensor events received.
    pub events: u64,
    /// Triggers the hooks produced.
    pub triggers: u64,
    /// Triggers whose display the arbiter accepted.
    pub shown: u64,
    /// Engine clock at shutdown, seconds.
    pub engine_seconds: f64,
    /// Baseline as saved (or kept) at shutdown.
    pub baseline: Affect,
    /// Engine counters at shutdown.
    pub counters: CounterSnapshot,
}

/// Sender side: feed events, request shutdown, peek at the engine.
#[derive(Debug, Clone)]
pub struct RuntimeHandle {
    events: mpsc::Sender<SensorEvent>,
    shutdown: Arc<watch::Sender<bool>>,
    engine: SharedEngine,
}

impl RuntimeHandle {
    /// Queue a sensor event, waiting if the queue is full.
    ///
    /// # Errors
    /// Returns [`RuntimeClosed`] if the loop has exited.
    pub async fn send(&self, event: SensorEvent) -> std::result::Result<(), RuntimeClosed> {
        self.events.send(event).await.map_err(|_| RuntimeClosed)
    }

    /// Ask the loop to stop after the current step.
    pub fn shutdown(&self) {
        // Only fails when the loop is already gone.
        let _ = self.shutdown.send(true);
    }

    /// The shared engine.
    #[must_use]
    pub fn engine(&self) -> SharedEngine {
        Arc::clone(&self.engine)
    }
}

/// Owns the loop state. Consumed by [`CompanionRuntime::run`].
pub struct CompanionRuntime {
    engine: SharedEngine,
    hooks: SensorHooks,
    tick_interval: Duration,
    events: mpsc::Receiver<SensorEvent>,
    shutdown: watch::Receiver<bool>,
}

impl std::fmt::Debug for CompanionRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompanionRuntime")
            .field("tick_interval", &self.tick_interval)
            .field("hooks", &self.hooks)
            .finish_non_exhaustive()
    }
}

impl CompanionRuntime {
    /// Build the engine from configuration (response table from disk,
    /// baseline from SQLite when enabled), start a session and wire up the
    /// loop.
    #[must_use]
    pub fn from_config(config: &CompanionConfig, presenter: ChannelPresenter) -> (Self, RuntimeHandle) {
        let mut engine = EmotionEngine::from_config(config.engine.clone(), presenter);
        engine.init();
        Self::new(engine, config)
    }

    /// Wire up the loop around an already-built engine. Call `init` on the
    /// engine first; an uninitialised engine ignores everything.
    #[must_use]
    pub fn new(
        engine: EmotionEngine<ChannelPresenter>,
        config: &CompanionConfig,
    ) -> (Self, RuntimeHandle) {
        let engine: SharedEngine = Arc::new(Mutex::new(engine));
        let (event_tx, event_rx) = mpsc::channel(config.runtime.event_queue_capacity);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let runtime = Self {
            engine: Arc::clone(&engine),
            hooks: SensorHooks::new(config.sensors.clone()),
            tick_interval: config.tick_interval(),
            events: event_rx,
            shutdown: shutdown_rx,
        };
        let handle = RuntimeHandle {
            events: event_tx,
            shutdown: Arc::new(shutdown_tx),
            engine,
        };
        (runtime, handle)
    }

    /// The shared engine.
    #[must_use]
    pub fn engine(&self) -> SharedEngine {
        Arc::clone(&self.engine)
    }

    /// Run until shutdown is requested or every handle is dropped, then save
    /// the baseline.
    ///
    /// # Errors
    /// Returns the error from the final baseline save.
    pub async fn run(mut self) -> Result<RuntimeSummary> {
        let mut interval = tokio::time::interval(self.tick_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut last_tick = Instant::now();

        let mut summary = Stats::default();
        info!(tick_ms = self.tick_interval.as_millis(), "companion loop started");

        loop {
            // Ticks first, so time due at the same instant as a shutdown
            // is still counted.
            tokio::select! {
                biased;

                _ = interval.tick() => {
                    let now = Instant::now();
                    let dt = now.duration_since(last_tick);
                    last_tick = now;
                    self.engine.lock().tick(dt.as_secs_f64());
                    summary.ticks += 1;
                }

                maybe_event = self.events.recv() => {
                    let Some(event) = maybe_event else {
                        debug!("all event senders dropped");
                        break;
                    };
                    summary.events += 1;
                    self.dispatch(&event, &mut summary);
                }

                changed = self.shutdown.changed() => {
                    if changed.is_err() || *self.shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        let mut engine = self.engine.lock();
        let baseline = engine.on_shutdown()?;
        let result = RuntimeSummary {
            ticks: summary.ticks,
            events: summary.events,
            triggers: summary.triggers,
            shown: summary.shown,
            engine_seconds: engine.now(),
            baseline,
            counters: engine.counters(),
        };
        info!(
            ticks = result.ticks,
            events = result.events,
            shown = result.shown,
            baseline = %result.baseline,
            "companion loop stopped"
        );
        Ok(result)
    }

    fn dispatch(&mut self, event: &SensorEvent, stats: &mut Stats) {
        let mut engine = self.engine.lock();
        let triggers = self.hooks.observe(event, engine.now());
        for trigger in triggers {
            stats.triggers += 1;
            let outcome = engine.handle_trigger(trigger);
            if outcome.shown {
                stats.shown += 1;
            }
            debug!(
                sensor = %event,
                trigger = %trigger,
                display = %outcome.response.display,
                shown = outcome.shown,
                "dispatched"
            );
        }
    }
}

#[derive(Debug, Default)]
struct Stats {
    ticks: u64,
    events: u64,
    triggers: u64,
    shown: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::StrokeDirection;
    use purr_core::{PresentationCommand, ResponseTable};

    fn test_config() -> CompanionConfig {
        let mut config = CompanionConfig::default();
        config.engine.mood.rng_seed = Some(7);
        config.engine.mood.session_jitter = 0.0;
        config.engine.persistence.enabled = false;
        config
    }

    fn runtime(config: &CompanionConfig) -> (CompanionRuntime, RuntimeHandle, crate::presenter::CommandReceiver) {
        let (presenter, rx) = ChannelPresenter::channel();
        let mut engine = EmotionEngine::new(
            config.engine.clone(),
            Arc::new(ResponseTable::builtin()),
            presenter,
        );
        engine.init();
        let (runtime, handle) = CompanionRuntime::new(engine, config);
        (runtime, handle, rx)
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_dispatches_and_shuts_down() {
        let config = test_config();
        let (runtime, handle, mut rx) = runtime(&config);
        let task = tokio::spawn(runtime.run());

        handle
            .send(SensorEvent::Stroke {
                direction: StrokeDirection::FrontToBack,
            })
            .await
            .expect("loop running");
        tokio::time::sleep(Duration::from_secs(1)).await;
        handle.shutdown();

        let summary = task.await.expect("join").expect("run");
        assert!(summary.ticks >= 10, "ticks = {}", summary.ticks);
        assert_eq!(summary.events, 1);
        assert_eq!(summary.triggers, 1);
        assert_eq!(summary.shown, 1);
        assert!(summary.engine_seconds >= 0.85, "engine_seconds = {}", summary.engine_seconds);
        assert_eq!(summary.counters.events_handled, 1);

        let mut faces = 0;
        while let Ok(command) = rx.try_recv() {
            if matches!(command, PresentationCommand::SetFaceExpression(_)) {
                faces += 1;
            }
        }
        assert!(faces >= 1);
    }

    #[tokio::test(start_paused = true)]
    async fn too_far_fires_once_through_the_loop() {
        let config = test_config();
        let (runtime, handle, _rx) = runtime(&config);
        let task = tokio::spawn(runtime.run());

        for meters in [0.5, 2.0, 2.5, 3.0] {
            handle
                .send(SensorEvent::Proximity { meters })
                .await
                .expect("loop running");
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
        handle.shutdown();

        let summary = task.await.expect("join").expect("run");
        assert_eq!(summary.events, 4);
        assert_eq!(summary.triggers, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_every_handle_stops_the_loop() {
        let config = test_config();
        let (runtime, handle, _rx) = runtime(&config);
        let engine = runtime.engine();
        let task = tokio::spawn(runtime.run());

        drop(handle);
        let summary = task.await.expect("join").expect("run");
        assert_eq!(summary.events, 0);
        assert!(engine.lock().is_initialized());
    }

    #[tokio::test(start_paused = true)]
    async fn send_after_stop_reports_closed() {
        let config = test_config();
        let (runtime, handle, _rx) = runtime(&config);
        let task = tokio::spawn(runtime.run());
        handle.shutdown();
        task.await.expect("join").expect("run");

        let err = handle.send(SensorEvent::Held).await;
        assert_eq!(err, Err(RuntimeClosed));
    }

    #[tokio::test(start_paused = true)]
    async fn baseline_saved_on_shutdown() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut config = test_config();
        config.engine.persistence.enabled = true;
        config.engine.persistence.path = dir.path().join("purr.db").display().to_string();
        config.engine.responses.path = dir.path().join("missing.csv").display().to_string();

        let (presenter, _rx) = ChannelPresenter::channel();
        let (runtime, handle) = CompanionRuntime::from_config(&config, presenter);
        let task = tokio::spawn(runtime.run());
        handle.shutdown();
        let summary = task.await.expect("join").expect("run");

        assert_eq!(summary.counters.saves, 1);
        // Session equals the baseline (no jitter, no events): nothing moves.
        assert_eq!(summary.baseline, Affect::new(10.0, 0.0));
    }
}
