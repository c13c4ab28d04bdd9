//! Timer screen: one engine, one tick subscription, one alarm
//!
//! A screen turns UI intents into engine operations and owns every resource
//! the engine needs. All state lives behind a single mutex; tick callbacks
//! take the same lock, so ticks and intents never interleave.

use std::{
    ops::ControlFlow,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, error, info};

use super::{DurationInput, TimerEngine, TimerMode, TimerSnapshot};
use crate::{
    services::{AlarmTrigger, AudioResource},
    tasks::TickSource,
};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ScreenError {
    #[error("{intent} does not apply to the {screen} timer")]
    Unsupported {
        screen: &'static str,
        intent: &'static str,
    },
    #[error("Failed to lock {0} timer state")]
    Poisoned(&'static str),
}

struct ScreenInner {
    engine: TimerEngine,
    input: DurationInput,
    alarm_minute_text: String,
    ticks: TickSource,
    /// Bumped whenever ticks are armed or disarmed; stale callbacks bail out
    generation: u64,
}

impl ScreenInner {
    fn snapshot(&self) -> TimerSnapshot {
        let state = self.engine.state();
        TimerSnapshot {
            mode: state.mode,
            phase: state.phase,
            value: state.value,
            display: state.display(),
            configured_duration: state.configured_duration,
            progress: state.progress(),
            running: state.running,
            alarm_threshold: state.alarm_threshold,
            alarm_fired: state.alarm_fired,
            minutes_text: self.input.minutes_text().to_string(),
            seconds_text: self.input.seconds_text().to_string(),
            alarm_minute_text: self.alarm_minute_text.clone(),
        }
    }

    fn disarm(&mut self) {
        self.ticks.deactivate();
        self.generation += 1;
    }
}

pub struct TimerScreen {
    name: &'static str,
    mode: TimerMode,
    inner: Arc<Mutex<ScreenInner>>,
    audio: Arc<AudioResource>,
    updates_tx: Arc<watch::Sender<TimerSnapshot>>,
}

impl TimerScreen {
    /// Mount a screen ticking once per second and start preloading its alarm
    pub fn mount(name: &'static str, mode: TimerMode, alarm: AlarmTrigger) -> Self {
        Self::mount_with_ticks(name, mode, alarm, TickSource::new())
    }

    pub fn mount_with_ticks(
        name: &'static str,
        mode: TimerMode,
        alarm: AlarmTrigger,
        ticks: TickSource,
    ) -> Self {
        let audio = Arc::clone(alarm.audio());
        drop(audio.preload());

        let (updates_tx, _) = watch::channel(TimerSnapshot::idle(mode));
        let inner = ScreenInner {
            engine: TimerEngine::new(mode, Arc::new(alarm)),
            input: DurationInput::new(),
            alarm_minute_text: String::new(),
            ticks,
            generation: 0,
        };

        info!("Mounted {} screen", name);
        Self {
            name,
            mode,
            inner: Arc::new(Mutex::new(inner)),
            audio,
            updates_tx: Arc::new(updates_tx),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn mode(&self) -> TimerMode {
        self.mode
    }

    /// Start, resume or pause depending on the current phase
    pub fn on_start_pause(&self) -> Result<TimerSnapshot, ScreenError> {
        let mut inner = self.lock()?;

        if inner.engine.is_running() {
            inner.engine.pause();
            inner.disarm();
        } else {
            let initial = inner.engine.needs_duration().then(|| inner.input.resolve());
            if inner.engine.start(initial) {
                self.arm(&mut inner);
            } else {
                debug!("{} timer did not start", self.name);
            }
        }

        Ok(self.publish(&inner))
    }

    pub fn on_reset(&self) -> Result<TimerSnapshot, ScreenError> {
        let mut inner = self.lock()?;
        inner.disarm();
        inner.engine.reset();
        if self.mode == TimerMode::CountDown {
            inner.input.clear();
        }
        Ok(self.publish(&inner))
    }

    pub fn on_minutes_changed(&self, text: &str) -> Result<TimerSnapshot, ScreenError> {
        self.require(TimerMode::CountDown, "minutes input")?;
        let mut inner = self.lock()?;
        inner.input.set_minutes(text);
        Ok(self.publish(&inner))
    }

    pub fn on_seconds_changed(&self, text: &str) -> Result<TimerSnapshot, ScreenError> {
        self.require(TimerMode::CountDown, "seconds input")?;
        let mut inner = self.lock()?;
        inner.input.set_seconds(text);
        Ok(self.publish(&inner))
    }

    pub fn on_alarm_minute_changed(&self, text: &str) -> Result<TimerSnapshot, ScreenError> {
        self.require(TimerMode::CountUp, "alarm minute")?;
        let mut inner = self.lock()?;
        inner.alarm_minute_text = text.to_string();
        inner.engine.set_alarm_threshold(text);
        Ok(self.publish(&inner))
    }

    pub fn snapshot(&self) -> Result<TimerSnapshot, ScreenError> {
        Ok(self.lock()?.snapshot())
    }

    /// Watch render snapshots, updated after every intent and tick
    pub fn subscribe(&self) -> watch::Receiver<TimerSnapshot> {
        self.updates_tx.subscribe()
    }

    /// Check if a tick subscription is currently active
    pub fn is_ticking(&self) -> bool {
        self.lock().map(|inner| inner.ticks.is_active()).unwrap_or(false)
    }

    /// Stop ticking and release the alarm sound. Safe to call repeatedly.
    pub fn unmount(&self) {
        self.lock_even_if_poisoned().disarm();
        drop(self.audio.release());
        info!("Unmounted {} screen", self.name);
    }

    fn arm(&self, inner: &mut ScreenInner) {
        inner.generation += 1;
        let generation = inner.generation;
        let shared = Arc::clone(&self.inner);
        let updates = Arc::clone(&self.updates_tx);
        let name = self.name;

        inner.ticks.activate(move || {
            let mut guard = match shared.lock() {
                Ok(guard) => guard,
                Err(e) => {
                    error!("Failed to lock {} timer state: {}", name, e);
                    return ControlFlow::Break(());
                }
            };
            if guard.generation != generation {
                return ControlFlow::Break(());
            }

            if let Some(event) = guard.engine.tick() {
                info!("{} timer event: {:?}", name, event);
            }
            let snapshot = guard.snapshot();
            let running = guard.engine.is_running();
            drop(guard);

            updates.send_replace(snapshot);
            if running {
                ControlFlow::Continue(())
            } else {
                ControlFlow::Break(())
            }
        });
    }

    fn publish(&self, inner: &ScreenInner) -> TimerSnapshot {
        let snapshot = inner.snapshot();
        self.updates_tx.send_replace(snapshot.clone());
        snapshot
    }

    fn require(&self, mode: TimerMode, intent: &'static str) -> Result<(), ScreenError> {
        if self.mode == mode {
            Ok(())
        } else {
            Err(ScreenError::Unsupported {
                screen: self.name,
                intent,
            })
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, ScreenInner>, ScreenError> {
        self.inner
            .lock()
            .map_err(|_| ScreenError::Poisoned(self.name))
    }

    fn lock_even_if_poisoned(&self) -> MutexGuard<'_, ScreenInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for TimerScreen {
    fn drop(&mut self) {
        // The tick task holds the shared state; stop it so both go away
        self.lock_even_if_poisoned().disarm();
    }
}
