//! Timer engine: the count-up / count-down state machine
//!
//! The engine has no clock of its own. Whoever owns it calls `tick()` once
//! per second while it is running; see [`crate::tasks::TickSource`].
//!
//! ```text
//! Idle -> Running <-> Paused
//!            |
//!            +--> Expired   (count-down only, on reaching zero)
//!
//! reset: any -> Idle
//! ```

use std::sync::Arc;

use tracing::{debug, info};

use super::{TimerMode, TimerPhase, TimerState};

/// Side effect raised when a timer crosses its threshold
pub trait Alarm: Send + Sync {
    /// Start the alarm. Must return without waiting for sound or vibration.
    fn fire(&self);

    /// Stop any sound and vibration the alarm started. Best effort.
    fn silence(&self);
}

/// Notable transitions reported by `tick`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    /// The stopwatch reached its alarm mark
    AlarmReached { at_seconds: u64 },
    /// The countdown reached zero
    Expired,
}

pub struct TimerEngine {
    state: TimerState,
    alarm: Arc<dyn Alarm>,
}

impl TimerEngine {
    pub fn new(mode: TimerMode, alarm: Arc<dyn Alarm>) -> Self {
        Self {
            state: TimerState::new(mode),
            alarm,
        }
    }

    pub fn state(&self) -> &TimerState {
        &self.state
    }

    pub fn mode(&self) -> TimerMode {
        self.state.mode
    }

    pub fn phase(&self) -> TimerPhase {
        self.state.phase
    }

    pub fn is_running(&self) -> bool {
        self.state.running
    }

    /// Whether a start from the current phase would load a new duration
    pub fn needs_duration(&self) -> bool {
        self.state.mode == TimerMode::CountDown
            && matches!(self.state.phase, TimerPhase::Idle | TimerPhase::Expired)
    }

    /// Start or resume the timer. Returns `true` if the timer is now running
    /// because of this call.
    ///
    /// A fresh count-down needs `initial_value > 0`; anything else leaves the
    /// state untouched. Resuming ignores `initial_value`.
    pub fn start(&mut self, initial_value: Option<u64>) -> bool {
        match self.state.phase {
            TimerPhase::Running => false,
            TimerPhase::Paused => {
                self.set_running();
                info!("Resumed {:?} timer at {}", self.state.mode, self.state.display());
                true
            }
            TimerPhase::Idle | TimerPhase::Expired => match self.state.mode {
                TimerMode::CountUp => {
                    self.set_running();
                    info!("Started stopwatch at {}", self.state.display());
                    true
                }
                TimerMode::CountDown => {
                    let duration = initial_value.unwrap_or(0);
                    if duration == 0 {
                        debug!("Ignoring countdown start without a duration");
                        return false;
                    }
                    self.state.value = duration;
                    self.state.configured_duration = duration;
                    self.state.alarm_fired = false;
                    self.set_running();
                    info!("Started countdown for {}", self.state.display());
                    true
                }
            },
        }
    }

    /// Pause a running timer, keeping its value
    pub fn pause(&mut self) -> bool {
        if self.state.phase != TimerPhase::Running {
            return false;
        }
        self.state.running = false;
        self.state.phase = TimerPhase::Paused;
        info!("Paused {:?} timer at {}", self.state.mode, self.state.display());
        true
    }

    /// Advance the timer by one second
    pub fn tick(&mut self) -> Option<TimerEvent> {
        if !self.state.running {
            return None;
        }

        match self.state.mode {
            TimerMode::CountUp => {
                self.state.value = self.state.value.saturating_add(1);
                match self.state.alarm_threshold {
                    Some(threshold) if self.state.value == threshold && !self.state.alarm_fired => {
                        self.state.alarm_fired = true;
                        info!("Stopwatch reached alarm mark {}", self.state.display());
                        self.alarm.fire();
                        Some(TimerEvent::AlarmReached { at_seconds: threshold })
                    }
                    _ => None,
                }
            }
            TimerMode::CountDown => {
                if self.state.value == 0 {
                    // Already at zero: settle into Expired without a second alarm
                    self.expire();
                    return None;
                }
                self.state.value -= 1;
                if self.state.value > 0 {
                    return None;
                }
                self.expire();
                if !self.state.alarm_fired {
                    self.state.alarm_fired = true;
                    info!("Countdown of {}s expired", self.state.configured_duration);
                    self.alarm.fire();
                }
                Some(TimerEvent::Expired)
            }
        }
    }

    /// Return to Idle from any phase and silence the alarm
    pub fn reset(&mut self) {
        self.state.running = false;
        self.state.phase = TimerPhase::Idle;
        self.state.value = 0;
        self.state.configured_duration = 0;
        self.state.alarm_fired = false;
        self.alarm.silence();
        info!("Reset {:?} timer", self.state.mode);
    }

    /// Set the stopwatch alarm mark from the minutes text field.
    ///
    /// Leading digits are read and anything after them is ignored, so "5 min"
    /// means five minutes. Text without leading digits clears the mark.
    /// Count-down timers ignore it.
    pub fn set_alarm_threshold(&mut self, minutes: &str) -> Option<u64> {
        if self.state.mode != TimerMode::CountUp {
            debug!("Alarm mark ignored for countdown timer");
            return None;
        }

        let threshold = leading_minutes(minutes).and_then(|minutes| minutes.checked_mul(60));

        if threshold != self.state.alarm_threshold {
            // A new mark that is still ahead gets its own alarm
            if threshold.is_some_and(|mark| mark > self.state.value) {
                self.state.alarm_fired = false;
            }
            debug!("Stopwatch alarm mark set to {:?}", threshold);
        }
        self.state.alarm_threshold = threshold;
        threshold
    }

    fn set_running(&mut self) {
        self.state.running = true;
        self.state.phase = TimerPhase::Running;
    }

    fn expire(&mut self) {
        self.state.running = false;
        self.state.phase = TimerPhase::Expired;
    }
}

/// Whole minutes from the digits at the start of the text
fn leading_minutes(text: &str) -> Option<u64> {
    let text = text.trim_start();
    let end = text
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(text.len());
    text[..end].parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingAlarm {
        fired: AtomicUsize,
        silenced: AtomicUsize,
    }

    impl CountingAlarm {
        fn fired(&self) -> usize {
            self.fired.load(Ordering::SeqCst)
        }
    }

    impl Alarm for CountingAlarm {
        fn fire(&self) {
            self.fired.fetch_add(1, Ordering::SeqCst);
        }

        fn silence(&self) {
            self.silenced.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn engine(mode: TimerMode) -> (TimerEngine, Arc<CountingAlarm>) {
        let alarm = Arc::new(CountingAlarm::default());
        (TimerEngine::new(mode, alarm.clone()), alarm)
    }

    #[test]
    fn countdown_expires_after_exactly_d_ticks() {
        for duration in [1u64, 2, 59, 60, 61, 150] {
            let (mut timer, alarm) = engine(TimerMode::CountDown);
            assert!(timer.start(Some(duration)));

            for _ in 1..duration {
                assert_eq!(timer.tick(), None);
                assert_eq!(timer.phase(), TimerPhase::Running);
            }
            assert_eq!(timer.tick(), Some(TimerEvent::Expired));

            assert_eq!(timer.state().value, 0);
            assert_eq!(timer.phase(), TimerPhase::Expired);
            assert!(!timer.is_running());
            assert!(timer.state().alarm_fired);
            assert_eq!(alarm.fired(), 1, "duration {duration}");
        }
    }

    #[test]
    fn countdown_start_with_zero_is_noop() {
        let (mut timer, _) = engine(TimerMode::CountDown);
        assert!(!timer.start(Some(0)));
        assert!(!timer.start(None));
        assert_eq!(timer.phase(), TimerPhase::Idle);
        assert!(!timer.is_running());
        assert_eq!(timer.state(), &TimerState::new(TimerMode::CountDown));
    }

    #[test]
    fn pause_is_idempotent() {
        let (mut timer, _) = engine(TimerMode::CountDown);
        timer.start(Some(10));
        timer.tick();

        assert!(timer.pause());
        let after_first = timer.state().clone();
        assert!(!timer.pause());
        assert_eq!(timer.state(), &after_first);
        assert_eq!(after_first.phase, TimerPhase::Paused);
        assert_eq!(after_first.value, 9);
    }

    #[test]
    fn pause_from_idle_is_noop() {
        let (mut timer, _) = engine(TimerMode::CountUp);
        assert!(!timer.pause());
        assert_eq!(timer.phase(), TimerPhase::Idle);
    }

    #[test]
    fn paused_timer_ignores_ticks_and_resumes_value() {
        let (mut timer, _) = engine(TimerMode::CountDown);
        timer.start(Some(5));
        timer.tick();
        timer.pause();
        timer.tick();
        timer.tick();
        assert_eq!(timer.state().value, 4);

        // Resume ignores any new duration
        assert!(timer.start(Some(100)));
        assert_eq!(timer.state().value, 4);
        assert_eq!(timer.state().configured_duration, 5);
    }

    #[test]
    fn stopwatch_alarm_fires_once_at_threshold() {
        let (mut timer, alarm) = engine(TimerMode::CountUp);
        assert_eq!(timer.set_alarm_threshold("5"), Some(300));
        timer.start(None);

        for _ in 0..299 {
            assert_eq!(timer.tick(), None);
        }
        assert_eq!(alarm.fired(), 0);

        assert_eq!(timer.tick(), Some(TimerEvent::AlarmReached { at_seconds: 300 }));
        assert_eq!(alarm.fired(), 1);

        for _ in 301..=600 {
            timer.tick();
        }
        assert_eq!(alarm.fired(), 1);
        assert_eq!(timer.state().value, 600);
        assert_eq!(timer.phase(), TimerPhase::Running);
    }

    #[test]
    fn threshold_is_not_retroactive() {
        let (mut timer, alarm) = engine(TimerMode::CountUp);
        timer.start(None);
        for _ in 0..120 {
            timer.tick();
        }

        timer.set_alarm_threshold("1");
        for _ in 0..200 {
            timer.tick();
        }
        assert_eq!(alarm.fired(), 0);
    }

    #[test]
    fn new_threshold_ahead_rearms_alarm() {
        let (mut timer, alarm) = engine(TimerMode::CountUp);
        timer.set_alarm_threshold("1");
        timer.start(None);
        for _ in 0..60 {
            timer.tick();
        }
        assert_eq!(alarm.fired(), 1);

        timer.set_alarm_threshold("2");
        assert!(!timer.state().alarm_fired);
        for _ in 0..60 {
            timer.tick();
        }
        assert_eq!(alarm.fired(), 2);
    }

    #[test]
    fn unparsable_threshold_clears_mark() {
        let (mut timer, _) = engine(TimerMode::CountUp);
        timer.set_alarm_threshold("3");
        assert_eq!(timer.set_alarm_threshold("abc"), None);
        assert_eq!(timer.set_alarm_threshold(""), None);
        assert_eq!(timer.state().alarm_threshold, None);
    }

    #[test]
    fn threshold_reads_leading_digits() {
        let (mut timer, _) = engine(TimerMode::CountUp);
        assert_eq!(timer.set_alarm_threshold("5 min"), Some(300));
        assert_eq!(timer.set_alarm_threshold(" 2"), Some(120));
        assert_eq!(timer.set_alarm_threshold("10.5"), Some(600));
        assert_eq!(timer.set_alarm_threshold("min 5"), None);
    }

    #[test]
    fn countdown_ignores_alarm_threshold() {
        let (mut timer, _) = engine(TimerMode::CountDown);
        assert_eq!(timer.set_alarm_threshold("5"), None);
        assert_eq!(timer.state().alarm_threshold, None);
    }

    #[test]
    fn reset_from_any_phase_returns_to_idle() {
        let expected = |mode| TimerState::new(mode);

        // Running
        let (mut timer, alarm) = engine(TimerMode::CountDown);
        timer.start(Some(30));
        timer.tick();
        timer.reset();
        assert_eq!(timer.state(), &expected(TimerMode::CountDown));
        assert_eq!(alarm.silenced.load(Ordering::SeqCst), 1);

        // Paused
        timer.start(Some(30));
        timer.pause();
        timer.reset();
        assert_eq!(timer.state(), &expected(TimerMode::CountDown));

        // Expired
        timer.start(Some(1));
        timer.tick();
        assert_eq!(timer.phase(), TimerPhase::Expired);
        timer.reset();
        assert_eq!(timer.state(), &expected(TimerMode::CountDown));
    }

    #[test]
    fn reset_keeps_stopwatch_alarm_mark() {
        let (mut timer, _) = engine(TimerMode::CountUp);
        timer.set_alarm_threshold("2");
        timer.start(None);
        timer.tick();
        timer.reset();
        assert_eq!(timer.state().value, 0);
        assert_eq!(timer.state().alarm_threshold, Some(120));
    }

    #[test]
    fn tick_at_zero_does_not_refire() {
        let (mut timer, alarm) = engine(TimerMode::CountDown);
        timer.start(Some(1));
        timer.tick();
        assert_eq!(alarm.fired(), 1);

        // Force the inconsistent "running at zero" state
        timer.state.running = true;
        timer.state.phase = TimerPhase::Running;
        assert_eq!(timer.tick(), None);
        assert_eq!(alarm.fired(), 1);
        assert_eq!(timer.phase(), TimerPhase::Expired);
        assert!(!timer.is_running());
    }

    #[test]
    fn expired_countdown_can_start_fresh() {
        let (mut timer, alarm) = engine(TimerMode::CountDown);
        timer.start(Some(1));
        timer.tick();
        assert!(timer.needs_duration());

        assert!(timer.start(Some(2)));
        assert!(!timer.state().alarm_fired);
        timer.tick();
        timer.tick();
        assert_eq!(alarm.fired(), 2);
    }

    #[test]
    fn stopwatch_start_does_not_reset_value() {
        let (mut timer, _) = engine(TimerMode::CountUp);
        timer.start(None);
        timer.tick();
        timer.tick();
        timer.pause();
        timer.start(None);
        assert_eq!(timer.state().value, 2);
    }
}
