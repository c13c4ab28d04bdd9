//! Timer state structure and render snapshot

use serde::{Deserialize, Serialize};

use crate::utils::format_clock;

/// Direction a timer counts in. Fixed for the lifetime of a screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerMode {
    /// Stopwatch: counts elapsed seconds indefinitely
    CountUp,
    /// Countdown: counts remaining seconds down to zero
    CountDown,
}

/// Lifecycle phase of a timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerPhase {
    Idle,
    Running,
    Paused,
    /// Countdown reached zero. Only left through `reset` or a fresh start.
    Expired,
}

/// Timer state for one screen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerState {
    pub mode: TimerMode,
    pub phase: TimerPhase,
    /// Elapsed seconds (count-up) or remaining seconds (count-down)
    pub value: u64,
    /// Duration the countdown was started with, 0 when not configured
    pub configured_duration: u64,
    pub running: bool,
    /// Stopwatch alarm mark in seconds
    pub alarm_threshold: Option<u64>,
    pub alarm_fired: bool,
}

impl TimerState {
    /// Create an idle timer state
    pub fn new(mode: TimerMode) -> Self {
        Self {
            mode,
            phase: TimerPhase::Idle,
            value: 0,
            configured_duration: 0,
            running: false,
            alarm_threshold: None,
            alarm_fired: false,
        }
    }

    /// Check if the timer is consuming ticks
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Remaining fraction of a configured countdown, for the progress ring
    pub fn progress(&self) -> Option<f64> {
        if self.mode != TimerMode::CountDown || self.configured_duration == 0 {
            return None;
        }
        Some(self.value as f64 / self.configured_duration as f64)
    }

    /// Current value formatted as `MM:SS`
    pub fn display(&self) -> String {
        format_clock(self.value)
    }
}

/// Everything a UI needs to render one timer screen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerSnapshot {
    pub mode: TimerMode,
    pub phase: TimerPhase,
    pub value: u64,
    pub display: String,
    pub configured_duration: u64,
    pub progress: Option<f64>,
    pub running: bool,
    pub alarm_threshold: Option<u64>,
    pub alarm_fired: bool,
    pub minutes_text: String,
    pub seconds_text: String,
    pub alarm_minute_text: String,
}

impl TimerSnapshot {
    pub fn idle(mode: TimerMode) -> Self {
        let state = TimerState::new(mode);
        Self {
            mode,
            phase: state.phase,
            value: 0,
            display: state.display(),
            configured_duration: 0,
            progress: None,
            running: false,
            alarm_threshold: None,
            alarm_fired: false,
            minutes_text: String::new(),
            seconds_text: String::new(),
            alarm_minute_text: String::new(),
        }
    }
}
