//! Main application state management

use std::{
    sync::{Arc, Mutex},
    time::Instant,
};
use chrono::{DateTime, Utc};
use tracing::info;

use super::{TimerMode, TimerScreen};
use crate::{
    config::Config,
    services::{AlarmTrigger, AudioBackend, AudioResource, SoundSource, Vibrator},
};

/// Main application state: every mounted screen plus server metadata
pub struct AppState {
    pub stopwatch: TimerScreen,
    pub countdown: TimerScreen,
    /// Clip played by the welcome screen
    pub welcome_sound: Arc<AudioResource>,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
    /// Last action tracking
    pub last_action: Mutex<Option<String>>,
    pub last_action_time: Mutex<Option<DateTime<Utc>>>,
}

impl AppState {
    /// Mount every screen. Sounds start preloading immediately, so this must
    /// run inside a tokio runtime.
    pub fn new(config: &Config, backend: Arc<dyn AudioBackend>, vibrator: Arc<dyn Vibrator>) -> Self {
        let alarm_source = SoundSource::parse(&config.alarm_sound);
        let alarm = || {
            AlarmTrigger::with_pattern(
                Arc::new(AudioResource::new(Arc::clone(&backend), alarm_source.clone())),
                Arc::clone(&vibrator),
                config.vibration_pattern.clone(),
            )
        };

        let stopwatch = TimerScreen::mount("stopwatch", TimerMode::CountUp, alarm());
        let countdown = TimerScreen::mount("countdown", TimerMode::CountDown, alarm());

        let welcome_sound = Arc::new(AudioResource::new(
            Arc::clone(&backend),
            SoundSource::parse(&config.welcome_sound),
        ));
        drop(welcome_sound.preload());

        Self {
            stopwatch,
            countdown,
            welcome_sound,
            start_time: Instant::now(),
            port: config.port,
            host: config.host.clone(),
            last_action: Mutex::new(None),
            last_action_time: Mutex::new(None),
        }
    }

    /// Look up a timer screen by its route name
    pub fn screen(&self, name: &str) -> Option<&TimerScreen> {
        match name {
            "stopwatch" => Some(&self.stopwatch),
            "countdown" => Some(&self.countdown),
            _ => None,
        }
    }

    /// Remember the most recent user intent
    pub fn record_action(&self, action: String) {
        if let Ok(mut last_action) = self.last_action.lock() {
            *last_action = Some(action);
        }
        if let Ok(mut last_time) = self.last_action_time.lock() {
            *last_time = Some(Utc::now());
        }
    }

    /// Replay the welcome clip. Returns `false` once shut down.
    pub fn play_welcome(&self) -> bool {
        self.welcome_sound.trigger().is_some()
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }

    /// Get last action information
    pub fn get_last_action(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        let last_action = self.last_action.lock().ok().and_then(|a| a.clone());
        let last_action_time = self.last_action_time.lock().ok().and_then(|t| *t);
        (last_action, last_action_time)
    }

    /// Unmount every screen and release all sounds
    pub fn shutdown(&self) {
        self.stopwatch.unmount();
        self.countdown.unmount();
        drop(self.welcome_sound.release());
        info!("All screens unmounted");
    }
}
