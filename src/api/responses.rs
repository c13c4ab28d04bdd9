//! API response structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::state::TimerSnapshot;

/// Body of the text-input intents
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextInput {
    pub text: String,
}

/// API response structure for timer intents
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub timer: TimerSnapshot,
}

impl TimerResponse {
    /// Create a new API response, using the timer phase as status
    pub fn new(message: String, timer: TimerSnapshot) -> Self {
        let status = serde_json::to_value(timer.phase)
            .ok()
            .and_then(|phase| phase.as_str().map(str::to_string))
            .unwrap_or_default();
        Self {
            status,
            message,
            timestamp: Utc::now(),
            timer,
        }
    }
}

/// Plain status message, used for errors and the welcome sound
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl MessageResponse {
    pub fn new(status: &str, message: String) -> Self {
        Self {
            status: status.to_string(),
            message,
            timestamp: Utc::now(),
        }
    }

    pub fn error(message: String) -> Self {
        Self::new("error", message)
    }
}

/// Status response with both timers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub stopwatch: TimerSnapshot,
    pub countdown: TimerSnapshot,
    pub uptime: String,
    pub port: u16,
    pub host: String,
    pub last_action: Option<String>,
    pub last_action_time: Option<DateTime<Utc>>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    /// Create a new health response
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
