//! Pocket Timer - stopwatch and countdown timers with alarm sound and vibration
//!
//! This library provides the timer state machine, its one-second tick
//! source, the preloaded alarm sound with on-demand fallback, and a small
//! HTTP surface through which a UI shell drives the timer screens.

pub mod config;
pub mod state;
pub mod api;
pub mod services;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use state::{AppState, TimerEngine, TimerMode, TimerScreen};
pub use api::create_router;
pub use utils::signals::shutdown_signal;
