//! State management module
//!
//! This module contains the timer state machine, the per-screen controller
//! around it, and the application state shared with the HTTP handlers.

pub mod app_state;
pub mod duration_input;
pub mod timer_engine;
pub mod timer_screen;
pub mod timer_state;

// Re-export main types
pub use app_state::AppState;
pub use duration_input::DurationInput;
pub use timer_engine::{Alarm, TimerEngine, TimerEvent};
pub use timer_screen::{ScreenError, TimerScreen};
pub use timer_state::{TimerMode, TimerPhase, TimerSnapshot, TimerState};
