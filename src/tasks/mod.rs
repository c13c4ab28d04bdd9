//! Background tasks module
//!
//! This module contains the periodic tick subscription that drives timers.

pub mod tick_source;

// Re-export main types
pub use tick_source::TickSource;
