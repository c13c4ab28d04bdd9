//! Platform services module
//!
//! Audio playback, vibration, and the alarm that combines them.

pub mod alarm;
pub mod audio;
pub mod headless;
#[cfg(feature = "playback")]
pub mod playback;
pub mod vibration;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;

// Re-export main types
pub use alarm::AlarmTrigger;
pub use audio::{AudioBackend, AudioError, AudioResource, SoundHandle, SoundSource, ALARM_SOUND_URI};
pub use headless::HeadlessBackend;
pub use vibration::{NoVibrator, VibrationError, Vibrator, ALARM_PATTERN_MS};

/// Pick the best audio backend this build and host support
pub fn default_audio_backend() -> Arc<dyn AudioBackend> {
    #[cfg(feature = "playback")]
    match playback::RodioBackend::new() {
        Ok(backend) => return Arc::new(backend),
        Err(e) => tracing::warn!("{}, continuing without sound output", e),
    }

    tracing::info!("Using headless audio backend");
    Arc::new(HeadlessBackend::new())
}
