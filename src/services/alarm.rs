//! Alarm side effect: sound plus vibration

use std::sync::Arc;
use tracing::{debug, warn};

use super::{
    audio::AudioResource,
    vibration::{VibrationError, Vibrator, ALARM_PATTERN_MS},
};
use crate::state::Alarm;

/// Plays the alarm sound and vibrates the device.
///
/// The two halves are independent: a missing motor never keeps the sound
/// from playing and a broken sound never keeps the device from vibrating.
pub struct AlarmTrigger {
    audio: Arc<AudioResource>,
    vibrator: Arc<dyn Vibrator>,
    pattern: Vec<u64>,
}

impl AlarmTrigger {
    pub fn new(audio: Arc<AudioResource>, vibrator: Arc<dyn Vibrator>) -> Self {
        Self::with_pattern(audio, vibrator, ALARM_PATTERN_MS.to_vec())
    }

    pub fn with_pattern(
        audio: Arc<AudioResource>,
        vibrator: Arc<dyn Vibrator>,
        pattern: Vec<u64>,
    ) -> Self {
        Self {
            audio,
            vibrator,
            pattern,
        }
    }

    pub fn audio(&self) -> &Arc<AudioResource> {
        &self.audio
    }

    pub fn pattern(&self) -> &[u64] {
        &self.pattern
    }
}

impl Alarm for AlarmTrigger {
    fn fire(&self) {
        match self.vibrator.vibrate(&self.pattern) {
            Ok(()) => debug!("Vibrating with pattern {:?}", self.pattern),
            Err(VibrationError::Unsupported) => debug!("Skipping vibration, no motor available"),
            Err(e) => warn!("{}", e),
        }

        // Fire and forget; the task reports back to the resource on its own
        drop(self.audio.trigger());
    }

    fn silence(&self) {
        drop(self.audio.stop());
        if let Err(e) = self.vibrator.cancel() {
            debug!("Ignoring vibration cancel failure: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{
        audio::{SoundHandle, SoundSource, ALARM_SOUND_URI},
        testing::{settle, Call, MockBackend, RecordingVibrator},
    };

    fn audio(backend: &Arc<MockBackend>) -> Arc<AudioResource> {
        Arc::new(AudioResource::new(
            backend.clone(),
            SoundSource::parse(ALARM_SOUND_URI),
        ))
    }

    #[tokio::test]
    async fn fire_vibrates_and_plays() {
        let backend = MockBackend::new();
        let vibrator = RecordingVibrator::new();
        let sound = audio(&backend);
        sound.preload().await.unwrap();

        let alarm = AlarmTrigger::new(sound, vibrator.clone());
        alarm.fire();
        settle().await;

        assert_eq!(vibrator.patterns(), vec![ALARM_PATTERN_MS.to_vec()]);
        assert_eq!(backend.count(|call| *call == Call::Replay(SoundHandle::new(1))), 1);
    }

    #[tokio::test]
    async fn missing_motor_does_not_block_sound() {
        let backend = MockBackend::new();
        let sound = audio(&backend);
        sound.preload().await.unwrap();

        let alarm = AlarmTrigger::new(sound, RecordingVibrator::unsupported());
        alarm.fire();
        settle().await;

        assert_eq!(backend.count(|call| matches!(call, Call::Replay(_))), 1);
    }

    #[tokio::test]
    async fn broken_sound_does_not_block_vibration() {
        let backend = MockBackend::new();
        backend.set_fail_loads(true);
        let vibrator = RecordingVibrator::new();
        let sound = audio(&backend);
        sound.preload().await.unwrap();

        let alarm = AlarmTrigger::with_pattern(sound, vibrator.clone(), vec![1_000]);
        alarm.fire();
        settle().await;

        assert_eq!(vibrator.patterns(), vec![vec![1_000]]);
        assert_eq!(backend.count(|call| matches!(call, Call::Play(_))), 0);
    }

    #[tokio::test]
    async fn silence_stops_sound_and_cancels_vibration() {
        let backend = MockBackend::new();
        let vibrator = RecordingVibrator::new();
        let sound = audio(&backend);
        sound.preload().await.unwrap();

        let alarm = AlarmTrigger::new(sound, vibrator.clone());
        alarm.fire();
        alarm.silence();
        settle().await;

        assert_eq!(vibrator.cancels(), 1);
        assert_eq!(backend.calls().last(), Some(&Call::Stop(SoundHandle::new(1))));
    }
}
