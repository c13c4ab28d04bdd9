//! Audio backend for hosts without an output device

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Mutex,
    },
};

use async_trait::async_trait;
use tracing::info;

use super::audio::{fetch_sound, AudioBackend, AudioError, SoundHandle, SoundSource};

/// Loads sounds for real but only logs playback.
///
/// Loading still exercises the network or disk, so preload failures and the
/// on-demand fallback behave exactly as with a real device.
pub struct HeadlessBackend {
    client: reqwest::Client,
    next_id: AtomicU64,
    sounds: Mutex<HashMap<SoundHandle, LoadedSound>>,
}

struct LoadedSound {
    source: SoundSource,
    size: usize,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            next_id: AtomicU64::new(1),
            sounds: Mutex::new(HashMap::new()),
        }
    }

    fn describe(&self, handle: SoundHandle) -> Result<String, AudioError> {
        let sounds = self
            .sounds
            .lock()
            .map_err(|e| AudioError::Playback(format!("Failed to lock sound table: {}", e)))?;
        sounds
            .get(&handle)
            .map(|sound| format!("{} ({} bytes)", sound.source, sound.size))
            .ok_or_else(|| AudioError::Playback(format!("sound {} is not loaded", handle.id())))
    }
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AudioBackend for HeadlessBackend {
    async fn load(&self, source: &SoundSource) -> Result<SoundHandle, AudioError> {
        let bytes = fetch_sound(&self.client, source).await?;
        let handle = SoundHandle::new(self.next_id.fetch_add(1, Ordering::SeqCst));

        self.sounds
            .lock()
            .map_err(|e| AudioError::load(source, format!("Failed to lock sound table: {}", e)))?
            .insert(
                handle,
                LoadedSound {
                    source: source.clone(),
                    size: bytes.len(),
                },
            );
        Ok(handle)
    }

    async fn play(&self, handle: SoundHandle) -> Result<(), AudioError> {
        let sound = self.describe(handle)?;
        info!("Playing {} without an audio device", sound);
        Ok(())
    }

    async fn replay(&self, handle: SoundHandle) -> Result<(), AudioError> {
        let sound = self.describe(handle)?;
        info!("Replaying {} without an audio device", sound);
        Ok(())
    }

    async fn stop(&self, handle: SoundHandle) -> Result<(), AudioError> {
        self.describe(handle).map(|_| ())
    }

    async fn unload(&self, handle: SoundHandle) -> Result<(), AudioError> {
        let removed = self
            .sounds
            .lock()
            .map_err(|e| AudioError::Playback(format!("Failed to lock sound table: {}", e)))?
            .remove(&handle);
        removed
            .map(|_| ())
            .ok_or_else(|| AudioError::Playback(format!("sound {} is not loaded", handle.id())))
    }
}
