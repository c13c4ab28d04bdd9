//! In-memory audio and vibration doubles for unit tests

use std::sync::{
    atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering},
    Arc, Mutex,
};

use async_trait::async_trait;
use tokio::sync::Notify;

use super::{
    audio::{AudioBackend, AudioError, SoundHandle, SoundSource},
    vibration::{VibrationError, Vibrator},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    Load,
    Play(SoundHandle),
    Replay(SoundHandle),
    Stop(SoundHandle),
    Unload(SoundHandle),
}

/// Backend that records every call and fails on request
#[derive(Default)]
pub struct MockBackend {
    next_id: AtomicU64,
    fail_loads: AtomicBool,
    fail_replays: AtomicBool,
    load_gate: Mutex<Option<Arc<Notify>>>,
    calls: Mutex<Vec<Call>>,
}

impl MockBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_fail_loads(&self, fail: bool) {
        self.fail_loads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_replays(&self, fail: bool) {
        self.fail_replays.store(fail, Ordering::SeqCst);
    }

    /// Make every following load wait until the returned gate is notified
    pub fn gate_loads(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.load_gate.lock().unwrap() = Some(Arc::clone(&gate));
        gate
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, matches: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|call| matches(*call)).count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl AudioBackend for MockBackend {
    async fn load(&self, source: &SoundSource) -> Result<SoundHandle, AudioError> {
        self.record(Call::Load);
        let gate = self.load_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if self.fail_loads.load(Ordering::SeqCst) {
            return Err(AudioError::load(source, "simulated load failure"));
        }
        Ok(SoundHandle::new(self.next_id.fetch_add(1, Ordering::SeqCst) + 1))
    }

    async fn play(&self, handle: SoundHandle) -> Result<(), AudioError> {
        self.record(Call::Play(handle));
        Ok(())
    }

    async fn replay(&self, handle: SoundHandle) -> Result<(), AudioError> {
        self.record(Call::Replay(handle));
        if self.fail_replays.load(Ordering::SeqCst) {
            return Err(AudioError::Playback("simulated stale handle".to_string()));
        }
        Ok(())
    }

    async fn stop(&self, handle: SoundHandle) -> Result<(), AudioError> {
        self.record(Call::Stop(handle));
        Ok(())
    }

    async fn unload(&self, handle: SoundHandle) -> Result<(), AudioError> {
        self.record(Call::Unload(handle));
        Ok(())
    }
}

/// Vibrator that remembers requested patterns
#[derive(Default)]
pub struct RecordingVibrator {
    unsupported: bool,
    patterns: Mutex<Vec<Vec<u64>>>,
    cancels: AtomicUsize,
}

impl RecordingVibrator {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn unsupported() -> Arc<Self> {
        Arc::new(Self {
            unsupported: true,
            ..Self::default()
        })
    }

    pub fn patterns(&self) -> Vec<Vec<u64>> {
        self.patterns.lock().unwrap().clone()
    }

    pub fn cancels(&self) -> usize {
        self.cancels.load(Ordering::SeqCst)
    }
}

impl Vibrator for RecordingVibrator {
    fn vibrate(&self, pattern: &[u64]) -> Result<(), VibrationError> {
        if self.unsupported {
            return Err(VibrationError::Unsupported);
        }
        self.patterns.lock().unwrap().push(pattern.to_vec());
        Ok(())
    }

    fn cancel(&self) -> Result<(), VibrationError> {
        self.cancels.fetch_add(1, Ordering::SeqCst);
        if self.unsupported {
            return Err(VibrationError::Unsupported);
        }
        Ok(())
    }
}

/// Let spawned tasks on the current-thread test runtime run to completion
pub async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}
