//! Preloaded, replayable sound resource
//!
//! [`AudioResource`] owns one sound for the lifetime of a screen. Loading and
//! playback run on spawned tasks; their results come back through a channel
//! that the resource drains whenever it is used, so nothing that drives a
//! timer ever waits on audio.

use std::{
    fmt,
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, MutexGuard, PoisonError,
    },
};

use async_trait::async_trait;
use thiserror::Error;
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{debug, error, info, warn};

/// Alarm played by both the stopwatch mark and countdown expiry
pub const ALARM_SOUND_URI: &str = "https://actions.google.com/sounds/v1/alarms/alarm_clock.ogg";

/// Where a sound comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SoundSource {
    /// Fetched over HTTP(S)
    Remote(String),
    /// Shipped alongside the binary
    Bundled(PathBuf),
}

impl SoundSource {
    /// Interpret a location string: `http://` and `https://` URLs are remote,
    /// anything else is a path to a bundled asset.
    pub fn parse(location: &str) -> Self {
        if location.starts_with("http://") || location.starts_with("https://") {
            Self::Remote(location.to_string())
        } else {
            Self::Bundled(PathBuf::from(location))
        }
    }
}

impl fmt::Display for SoundSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Remote(url) => f.write_str(url),
            Self::Bundled(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Backend-issued identifier of a loaded sound
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SoundHandle(u64);

impl SoundHandle {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(self) -> u64 {
        self.0
    }
}

#[derive(Error, Debug)]
pub enum AudioError {
    #[error("Failed to load sound from {uri}: {reason}")]
    Load { uri: String, reason: String },
    #[error("Failed to play sound: {0}")]
    Playback(String),
}

impl AudioError {
    pub fn load(source: &SoundSource, reason: impl fmt::Display) -> Self {
        Self::Load {
            uri: source.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Platform audio facility
#[async_trait]
pub trait AudioBackend: Send + Sync {
    /// Load a sound without playing it
    async fn load(&self, source: &SoundSource) -> Result<SoundHandle, AudioError>;

    /// Play a loaded sound from its current position
    async fn play(&self, handle: SoundHandle) -> Result<(), AudioError>;

    /// Rewind a loaded sound and play it from the start
    async fn replay(&self, handle: SoundHandle) -> Result<(), AudioError>;

    async fn stop(&self, handle: SoundHandle) -> Result<(), AudioError>;

    async fn unload(&self, handle: SoundHandle) -> Result<(), AudioError>;
}

/// Read the raw bytes of a sound from the network or disk
pub async fn fetch_sound(
    client: &reqwest::Client,
    source: &SoundSource,
) -> Result<Vec<u8>, AudioError> {
    let bytes = match source {
        SoundSource::Remote(url) => client
            .get(url)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| AudioError::load(source, e))?
            .bytes()
            .await
            .map_err(|e| AudioError::load(source, e))?
            .to_vec(),
        SoundSource::Bundled(path) => tokio::fs::read(path)
            .await
            .map_err(|e| AudioError::load(source, e))?,
    };

    if bytes.is_empty() {
        return Err(AudioError::load(source, "sound file is empty"));
    }
    Ok(bytes)
}

/// Results reported by background load tasks
#[derive(Debug)]
enum LoadOutcome {
    Preloaded(SoundHandle),
    PreloadFailed,
    /// A fallback load that already started playing
    Replaced(SoundHandle),
}

impl LoadOutcome {
    fn handle(self) -> Option<SoundHandle> {
        match self {
            Self::Preloaded(handle) | Self::Replaced(handle) => Some(handle),
            Self::PreloadFailed => None,
        }
    }
}

#[derive(Debug, Default)]
struct Slot {
    handle: Option<SoundHandle>,
    preload_failed: bool,
}

/// The pieces a spawned task needs to hand its result back
#[derive(Clone)]
struct Reporter {
    backend: Arc<dyn AudioBackend>,
    live: Arc<AtomicBool>,
    tx: mpsc::UnboundedSender<LoadOutcome>,
}

impl Reporter {
    /// Hand an outcome to the resource, or unload its sound if the resource
    /// has been released in the meantime.
    async fn deliver(&self, outcome: LoadOutcome) {
        let undelivered = if self.live.load(Ordering::SeqCst) {
            self.tx
                .send(outcome)
                .err()
                .map(|mpsc::error::SendError(outcome)| outcome)
        } else {
            Some(outcome)
        };

        if let Some(handle) = undelivered.and_then(LoadOutcome::handle) {
            debug!("Sound {} arrived after release, unloading", handle.id());
            if let Err(e) = self.backend.unload(handle).await {
                warn!("Failed to unload orphaned sound: {}", e);
            }
        }
    }
}

/// One loadable, replayable sound owned by a screen
pub struct AudioResource {
    backend: Arc<dyn AudioBackend>,
    source: SoundSource,
    slot: Mutex<Slot>,
    live: Arc<AtomicBool>,
    outcome_tx: mpsc::UnboundedSender<LoadOutcome>,
    outcome_rx: Mutex<Option<mpsc::UnboundedReceiver<LoadOutcome>>>,
}

impl AudioResource {
    pub fn new(backend: Arc<dyn AudioBackend>, source: SoundSource) -> Self {
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();
        Self {
            backend,
            source,
            slot: Mutex::new(Slot::default()),
            live: Arc::new(AtomicBool::new(true)),
            outcome_tx,
            outcome_rx: Mutex::new(Some(outcome_rx)),
        }
    }

    pub fn source(&self) -> &SoundSource {
        &self.source
    }

    /// Whether `release` has not been called yet
    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }

    /// Whether a ready handle is held
    pub fn is_loaded(&self) -> bool {
        self.apply_pending();
        lock(&self.slot).handle.is_some()
    }

    pub fn preload_failed(&self) -> bool {
        self.apply_pending();
        lock(&self.slot).preload_failed
    }

    /// Start loading the sound in the background.
    ///
    /// Failure is logged and remembered; the sound is then loaded on demand
    /// by `trigger`.
    pub fn preload(&self) -> JoinHandle<()> {
        let reporter = self.reporter();
        let source = self.source.clone();

        tokio::spawn(async move {
            match reporter.backend.load(&source).await {
                Ok(handle) => {
                    info!("Preloaded sound {}", source);
                    reporter.deliver(LoadOutcome::Preloaded(handle)).await;
                }
                Err(e) => {
                    warn!("Could not preload sound, will load on demand: {}", e);
                    reporter.deliver(LoadOutcome::PreloadFailed).await;
                }
            }
        })
    }

    /// Play the sound from the start without waiting for it.
    ///
    /// Replays the preloaded handle when there is one. If that fails, or
    /// nothing is loaded, a fresh copy is loaded and played; it replaces the
    /// old handle only once it is playing. Returns `None` after release.
    pub fn trigger(&self) -> Option<JoinHandle<()>> {
        if !self.is_live() {
            debug!("Ignoring trigger on released sound {}", self.source);
            return None;
        }
        self.apply_pending();

        let current = lock(&self.slot).handle;
        let reporter = self.reporter();
        let source = self.source.clone();

        Some(tokio::spawn(async move {
            match current {
                Some(handle) => match reporter.backend.replay(handle).await {
                    Ok(()) => {
                        debug!("Replaying sound {}", source);
                        return;
                    }
                    Err(e) => warn!("Preloaded sound failed to replay, loading a fresh copy: {}", e),
                },
                None => debug!("Sound {} is not loaded, loading on demand", source),
            }

            let fresh = match reporter.backend.load(&source).await {
                Ok(handle) => handle,
                Err(e) => {
                    error!("Could not play sound: {}", e);
                    return;
                }
            };

            if let Err(e) = reporter.backend.play(fresh).await {
                error!("Could not play freshly loaded sound: {}", e);
                if let Err(e) = reporter.backend.unload(fresh).await {
                    warn!("Failed to unload sound {}: {}", fresh.id(), e);
                }
                return;
            }

            reporter.deliver(LoadOutcome::Replaced(fresh)).await;
        }))
    }

    /// Stop playback. Errors are ignored.
    pub fn stop(&self) -> Option<JoinHandle<()>> {
        self.apply_pending();
        let handle = lock(&self.slot).handle?;
        let backend = Arc::clone(&self.backend);

        Some(tokio::spawn(async move {
            if let Err(e) = backend.stop(handle).await {
                debug!("Ignoring failed stop of sound {}: {}", handle.id(), e);
            }
        }))
    }

    /// Unload everything this resource holds. Only the first call does
    /// anything; loads still in flight unload their own result on arrival.
    pub fn release(&self) -> Option<JoinHandle<()>> {
        if !self.live.swap(false, Ordering::SeqCst) {
            return None;
        }

        let mut handles = Vec::new();
        if let Some(mut rx) = lock(&self.outcome_rx).take() {
            rx.close();
            while let Ok(outcome) = rx.try_recv() {
                handles.extend(outcome.handle());
            }
        }
        handles.extend(lock(&self.slot).handle.take());

        info!("Releasing sound {} ({} handle(s))", self.source, handles.len());
        let backend = Arc::clone(&self.backend);

        Some(tokio::spawn(async move {
            for handle in handles {
                if let Err(e) = backend.unload(handle).await {
                    warn!("Failed to unload sound {}: {}", handle.id(), e);
                }
            }
        }))
    }

    fn reporter(&self) -> Reporter {
        Reporter {
            backend: Arc::clone(&self.backend),
            live: Arc::clone(&self.live),
            tx: self.outcome_tx.clone(),
        }
    }

    /// Fold finished background loads into the slot
    fn apply_pending(&self) {
        let mut receiver = lock(&self.outcome_rx);
        let Some(rx) = receiver.as_mut() else {
            return;
        };

        let mut slot = lock(&self.slot);
        while let Ok(outcome) = rx.try_recv() {
            match outcome {
                LoadOutcome::Preloaded(handle) => {
                    slot.preload_failed = false;
                    // A fallback copy that got here first may be playing
                    if slot.handle.is_some() {
                        debug!("Sound already loaded, dropping late preload {}", handle.id());
                        self.discard(handle);
                    } else {
                        slot.handle = Some(handle);
                    }
                }
                LoadOutcome::PreloadFailed => {
                    if slot.handle.is_none() {
                        slot.preload_failed = true;
                    }
                }
                LoadOutcome::Replaced(handle) => {
                    debug!("Swapping in freshly loaded sound {}", handle.id());
                    if let Some(old) = slot.handle.replace(handle) {
                        self.discard(old);
                    }
                }
            }
        }
    }

    fn discard(&self, handle: SoundHandle) {
        let backend = Arc::clone(&self.backend);
        tokio::spawn(async move {
            if let Err(e) = backend.unload(handle).await {
                warn!("Failed to unload replaced sound {}: {}", handle.id(), e);
            }
        });
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
