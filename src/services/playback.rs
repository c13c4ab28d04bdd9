//! Audio backend playing through the default output device with rodio
//!
//! rodio's output stream cannot leave the thread that opened it, so a
//! dedicated thread owns the stream and every sink. The async side fetches
//! and validates sound bytes, then talks to that thread over a channel.

use std::{
    collections::HashMap,
    io::Cursor,
    sync::{
        atomic::{AtomicU64, Ordering},
        mpsc as std_mpsc, Arc,
    },
    thread,
};

use async_trait::async_trait;
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};
use tokio::sync::oneshot;
use tracing::{debug, error, info};

use super::audio::{fetch_sound, AudioBackend, AudioError, SoundHandle, SoundSource};

type Reply = oneshot::Sender<Result<(), AudioError>>;

enum Command {
    Register { handle: SoundHandle, bytes: Arc<[u8]> },
    Play { handle: SoundHandle, reply: Reply },
    Stop { handle: SoundHandle, reply: Reply },
    Unload { handle: SoundHandle },
}

struct LoadedSound {
    bytes: Arc<[u8]>,
    sink: Option<Sink>,
}

pub struct RodioBackend {
    client: reqwest::Client,
    next_id: AtomicU64,
    commands: std_mpsc::Sender<Command>,
}

impl RodioBackend {
    /// Open the default output device on a dedicated thread
    pub fn new() -> Result<Self, AudioError> {
        let (commands, command_rx) = std_mpsc::channel();
        let (ready_tx, ready_rx) = std_mpsc::channel();

        thread::Builder::new()
            .name("audio-output".to_string())
            .spawn(move || match OutputStream::try_default() {
                Ok((_stream, stream_handle)) => {
                    let _ = ready_tx.send(Ok(()));
                    output_loop(&stream_handle, command_rx);
                }
                Err(e) => {
                    let _ = ready_tx.send(Err(AudioError::Playback(format!(
                        "No audio output device: {}",
                        e
                    ))));
                }
            })
            .map_err(|e| AudioError::Playback(format!("Failed to start audio thread: {}", e)))?;

        ready_rx
            .recv()
            .map_err(|_| AudioError::Playback("Audio thread exited during startup".to_string()))??;

        info!("Audio output device opened");
        Ok(Self {
            client: reqwest::Client::new(),
            next_id: AtomicU64::new(1),
            commands,
        })
    }

    fn send(&self, command: Command) -> Result<(), AudioError> {
        self.commands
            .send(command)
            .map_err(|_| AudioError::Playback("Audio thread has stopped".to_string()))
    }

    async fn request(
        &self,
        command: impl FnOnce(Reply) -> Command,
    ) -> Result<(), AudioError> {
        let (reply, response) = oneshot::channel();
        self.send(command(reply))?;
        response
            .await
            .map_err(|_| AudioError::Playback("Audio thread dropped the request".to_string()))?
    }
}

#[async_trait]
impl AudioBackend for RodioBackend {
    async fn load(&self, source: &SoundSource) -> Result<SoundHandle, AudioError> {
        let bytes: Arc<[u8]> = fetch_sound(&self.client, source).await?.into();

        // Reject undecodable data here instead of at alarm time
        Decoder::new(Cursor::new(Arc::clone(&bytes))).map_err(|e| AudioError::load(source, e))?;

        let handle = SoundHandle::new(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.send(Command::Register { handle, bytes })?;
        debug!("Loaded {} as sound {}", source, handle.id());
        Ok(handle)
    }

    async fn play(&self, handle: SoundHandle) -> Result<(), AudioError> {
        self.request(|reply| Command::Play { handle, reply }).await
    }

    async fn replay(&self, handle: SoundHandle) -> Result<(), AudioError> {
        // Every play starts a fresh decoder at the beginning of the sound
        self.request(|reply| Command::Play { handle, reply }).await
    }

    async fn stop(&self, handle: SoundHandle) -> Result<(), AudioError> {
        self.request(|reply| Command::Stop { handle, reply }).await
    }

    async fn unload(&self, handle: SoundHandle) -> Result<(), AudioError> {
        self.send(Command::Unload { handle })
    }
}

fn output_loop(stream: &OutputStreamHandle, commands: std_mpsc::Receiver<Command>) {
    let mut sounds: HashMap<SoundHandle, LoadedSound> = HashMap::new();

    while let Ok(command) = commands.recv() {
        match command {
            Command::Register { handle, bytes } => {
                sounds.insert(handle, LoadedSound { bytes, sink: None });
            }
            Command::Play { handle, reply } => {
                let result = start_playback(stream, &mut sounds, handle);
                if let Err(e) = &result {
                    error!("{}", e);
                }
                let _ = reply.send(result);
            }
            Command::Stop { handle, reply } => {
                let result = match sounds.get_mut(&handle) {
                    Some(sound) => {
                        if let Some(sink) = sound.sink.take() {
                            sink.stop();
                        }
                        Ok(())
                    }
                    None => Err(not_loaded(handle)),
                };
                let _ = reply.send(result);
            }
            Command::Unload { handle } => {
                if let Some(sound) = sounds.remove(&handle) {
                    if let Some(sink) = sound.sink {
                        sink.stop();
                    }
                    debug!("Unloaded sound {}", handle.id());
                }
            }
        }
    }

    debug!("Audio output thread exiting");
}

fn start_playback(
    stream: &OutputStreamHandle,
    sounds: &mut HashMap<SoundHandle, LoadedSound>,
    handle: SoundHandle,
) -> Result<(), AudioError> {
    let sound = sounds.get_mut(&handle).ok_or_else(|| not_loaded(handle))?;

    if let Some(previous) = sound.sink.take() {
        previous.stop();
    }

    let decoder = Decoder::new(Cursor::new(Arc::clone(&sound.bytes)))
        .map_err(|e| AudioError::Playback(e.to_string()))?;
    let sink = Sink::try_new(stream).map_err(|e| AudioError::Playback(e.to_string()))?;
    sink.append(decoder);
    sound.sink = Some(sink);
    Ok(())
}

fn not_loaded(handle: SoundHandle) -> AudioError {
    AudioError::Playback(format!("sound {} is not loaded", handle.id()))
}
