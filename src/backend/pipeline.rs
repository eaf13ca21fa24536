//! Backend pipeline for running requests off the UI thread
//!
//! The UI sends [`BackendCommand`]s and drains [`BackendEvent`]s once per frame.
//! A worker thread owns a tokio runtime and runs every command as its own task,
//! so calls overlap and complete in any order.

use crate::backend::client::BackendClient;
use crate::config::ClientConfig;
use crate::{Result, SapError};
use crossbeam_channel::{unbounded, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use tokio::runtime::Runtime;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Commands that can be sent to the backend pipeline
#[derive(Debug, Clone)]
pub enum BackendCommand {
    /// Ask the assistant
    Query {
        text: Option<String>,
        image_base64: Option<String>,
        request_id: Uuid,
    },

    /// Transcribe a WAV recording
    Transcribe { wav: Vec<u8>, request_id: Uuid },

    /// Synthesize speech for a transcript message
    Synthesize {
        text: String,
        message_index: usize,
        request_id: Uuid,
    },

    /// Shutdown the pipeline
    Shutdown,
}

/// Events emitted by the backend pipeline
#[derive(Debug, Clone)]
pub enum BackendEvent {
    /// The assistant answered a query
    Answer { answer: String, request_id: Uuid },

    /// A query failed (transport or malformed response)
    QueryFailed { error: SapError, request_id: Uuid },

    /// A recording was transcribed
    Transcript { text: String, request_id: Uuid },

    /// Transcription failed
    TranscriptionFailed { error: SapError, request_id: Uuid },

    /// Synthesized audio is ready to play
    Speech {
        audio: Vec<u8>,
        message_index: usize,
        request_id: Uuid,
    },

    /// Speech synthesis failed
    SynthesisFailed {
        error: SapError,
        message_index: usize,
        request_id: Uuid,
    },

    /// Pipeline has shut down
    Shutdown,
}

type Waker = Arc<dyn Fn() + Send + Sync>;

/// UI-side ends of the pipeline channels
#[derive(Clone)]
pub struct BackendHandle {
    command_tx: Sender<BackendCommand>,
    event_rx: Receiver<BackendEvent>,
}

impl BackendHandle {
    /// Wrap an existing channel pair. Tests use this to play the worker.
    pub fn from_channels(command_tx: Sender<BackendCommand>, event_rx: Receiver<BackendEvent>) -> Self {
        Self {
            command_tx,
            event_rx,
        }
    }

    /// Send a command to the worker
    pub fn send(&self, command: BackendCommand) -> Result<()> {
        self.command_tx
            .send(command)
            .map_err(|e| SapError::ChannelError(format!("Failed to send command: {}", e)))
    }

    /// Try to receive an event without blocking
    pub fn try_recv(&self) -> Option<BackendEvent> {
        match self.event_rx.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => None,
        }
    }
}

/// Backend pipeline with channel-based communication
pub struct BackendPipeline {
    client: BackendClient,
    command_tx: Sender<BackendCommand>,
    command_rx: Receiver<BackendCommand>,
    event_tx: Sender<BackendEvent>,
    event_rx: Receiver<BackendEvent>,
    waker: Option<Waker>,
}

impl BackendPipeline {
    /// Create a new pipeline for the given configuration
    pub fn new(config: ClientConfig) -> Result<Self> {
        let client = BackendClient::new(config)?;
        // Unbounded so tasks never block on a UI that stopped draining
        let (command_tx, command_rx) = unbounded();
        let (event_tx, event_rx) = unbounded();

        Ok(Self {
            client,
            command_tx,
            command_rx,
            event_tx,
            event_rx,
            waker: None,
        })
    }

    /// Call `waker` after every event so the UI repaints promptly
    pub fn with_waker(mut self, waker: impl Fn() + Send + Sync + 'static) -> Self {
        self.waker = Some(Arc::new(waker));
        self
    }

    /// Get the UI-side handle
    pub fn handle(&self) -> BackendHandle {
        BackendHandle::from_channels(self.command_tx.clone(), self.event_rx.clone())
    }

    /// Start the pipeline worker thread and return the UI-side handle
    pub fn start_worker(self) -> Result<BackendHandle> {
        let handle = self.handle();
        let BackendPipeline {
            client,
            command_rx,
            event_tx,
            waker,
            ..
        } = self;

        let runtime = Runtime::new()
            .map_err(|e| SapError::ChannelError(format!("Runtime creation failed: {}", e)))?;

        std::thread::Builder::new()
            .name("sap-backend".to_string())
            .spawn(move || {
                info!("Backend pipeline worker ready");
                let emitter = Emitter { event_tx, waker };

                loop {
                    match command_rx.recv() {
                        Ok(BackendCommand::Shutdown) | Err(_) => {
                            info!("Backend pipeline shutting down");
                            emitter.emit(BackendEvent::Shutdown);
                            break;
                        }
                        Ok(command) => {
                            let client = client.clone();
                            let emitter = emitter.clone();
                            runtime.spawn(async move {
                                let event = run_command(&client, command).await;
                                emitter.emit(event);
                            });
                        }
                    }
                }

                // In-flight requests are abandoned with the runtime
                runtime.shutdown_background();
            })
            .map_err(|e| SapError::ChannelError(format!("Failed to spawn worker: {}", e)))?;

        Ok(handle)
    }
}

#[derive(Clone)]
struct Emitter {
    event_tx: Sender<BackendEvent>,
    waker: Option<Waker>,
}

impl Emitter {
    fn emit(&self, event: BackendEvent) {
        if let Err(e) = self.event_tx.send(event) {
            error!("Failed to deliver backend event: {}", e);
            return;
        }
        if let Some(waker) = &self.waker {
            waker();
        }
    }
}

async fn run_command(client: &BackendClient, command: BackendCommand) -> BackendEvent {
    match command {
        BackendCommand::Query {
            text,
            image_base64,
            request_id,
        } => {
            debug!("Processing query request: {}", request_id);
            match client.query(text, image_base64).await {
                Ok(response) => BackendEvent::Answer {
                    answer: response.answer,
                    request_id,
                },
                Err(error) => {
                    warn!("Query {} failed: {}", request_id, error);
                    BackendEvent::QueryFailed { error, request_id }
                }
            }
        }
        BackendCommand::Transcribe { wav, request_id } => {
            debug!("Processing transcription request: {} ({} bytes)", request_id, wav.len());
            match client.transcribe(wav).await {
                Ok(text) => BackendEvent::Transcript { text, request_id },
                Err(error) => {
                    warn!("Transcription {} failed: {}", request_id, error);
                    BackendEvent::TranscriptionFailed { error, request_id }
                }
            }
        }
        BackendCommand::Synthesize {
            text,
            message_index,
            request_id,
        } => {
            debug!("Processing speech request: {} (message {})", request_id, message_index);
            match client.synthesize(&text).await {
                Ok(audio) => BackendEvent::Speech {
                    audio,
                    message_index,
                    request_id,
                },
                Err(error) => {
                    warn!("Speech synthesis {} failed: {}", request_id, error);
                    BackendEvent::SynthesisFailed {
                        error,
                        message_index,
                        request_id,
                    }
                }
            }
        }
        // Handled by the worker loop
        BackendCommand::Shutdown => BackendEvent::Shutdown,
    }
}
