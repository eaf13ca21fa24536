//! Chat session state
//!
//! `AppState` owns everything the chat window shows and performs every user
//! action. It lives on the UI thread; network results arrive as
//! [`BackendEvent`]s drained by [`AppState::poll_events`].

use crate::attachment::{ClipboardImage, ImageClipboard, PendingAttachment};
use crate::audio::{encode_wav, NullRecorder, NullSpeaker, Recorder, Speaker};
use crate::backend::{BackendCommand, BackendEvent, BackendHandle};
use crate::messages::{Message, Role, Transcript};
use crate::{Result, SapError};
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Assistant text appended when a query fails
pub const BACKEND_ERROR_MESSAGE: &str = "Error contacting backend.";

/// Recording state for voice input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingState {
    /// Not recording
    Idle,
    /// Currently recording audio
    Recording,
}

/// Central application state
pub struct AppState {
    /// Conversation so far
    pub transcript: Transcript,

    /// Current text input
    pub input_text: String,

    /// Image staged for the next message
    pub pending_attachment: Option<PendingAttachment>,

    /// Recording state
    pub recording_state: RecordingState,

    /// Index of the assistant message whose audio is playing
    pub playing: Option<usize>,

    /// Transient notice shown under the input bar
    pub notice: Option<String>,

    backend: Option<BackendHandle>,
    recorder: Box<dyn Recorder>,
    speaker: Box<dyn Speaker>,
    clipboard: Option<Box<dyn ImageClipboard>>,

    pending_queries: HashSet<Uuid>,
    pending_transcriptions: HashSet<Uuid>,
    /// Latest speech request; older results are dropped on arrival
    pending_speech: Option<(Uuid, usize)>,

    /// Preview URLs of attachments dropped before sending
    released_images: Vec<String>,

    /// Transcript length and thinking flag at the last scroll
    scroll_marker: (usize, bool),
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    /// Create a new application state without backend or audio devices
    pub fn new() -> Self {
        Self {
            transcript: Transcript::new(),
            input_text: String::new(),
            pending_attachment: None,
            recording_state: RecordingState::Idle,
            playing: None,
            notice: None,
            backend: None,
            recorder: Box::new(NullRecorder),
            speaker: Box::new(NullSpeaker),
            clipboard: None,
            pending_queries: HashSet::new(),
            pending_transcriptions: HashSet::new(),
            pending_speech: None,
            released_images: Vec::new(),
            scroll_marker: (0, false),
        }
    }

    pub fn with_backend(mut self, backend: BackendHandle) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn with_recorder(mut self, recorder: Box<dyn Recorder>) -> Self {
        self.recorder = recorder;
        self
    }

    pub fn with_speaker(mut self, speaker: Box<dyn Speaker>) -> Self {
        self.speaker = speaker;
        self
    }

    pub fn with_clipboard(mut self, clipboard: Box<dyn ImageClipboard>) -> Self {
        self.clipboard = Some(clipboard);
        self
    }

    /// True while at least one query is unanswered
    pub fn is_thinking(&self) -> bool {
        !self.pending_queries.is_empty()
    }

    /// True while a recording is being transcribed
    pub fn is_transcribing(&self) -> bool {
        !self.pending_transcriptions.is_empty()
    }

    pub fn is_recording(&self) -> bool {
        self.recording_state == RecordingState::Recording
    }

    /// Whether anything is in motion that needs continuous repainting
    pub fn wants_repaint(&self) -> bool {
        self.is_thinking()
            || self.is_transcribing()
            || self.is_recording()
            || self.playing.is_some()
            || self.pending_speech.is_some()
    }

    fn send_command(&self, command: BackendCommand) -> Result<()> {
        match &self.backend {
            Some(backend) => backend.send(command),
            None => Err(SapError::ChannelError("Backend is not connected".into())),
        }
    }

    /// Send the typed text and pending image as one user message
    pub fn submit_text(&mut self) {
        if self.input_text.trim().is_empty() && self.pending_attachment.is_none() {
            return;
        }

        let text = std::mem::take(&mut self.input_text);
        let attachment = self.pending_attachment.take();

        let message = Message::user(text.clone())
            .with_image(attachment.as_ref().map(|a| a.preview_url.clone()));
        self.transcript.push(message);

        let request_id = Uuid::new_v4();
        self.pending_queries.insert(request_id);
        debug!("Submitting query {}", request_id);

        let command = BackendCommand::Query {
            text: (!text.trim().is_empty()).then_some(text),
            image_base64: attachment.map(|a| a.base64),
            request_id,
        };

        if let Err(error) = self.send_command(command) {
            self.apply_event(BackendEvent::QueryFailed { error, request_id });
        }
    }

    /// Stage an image file. Anything that is not an image is ignored.
    pub fn attach_image(&mut self, path: &Path) {
        self.stage_attachment(PendingAttachment::from_path(path));
    }

    /// Stage image bytes with an optional declared media type
    pub fn attach_image_bytes(&mut self, bytes: &[u8], media_type: Option<&str>) {
        self.stage_attachment(PendingAttachment::from_bytes(bytes, media_type));
    }

    /// Stage an image pasted from the clipboard
    pub fn paste_image(&mut self, image: ClipboardImage) {
        self.stage_attachment(PendingAttachment::from_rgba(
            image.width,
            image.height,
            image.rgba,
        ));
    }

    /// Stage whatever image the clipboard holds. No image is a no-op.
    pub fn paste_from_clipboard(&mut self) {
        let Some(clipboard) = self.clipboard.as_mut() else {
            debug!("No clipboard available");
            return;
        };

        match clipboard.image() {
            Ok(Some(image)) => self.paste_image(image),
            Ok(None) => debug!("Clipboard holds no image"),
            Err(e) => warn!("Failed to read clipboard: {}", e),
        }
    }

    fn stage_attachment(&mut self, attachment: Result<PendingAttachment>) {
        match attachment {
            Ok(attachment) => {
                debug!("Staged {} attachment", attachment.media_type);
                self.release_attachment();
                self.released_images.retain(|url| *url != attachment.preview_url);
                self.pending_attachment = Some(attachment);
            }
            Err(SapError::UnsupportedMedia(what)) => {
                debug!("Ignoring non-image attachment: {}", what);
            }
            Err(e) => {
                warn!("Failed to read attachment: {}", e);
            }
        }
    }

    /// Drop the staged image and its preview
    pub fn clear_attachment(&mut self) {
        self.release_attachment();
    }

    fn release_attachment(&mut self) {
        if let Some(attachment) = self.pending_attachment.take() {
            self.released_images.push(attachment.preview_url);
        }
    }

    /// Preview URLs that no longer appear anywhere, for texture eviction
    pub fn take_released_images(&mut self) -> Vec<String> {
        std::mem::take(&mut self.released_images)
    }

    /// Mic button: start when idle, stop when recording
    pub fn toggle_recording(&mut self) {
        match self.recording_state {
            RecordingState::Idle => self.start_recording(),
            RecordingState::Recording => self.stop_recording(),
        }
    }

    /// Start recording audio
    pub fn start_recording(&mut self) {
        if self.recording_state == RecordingState::Recording {
            return;
        }

        match self.recorder.start() {
            Ok(()) => {
                self.recording_state = RecordingState::Recording;
                info!("Recording started");
            }
            Err(e) => {
                warn!("Could not start recording: {}", e);
                self.notice = Some(e.user_message());
            }
        }
    }

    /// Stop recording and send the audio for transcription
    pub fn stop_recording(&mut self) {
        if self.recording_state != RecordingState::Recording {
            return;
        }
        self.recording_state = RecordingState::Idle;

        let wav = match self.recorder.stop().and_then(|recording| encode_wav(&recording)) {
            Ok(wav) => wav,
            Err(e) => {
                warn!("Could not finish recording: {}", e);
                self.notice = Some(e.user_message());
                return;
            }
        };

        let request_id = Uuid::new_v4();
        self.pending_transcriptions.insert(request_id);
        info!("Recording stopped, transcribing ({})", request_id);

        if let Err(error) = self.send_command(BackendCommand::Transcribe { wav, request_id }) {
            self.apply_event(BackendEvent::TranscriptionFailed { error, request_id });
        }
    }

    /// Speaker button on an assistant message
    pub fn replay_or_stop(&mut self, index: usize) {
        if self.playing == Some(index) {
            self.stop_playback();
            return;
        }

        let text = match self.transcript.get(index) {
            Some(message) if message.role == Role::Assistant => message.text.clone(),
            _ => {
                debug!("No assistant message at index {}", index);
                return;
            }
        };

        // One audio channel: silence whatever is playing before asking for more
        self.stop_playback();

        let request_id = Uuid::new_v4();
        self.pending_speech = Some((request_id, index));
        debug!("Requesting speech for message {} ({})", index, request_id);

        let command = BackendCommand::Synthesize {
            text,
            message_index: index,
            request_id,
        };
        if let Err(error) = self.send_command(command) {
            self.apply_event(BackendEvent::SynthesisFailed {
                error,
                message_index: index,
                request_id,
            });
        }
    }

    /// Stop audio playback
    pub fn stop_playback(&mut self) {
        self.speaker.stop();
        self.playing = None;
    }

    /// Clear the playing index once the speaker has run dry
    pub fn poll_playback(&mut self) {
        if self.playing.is_some() && !self.speaker.is_playing() {
            debug!("Playback of message {:?} finished", self.playing);
            self.playing = None;
        }
    }

    /// Process incoming events from the backend pipeline
    pub fn poll_events(&mut self) {
        let events: Vec<BackendEvent> = match &self.backend {
            Some(backend) => std::iter::from_fn(|| backend.try_recv()).collect(),
            None => Vec::new(),
        };

        for event in events {
            self.apply_event(event);
        }
    }

    /// Apply one completion signal to the state
    pub fn apply_event(&mut self, event: BackendEvent) {
        match event {
            BackendEvent::Answer { answer, request_id } => {
                if self.pending_queries.remove(&request_id) {
                    self.transcript.push(Message::assistant(answer));
                } else {
                    debug!("Dropping answer for unknown query {}", request_id);
                }
            }
            BackendEvent::QueryFailed { error, request_id } => {
                if self.pending_queries.remove(&request_id) {
                    warn!("Backend error: {}", error);
                    self.transcript.push(Message::assistant(BACKEND_ERROR_MESSAGE));
                }
            }
            BackendEvent::Transcript { text, request_id } => {
                if self.pending_transcriptions.remove(&request_id) {
                    self.input_text = text;
                }
            }
            BackendEvent::TranscriptionFailed { error, request_id } => {
                if self.pending_transcriptions.remove(&request_id) {
                    warn!("STT error: {}", error);
                    self.notice = Some(error.user_message());
                }
            }
            BackendEvent::Speech {
                audio,
                message_index,
                request_id,
            } => {
                if self.pending_speech != Some((request_id, message_index)) {
                    debug!("Dropping superseded speech for message {}", message_index);
                    return;
                }
                self.pending_speech = None;

                match self.speaker.play(audio) {
                    Ok(()) => self.playing = Some(message_index),
                    Err(e) => {
                        warn!("Error playing TTS: {}", e);
                        self.notice = Some(e.user_message());
                    }
                }
            }
            BackendEvent::SynthesisFailed {
                error,
                message_index,
                request_id,
            } => {
                if self.pending_speech == Some((request_id, message_index)) {
                    self.pending_speech = None;
                    warn!("Error playing TTS: {}", error);
                    self.notice = Some(error.user_message());
                }
            }
            BackendEvent::Shutdown => {
                info!("Backend pipeline shut down");
                self.backend = None;

                // Nothing will answer what is still outstanding
                for _ in self.pending_queries.drain() {
                    self.transcript.push(Message::assistant(BACKEND_ERROR_MESSAGE));
                }
                self.pending_transcriptions.clear();
                self.pending_speech = None;
            }
        }
    }

    /// True once after the transcript grew or the thinking flag flipped
    pub fn take_scroll_request(&mut self) -> bool {
        let marker = (self.transcript.len(), self.is_thinking());
        if marker == self.scroll_marker {
            return false;
        }
        self.scroll_marker = marker;
        true
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    /// Release devices and stop the backend worker
    pub fn shutdown(&mut self) {
        if self.is_recording() {
            let _ = self.recorder.stop();
            self.recording_state = RecordingState::Idle;
        }
        self.stop_playback();

        if let Some(backend) = self.backend.take() {
            let _ = backend.send(BackendCommand::Shutdown);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let state = AppState::new();
        assert!(state.transcript.is_empty());
        assert_eq!(state.recording_state, RecordingState::Idle);
        assert!(!state.is_thinking());
        assert!(!state.is_transcribing());
        assert!(state.playing.is_none());
        assert!(!state.wants_repaint());
    }

    #[test]
    fn test_submit_without_backend_reports_error() {
        let mut state = AppState::new();
        state.input_text = "Hello".to_string();
        state.submit_text();

        let texts: Vec<&str> = state.transcript.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["Hello", BACKEND_ERROR_MESSAGE]);
        assert!(!state.is_thinking());
    }

    #[test]
    fn test_scroll_request_fires_once_per_change() {
        let mut state = AppState::new();
        assert!(!state.take_scroll_request());

        state.input_text = "Hi".to_string();
        state.submit_text();
        assert!(state.take_scroll_request());
        assert!(!state.take_scroll_request());
    }

    #[test]
    fn test_mic_failure_keeps_idle() {
        let mut state = AppState::new();
        state.start_recording();
        assert_eq!(state.recording_state, RecordingState::Idle);
        assert!(state.notice.is_some());
    }
}
