use super::Speaker;
use crate::{Result, SapError};
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};
use std::io::Cursor;
use tracing::{debug, info};

/// Speech playback on the default output device
///
/// Holds a single `Sink`. Playing new audio drops the previous sink, which
/// silences it, so only one stream is ever audible.
pub struct SinkSpeaker {
    output: Option<(OutputStream, OutputStreamHandle)>,
    sink: Option<Sink>,
}

impl SinkSpeaker {
    pub fn new() -> Self {
        Self {
            output: None,
            sink: None,
        }
    }

    /// Open the output device on first use
    fn handle(&mut self) -> Result<&OutputStreamHandle> {
        if self.output.is_none() {
            let (stream, handle) = OutputStream::try_default().map_err(|e| {
                SapError::AudioDeviceError(format!("Failed to open output device: {}", e))
            })?;
            info!("Opened audio output device");
            self.output = Some((stream, handle));
        }

        match &self.output {
            Some((_, handle)) => Ok(handle),
            None => Err(SapError::AudioDeviceError("No output device available".into())),
        }
    }
}

impl Default for SinkSpeaker {
    fn default() -> Self {
        Self::new()
    }
}

impl Speaker for SinkSpeaker {
    fn play(&mut self, audio: Vec<u8>) -> Result<()> {
        self.stop();

        let bytes = audio.len();
        let source = Decoder::new(Cursor::new(audio)).map_err(|e| {
            SapError::AudioProcessingError(format!("Failed to decode speech audio: {}", e))
        })?;

        let sink = Sink::try_new(self.handle()?)
            .map_err(|e| SapError::AudioDeviceError(format!("Failed to create sink: {}", e)))?;
        sink.append(source);
        sink.play();

        debug!("Playing {} bytes of speech audio", bytes);
        self.sink = Some(sink);
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
            debug!("Stopped speech playback");
        }
    }

    fn is_playing(&self) -> bool {
        self.sink
            .as_ref()
            .is_some_and(|sink| !sink.is_paused() && !sink.empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_speaker_is_not_playing() {
        let mut speaker = SinkSpeaker::new();
        assert!(!speaker.is_playing());
        speaker.stop();
        assert!(!speaker.is_playing());
    }

    #[test]
    fn test_garbage_audio_is_rejected() {
        // Decoding fails before any device is touched
        let mut speaker = SinkSpeaker::new();
        assert!(speaker.play(b"not audio at all".to_vec()).is_err());
        assert!(!speaker.is_playing());
    }
}
