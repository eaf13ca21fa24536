//! Audio capture and playback
//!
//! The session controller only talks to the [`Recorder`] and [`Speaker`]
//! traits. Real devices live behind the `audio-io` feature.

#[cfg(feature = "audio-io")]
pub mod input;
#[cfg(feature = "audio-io")]
pub mod output;
pub mod wav;

#[cfg(feature = "audio-io")]
pub use input::MicRecorder;
#[cfg(feature = "audio-io")]
pub use output::SinkSpeaker;
pub use wav::encode_wav;

use crate::config::ClientConfig;
use crate::{Result, SapError};
use tracing::info;

/// Finished capture: mono-or-interleaved f32 samples in -1.0..=1.0
#[derive(Debug, Clone, PartialEq)]
pub struct Recording {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: u16,
}

impl Recording {
    pub fn new(samples: Vec<f32>, sample_rate: u32, channels: u16) -> Self {
        Self {
            samples,
            sample_rate,
            channels,
        }
    }

    pub fn duration_seconds(&self) -> f32 {
        if self.sample_rate == 0 || self.channels == 0 {
            return 0.0;
        }
        self.samples.len() as f32 / (self.sample_rate as f32 * self.channels as f32)
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// One microphone capture session at a time
pub trait Recorder {
    /// Begin capturing. Calling while already capturing is a no-op.
    fn start(&mut self) -> Result<()>;

    /// Stop capturing and hand back everything captured since `start`
    fn stop(&mut self) -> Result<Recording>;

    fn is_recording(&self) -> bool;
}

/// Single audio output channel
pub trait Speaker {
    /// Play encoded audio (WAV, MP3, ...), replacing whatever was playing
    fn play(&mut self, audio: Vec<u8>) -> Result<()>;

    /// Stop playback immediately
    fn stop(&mut self);

    /// True while audio is still being rendered
    fn is_playing(&self) -> bool;
}

/// Recorder used when capture is disabled or unavailable
#[derive(Debug, Default)]
pub struct NullRecorder;

impl Recorder for NullRecorder {
    fn start(&mut self) -> Result<()> {
        Err(SapError::AudioDeviceError("Audio input is disabled".into()))
    }

    fn stop(&mut self) -> Result<Recording> {
        Err(SapError::AudioDeviceError("Audio input is disabled".into()))
    }

    fn is_recording(&self) -> bool {
        false
    }
}

/// Speaker used when playback is disabled or unavailable
#[derive(Debug, Default)]
pub struct NullSpeaker;

impl Speaker for NullSpeaker {
    fn play(&mut self, _audio: Vec<u8>) -> Result<()> {
        Err(SapError::AudioDeviceError("Audio output is disabled".into()))
    }

    fn stop(&mut self) {}

    fn is_playing(&self) -> bool {
        false
    }
}

/// Pick the recorder for this build and configuration
pub fn default_recorder(config: &ClientConfig) -> Box<dyn Recorder> {
    if !config.enable_audio_input {
        info!("Audio input disabled by configuration");
        return Box::new(NullRecorder);
    }

    #[cfg(feature = "audio-io")]
    {
        Box::new(MicRecorder::new())
    }

    #[cfg(not(feature = "audio-io"))]
    {
        tracing::warn!("Built without audio-io, voice input unavailable");
        Box::new(NullRecorder)
    }
}

/// Pick the speaker for this build and configuration
pub fn default_speaker(config: &ClientConfig) -> Box<dyn Speaker> {
    if !config.enable_audio_output {
        info!("Audio output disabled by configuration");
        return Box::new(NullSpeaker);
    }

    #[cfg(feature = "audio-io")]
    {
        Box::new(SinkSpeaker::new())
    }

    #[cfg(not(feature = "audio-io"))]
    {
        tracing::warn!("Built without audio-io, speech playback unavailable");
        Box::new(NullSpeaker)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_duration() {
        let recording = Recording::new(vec![0.0; 32000], 16000, 2);
        assert!((recording.duration_seconds() - 1.0).abs() < f32::EPSILON);
        assert_eq!(Recording::new(Vec::new(), 0, 1).duration_seconds(), 0.0);
    }

    #[test]
    fn test_disabled_devices() {
        let config = ClientConfig::default().without_audio_input().without_audio_output();

        let mut recorder = default_recorder(&config);
        assert!(recorder.start().is_err());
        assert!(!recorder.is_recording());

        let mut speaker = default_speaker(&config);
        assert!(speaker.play(vec![1, 2, 3]).is_err());
        assert!(!speaker.is_playing());
    }
}
