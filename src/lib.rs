pub mod attachment;
pub mod audio;
pub mod backend;
pub mod config;
pub mod messages;
pub mod ui;

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum SapError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Unsupported media type: {0}")]
    UnsupportedMedia(String),

    #[error("Audio device error: {0}")]
    AudioDeviceError(String),

    #[error("Audio processing error: {0}")]
    AudioProcessingError(String),

    #[error("Channel error: {0}")]
    ChannelError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IOError(String),
}

impl From<std::io::Error> for SapError {
    fn from(e: std::io::Error) -> Self {
        SapError::IOError(e.to_string())
    }
}

impl From<reqwest::Error> for SapError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            SapError::InvalidResponse(e.to_string())
        } else {
            SapError::Transport(e.to_string())
        }
    }
}

impl SapError {
    /// Check if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            // Network hiccups and bad payloads only affect one call
            SapError::Transport(_) => true,
            SapError::InvalidResponse(_) => true,
            SapError::UnsupportedMedia(_) => true,
            // Hardware/device errors may require user intervention
            SapError::AudioDeviceError(_) => false,
            SapError::AudioProcessingError(_) => true,
            SapError::ChannelError(_) => false,
            SapError::ConfigError(_) => false,
            SapError::IOError(_) => false,
        }
    }

    /// Get a user-friendly description
    pub fn user_message(&self) -> String {
        match self {
            SapError::Transport(_) => "Could not reach the assistant backend.".to_string(),
            SapError::InvalidResponse(_) => {
                "The assistant backend sent an unexpected response.".to_string()
            }
            SapError::UnsupportedMedia(_) => "Only image files can be attached.".to_string(),
            SapError::AudioDeviceError(_) => {
                "Audio device error. Please check your microphone/speakers.".to_string()
            }
            SapError::AudioProcessingError(_) => {
                "Audio processing failed. Please try again.".to_string()
            }
            SapError::ChannelError(_) => {
                "Internal communication error. Please restart the application.".to_string()
            }
            SapError::ConfigError(_) => "Configuration error. Please check settings.".to_string(),
            SapError::IOError(_) => "File system error occurred.".to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SapError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_conversion() {
        let err: SapError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(err, SapError::IOError(_)));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_call_failures_are_recoverable() {
        assert!(SapError::Transport("refused".into()).is_recoverable());
        assert!(SapError::InvalidResponse("no answer".into()).is_recoverable());
        assert!(!SapError::AudioDeviceError("no mic".into()).is_recoverable());
    }
}
