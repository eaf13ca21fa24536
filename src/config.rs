//! Client configuration
//!
//! Endpoint base, session identifier and audio switches for the chat client.

use crate::{Result, SapError};
use std::time::Duration;

/// Backend base address used when nothing else is configured
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";

/// Session identifier sent with every query
pub const DEFAULT_SESSION_ID: &str = "sap-session-1";

/// Configuration for the chat client
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Base URL of the backend, without trailing slash
    pub backend_url: String,

    /// Session identifier attached to every query request
    pub session_id: String,

    /// Optional per-request timeout. `None` waits forever.
    pub request_timeout: Option<Duration>,

    /// Whether to enable microphone capture
    pub enable_audio_input: bool,

    /// Whether to enable speech playback
    pub enable_audio_output: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            session_id: DEFAULT_SESSION_ID.to_string(),
            request_timeout: None,
            enable_audio_input: true,
            enable_audio_output: true,
        }
    }
}

impl ClientConfig {
    /// Build a configuration from defaults, overridden by `SAP_BACKEND_URL`
    /// and `SAP_SESSION_ID` when they are set
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var("SAP_BACKEND_URL") {
            config = config.with_backend_url(url);
        }
        if let Ok(session_id) = std::env::var("SAP_SESSION_ID") {
            config = config.with_session_id(session_id);
        }
        config
    }

    /// Set the backend base URL
    pub fn with_backend_url(mut self, url: impl Into<String>) -> Self {
        self.backend_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the session identifier
    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = session_id.into();
        self
    }

    /// Abort requests that take longer than `timeout`
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Disable microphone capture (text and image only)
    pub fn without_audio_input(mut self) -> Self {
        self.enable_audio_input = false;
        self
    }

    /// Disable speech playback
    pub fn without_audio_output(mut self) -> Self {
        self.enable_audio_output = false;
        self
    }

    /// Full URL of an endpoint path such as `/query`
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.backend_url, path.trim_start_matches('/'))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if !(self.backend_url.starts_with("http://") || self.backend_url.starts_with("https://")) {
            return Err(SapError::ConfigError(format!(
                "Backend URL must start with http:// or https://: {}",
                self.backend_url
            )));
        }

        if self.session_id.trim().is_empty() {
            return Err(SapError::ConfigError("Session id must not be empty".to_string()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.backend_url, "http://localhost:8000");
        assert_eq!(config.session_id, "sap-session-1");
        assert!(config.request_timeout.is_none());
        assert!(config.enable_audio_input);
        assert!(config.enable_audio_output);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_endpoint_joins_paths() {
        let config = ClientConfig::default().with_backend_url("http://10.0.0.2:9000/");
        assert_eq!(config.endpoint("/query"), "http://10.0.0.2:9000/query");
        assert_eq!(config.endpoint("tts"), "http://10.0.0.2:9000/tts");
    }

    #[test]
    fn test_config_builder() {
        let config = ClientConfig::default()
            .with_session_id("field-trip")
            .with_request_timeout(Duration::from_secs(30))
            .without_audio_input()
            .without_audio_output();

        assert_eq!(config.session_id, "field-trip");
        assert_eq!(config.request_timeout, Some(Duration::from_secs(30)));
        assert!(!config.enable_audio_input);
        assert!(!config.enable_audio_output);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = ClientConfig::default().with_backend_url("localhost:8000");
        assert!(matches!(config.validate(), Err(SapError::ConfigError(_))));

        let config = ClientConfig::default().with_session_id("  ");
        assert!(config.validate().is_err());
    }
}
