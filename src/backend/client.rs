//! HTTP client for the assistant backend
//!
//! Wraps the three endpoints: `/query`, `/stt` and `/tts`.

use crate::config::ClientConfig;
use crate::{Result, SapError};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Body of `POST /query`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub text: Option<String>,
    pub image_base64: Option<String>,
    pub session_id: String,
}

/// Item the backend retrieved while answering
#[derive(Debug, Clone, Deserialize)]
pub struct RetrievedItem {
    pub id: String,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub text: String,
}

/// Response of `POST /query`. Only `answer` is required.
#[derive(Debug, Clone, Deserialize)]
pub struct QueryResponse {
    pub answer: String,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub retrieved: Vec<RetrievedItem>,
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    text: &'a str,
}

/// Client for the assistant backend
#[derive(Clone)]
pub struct BackendClient {
    client: Client,
    config: ClientConfig,
}

impl BackendClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;

        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| SapError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    /// Ask the assistant. `text` and `image_base64` may each be absent.
    pub async fn query(
        &self,
        text: Option<String>,
        image_base64: Option<String>,
    ) -> Result<QueryResponse> {
        let request = QueryRequest {
            text,
            image_base64,
            session_id: self.config.session_id.clone(),
        };

        let response = self
            .client
            .post(self.config.endpoint("/query"))
            .json(&request)
            .send()
            .await?;

        let response: QueryResponse = check_status(response, "query")?
            .json()
            .await
            .map_err(|e| SapError::InvalidResponse(format!("query: {}", e)))?;

        debug!(
            "Query answered (mode: {:?}, caption: {}, {} retrieved items)",
            response.mode,
            response.caption.is_some(),
            response.retrieved.len()
        );
        Ok(response)
    }

    /// Upload a WAV recording and return its transcript
    pub async fn transcribe(&self, wav: Vec<u8>) -> Result<String> {
        let part = Part::bytes(wav)
            .file_name("audio.wav")
            .mime_str("audio/wav")
            .map_err(|e| SapError::Transport(format!("Invalid multipart part: {}", e)))?;
        let form = Form::new().part("file", part);

        let response = self
            .client
            .post(self.config.endpoint("/stt"))
            .multipart(form)
            .send()
            .await?;

        let response: TranscriptionResponse = check_status(response, "stt")?
            .json()
            .await
            .map_err(|e| SapError::InvalidResponse(format!("stt: {}", e)))?;

        Ok(response.text)
    }

    /// Synthesize speech for `text`. Returns the encoded audio as sent by the backend.
    pub async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .post(self.config.endpoint("/tts"))
            .json(&SpeechRequest { text })
            .send()
            .await?;

        let audio = check_status(response, "tts")?.bytes().await?;
        if audio.is_empty() {
            return Err(SapError::InvalidResponse("tts: empty audio body".to_string()));
        }

        Ok(audio.to_vec())
    }
}

fn check_status(response: Response, endpoint: &str) -> Result<Response> {
    if !response.status().is_success() {
        return Err(SapError::Transport(format!(
            "{} request failed with status: {}",
            endpoint,
            response.status()
        )));
    }
    Ok(response)
}
