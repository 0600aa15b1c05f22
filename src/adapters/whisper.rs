//! Whisper-compatible transcription client.
//!
//! Uploads one staged artifact per call as a multipart form with a
//! language hint, response-format selector, temperature, and prompt.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use tracing::debug;

use super::{SpeechToText, SttError, SttRequest};

/// Whisper-compatible HTTP client
pub struct WhisperClient {
    /// HTTP client (carries the request timeout)
    client: reqwest::Client,

    /// API base, e.g. "https://api.openai.com/v1"
    api_base: String,

    /// Bearer token
    api_key: String,

    /// Model identifier, e.g. "whisper-1"
    model: String,
}

impl WhisperClient {
    /// Create a new client.
    ///
    /// Fails only if the underlying HTTP client cannot be constructed.
    pub fn new(
        api_base: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        request_timeout: Duration,
    ) -> Result<Self, SttError> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()?;

        Ok(Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/audio/transcriptions", self.api_base)
    }
}

#[async_trait]
impl SpeechToText for WhisperClient {
    fn name(&self) -> &str {
        "whisper"
    }

    async fn transcribe(&self, request: SttRequest) -> Result<String, SttError> {
        let file_part = Part::bytes(request.audio)
            .file_name(request.file_name.clone())
            .mime_str(&request.mime_type)?;

        let form = Form::new()
            .part("file", file_part)
            .text("model", self.model.clone())
            .text("language", request.language)
            .text("response_format", "text".to_string())
            .text("temperature", request.temperature.to_string())
            .text("prompt", request.prompt);

        debug!(
            file = %request.file_name,
            temperature = request.temperature,
            "sending transcription request"
        );

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SttError::Status {
                status: status.as_u16(),
                body: body.trim().to_string(),
            });
        }

        // response_format=text returns the transcription as plain text
        let text = response.text().await?;
        Ok(text.trim().to_string())
    }
}
