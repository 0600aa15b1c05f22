//! Adapter interfaces for external systems.
//!
//! Adapters provide a unified interface for the two unreliable
//! collaborators the pipeline drives: the ffmpeg transcoding binary and
//! the remote speech-to-text service.

pub mod ffmpeg;
pub mod whisper;

use async_trait::async_trait;
use thiserror::Error;

// Re-export the concrete adapters
pub use ffmpeg::FfmpegTranscoder;
pub use whisper::WhisperClient;

/// One transcription request against the remote service.
#[derive(Debug, Clone)]
pub struct SttRequest {
    /// Raw bytes of the staged audio artifact.
    pub audio: Vec<u8>,

    /// File name for the upload form (the service infers the container
    /// from the extension).
    pub file_name: String,

    /// MIME type of the artifact.
    pub mime_type: String,

    /// Target language hint (ISO 639-1).
    pub language: String,

    /// Decode temperature. Near-zero is close to deterministic.
    pub temperature: f32,

    /// Free-text prompt describing the expected utterance shape.
    pub prompt: String,
}

/// Errors from the remote speech-to-text service.
#[derive(Debug, Error)]
pub enum SttError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("service credentials missing: {0}")]
    Credentials(String),
}

/// Trait for speech-to-text backends.
///
/// The pipeline only depends on this seam, so tests substitute a fake
/// and alternative services can be wired in without touching the
/// orchestration.
#[async_trait]
pub trait SpeechToText: Send + Sync {
    /// Human-readable backend name
    fn name(&self) -> &str;

    /// Transcribe one staged artifact, returning plain text.
    async fn transcribe(&self, request: SttRequest) -> Result<String, SttError>;
}
