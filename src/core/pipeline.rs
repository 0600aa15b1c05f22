//! Pipeline orchestration for one transcription invocation.
//!
//! Coordinates detection, staging, the conversion fallback chain,
//! last-resort fabrication, and the transcription call with its single
//! degeneracy-triggered retry. Scratch cleanup runs at one funnel point
//! after the stage sequence, on success and on failure alike.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::adapters::{FfmpegTranscoder, SpeechToText, SttError, SttRequest, WhisperClient};
use crate::config::ResolvedConfig;
use crate::domain::{
    AudioArtifact, PipelineError, TranscriptionResult, MIN_PAYLOAD_BYTES,
};

use super::convert;
use super::detect::{self, Detection};
use super::fabricate;
use super::scratch::ScratchSpace;

/// Transcriptions shorter than this are implausible for a spoken
/// command and trigger the one-shot retry (unless the artifact was
/// already degraded). Tunable.
pub const MIN_PLAUSIBLE_TRANSCRIPT_CHARS: usize = 10;

/// Prompt for the first service call: the expected utterance shape.
pub const PRIMARY_PROMPT: &str =
    "Este é um comando de agendamento em português brasileiro. Pode conter nomes e datas.";

/// Alternate prompt for the degeneracy retry.
pub const RETRY_PROMPT: &str =
    "Este é um comando para agendar uma reunião. Pode incluir nome da pessoa, data e hora.";

/// Widened decode temperature for the degeneracy retry.
pub const RETRY_TEMPERATURE: f32 = 0.3;

/// Near-deterministic decode for clean artifacts; a slightly higher
/// temperature hedges against a poor source signal on degraded ones.
pub fn initial_temperature(degraded: bool) -> f32 {
    if degraded {
        0.2
    } else {
        0.0
    }
}

/// Degeneracy check: short result on a non-degraded artifact.
pub fn needs_retry(text: &str, degraded: bool) -> bool {
    text.chars().count() < MIN_PLAUSIBLE_TRANSCRIPT_CHARS && !degraded
}

/// Main transcription pipeline
pub struct TranscriptionPipeline {
    /// Directory for per-run scratch artifacts
    scratch_dir: PathBuf,

    /// Target language hint
    language: String,

    /// External transcoder driver
    transcoder: FfmpegTranscoder,

    /// Speech-to-text backend
    transcriber: Arc<dyn SpeechToText>,
}

impl TranscriptionPipeline {
    /// Create a pipeline backed by the Whisper client.
    ///
    /// Fails when the service credentials are missing.
    pub fn new(config: &ResolvedConfig) -> Result<Self, PipelineError> {
        let api_key = config.api_key.clone().ok_or_else(|| {
            SttError::Credentials("OPENAI_API_KEY is not set".to_string())
        })?;

        let client = WhisperClient::new(
            &config.api_base,
            api_key,
            &config.model,
            config.limits.request_timeout(),
        )?;

        Ok(Self::with_transcriber(config, Arc::new(client)))
    }

    /// Create a pipeline with an explicit speech-to-text backend.
    pub fn with_transcriber(
        config: &ResolvedConfig,
        transcriber: Arc<dyn SpeechToText>,
    ) -> Self {
        Self {
            scratch_dir: config.scratch_dir.clone(),
            language: config.language.clone(),
            transcoder: FfmpegTranscoder::new(
                config.ffmpeg_path.clone(),
                config.limits.tool_timeout(),
            ),
            transcriber,
        }
    }

    /// Transcribe one payload.
    ///
    /// Never panics on malformed input: anything that cannot be
    /// converted is fabricated into *some* valid artifact, and only an
    /// undersized payload or an outright service failure aborts the run.
    #[instrument(skip_all, fields(payload_bytes = payload.len()))]
    pub async fn transcribe(&self, payload: &[u8]) -> Result<TranscriptionResult, PipelineError> {
        // Hard precondition, checked before any filesystem write.
        if payload.len() < MIN_PAYLOAD_BYTES {
            return Err(PipelineError::undersized(payload.len()));
        }

        let detection = detect::detect(payload);
        info!(
            format = %detection.format,
            unwrapped = detection.unwrapped,
            effective_bytes = detection.bytes.len(),
            "payload inspected"
        );

        let mut scratch = ScratchSpace::create(&self.scratch_dir).await?;

        // Single funnel point: every exit of the stage sequence passes
        // through cleanup before the result is surfaced.
        let result = self.run_stages(&mut scratch, &detection).await;
        scratch.cleanup().await;
        result
    }

    /// Stage sequence: stage raw bytes, normalize, invoke transcription.
    async fn run_stages(
        &self,
        scratch: &mut ScratchSpace,
        detection: &Detection,
    ) -> Result<TranscriptionResult, PipelineError> {
        let raw_path = scratch
            .write("raw", detection.format.extension(), &detection.bytes)
            .await?;

        let artifact = self.normalize(scratch, &raw_path, detection).await?;
        let audio = tokio::fs::read(&artifact.path).await?;

        self.invoke(&artifact, audio).await
    }

    /// Fast path for natively accepted containers; otherwise the
    /// conversion fallback chain, with fabrication absorbing exhaustion.
    async fn normalize(
        &self,
        scratch: &mut ScratchSpace,
        raw_path: &Path,
        detection: &Detection,
    ) -> Result<AudioArtifact, PipelineError> {
        if detection.format.is_native() {
            info!(format = %detection.format, "native container, skipping conversion");
            return Ok(AudioArtifact {
                path: raw_path.to_path_buf(),
                format: detection.format,
                degraded: false,
            });
        }

        match convert::convert_with_fallbacks(&self.transcoder, scratch, raw_path, detection.format)
            .await
        {
            Ok(conversion) => Ok(conversion.artifact),
            Err(exhausted) => {
                warn!(
                    attempts = exhausted.attempts.len(),
                    "conversion exhausted, fabricating artifact"
                );
                fabricate::fabricate(&self.transcoder, scratch, &detection.bytes).await
            }
        }
    }

    /// First service call plus the single degeneracy-triggered retry.
    async fn invoke(
        &self,
        artifact: &AudioArtifact,
        audio: Vec<u8>,
    ) -> Result<TranscriptionResult, PipelineError> {
        let first = self
            .transcriber
            .transcribe(self.request(
                artifact,
                audio.clone(),
                initial_temperature(artifact.degraded),
                PRIMARY_PROMPT,
            ))
            .await?;

        info!(chars = first.chars().count(), "transcription completed");

        if needs_retry(&first, artifact.degraded) {
            warn!(
                chars = first.chars().count(),
                "transcription implausibly short, retrying with widened parameters"
            );

            let second = self
                .transcriber
                .transcribe(self.request(artifact, audio, RETRY_TEMPERATURE, RETRY_PROMPT))
                .await?;

            // Keep the retry only when it is strictly longer.
            let text = if second.chars().count() > first.chars().count() {
                info!("retry produced a fuller transcription");
                second
            } else {
                first
            };

            return Ok(TranscriptionResult {
                text,
                attempts_made: 2,
                used_degraded_audio: artifact.degraded,
            });
        }

        Ok(TranscriptionResult {
            text: first,
            attempts_made: 1,
            used_degraded_audio: artifact.degraded,
        })
    }

    fn request(
        &self,
        artifact: &AudioArtifact,
        audio: Vec<u8>,
        temperature: f32,
        prompt: &str,
    ) -> SttRequest {
        SttRequest {
            audio,
            file_name: artifact.file_name(),
            mime_type: artifact.format.mime_type().to_string(),
            language: self.language.clone(),
            temperature,
            prompt: prompt.to_string(),
        }
    }
}
