//! Failure taxonomy for a pipeline invocation.
//!
//! Only two conditions are fatal to a run: an undersized payload and an
//! outright transcription-service failure. Everything in between is
//! absorbed by a later stage (failed conversions fall through to
//! fabrication, fabrication always yields *something*), and cleanup
//! failures are logged but never escalated.

use thiserror::Error;

use crate::adapters::SttError;

/// Minimum accepted payload size. Anything smaller is rejected before a
/// single byte hits durable storage.
pub const MIN_PAYLOAD_BYTES: usize = 1000;

/// Errors surfaced to the caller of the pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Payload absent or below the minimum size; no stages ran.
    #[error("audio payload too small or invalid ({size} bytes, minimum {})", MIN_PAYLOAD_BYTES)]
    InvalidInput { size: usize },

    /// The remote transcription call failed (network/auth/quota).
    #[error("transcription service failure: {0}")]
    TranscriptionService(#[from] SttError),

    /// Scratch-space staging failed (cleanup still runs).
    #[error("scratch space I/O failure: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    /// Reject payloads below [`MIN_PAYLOAD_BYTES`].
    pub fn undersized(size: usize) -> Self {
        Self::InvalidInput { size }
    }
}
