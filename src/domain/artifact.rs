//! Audio artifacts produced by the normalization stages and the final
//! transcription result handed back to callers.

use std::path::PathBuf;

use super::format::DetectedFormat;

/// An audio file staged on disk, ready for the transcription service.
#[derive(Debug, Clone)]
pub struct AudioArtifact {
    /// Location of the file inside the run's scratch space.
    pub path: PathBuf,

    /// Container family of the staged file.
    pub format: DetectedFormat,

    /// True when no real conversion succeeded and a synthetic or
    /// placeholder container had to be substituted, or the converted
    /// output fell below the low-confidence size threshold.
    pub degraded: bool,
}

impl AudioArtifact {
    /// File name component, for upload forms and logs.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| format!("audio.{}", self.format.extension()))
    }
}

/// Outcome of a completed pipeline invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptionResult {
    /// Best transcription obtained.
    pub text: String,

    /// Service calls made (1, or 2 when the degeneracy retry fired).
    pub attempts_made: u32,

    /// True when the transcribed artifact was synthetic or low-confidence.
    pub used_degraded_audio: bool,
}
