//! Transcoding fallback chain.
//!
//! The conversion policy is a data-driven ordered plan: for each codec
//! target, every input-format hypothesis is tried in priority order, one
//! ffmpeg invocation per attempt. The first output meeting the minimum
//! viable size wins; a failed hypothesis is recorded and the next one is
//! tried. Exhausting the whole plan is not fatal: the fabricator takes
//! over.

use std::path::Path;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::adapters::FfmpegTranscoder;
use crate::domain::{AudioArtifact, DetectedFormat};

use super::scratch::ScratchSpace;

/// Outputs below this size are presumed corrupt and rejected.
/// Tunable; mirrors the minimum accepted payload size.
pub const MIN_VIABLE_OUTPUT_BYTES: u64 = 1000;

/// Outputs below this size are accepted but flagged low-confidence:
/// rejecting them outright would discard recoverable audio. Tunable.
pub const LOW_CONFIDENCE_OUTPUT_BYTES: u64 = 10_000;

/// Input-format hypotheses, tried in this order for each target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputHypothesis {
    /// Headerless 16-bit little-endian PCM at speech rate
    RawPcm,

    /// Trust the sniffed container format
    Detected(DetectedFormat),

    /// Generic container demuxer
    GenericContainer,

    /// Let ffmpeg probe the input itself
    AutoDetect,
}

impl InputHypothesis {
    /// ffmpeg input-side flags for this hypothesis.
    pub fn input_args(&self) -> Vec<&'static str> {
        match self {
            Self::RawPcm => vec!["-f", "s16le", "-ar", "16000", "-ac", "1"],
            Self::Detected(format) => match format.demuxer() {
                Some(demuxer) => vec!["-f", demuxer],
                None => vec![],
            },
            Self::GenericContainer => vec!["-f", "matroska"],
            Self::AutoDetect => vec![],
        }
    }

    pub fn label(&self) -> String {
        match self {
            Self::RawPcm => "raw-pcm".to_string(),
            Self::Detected(format) => format!("detected-{}", format),
            Self::GenericContainer => "generic-container".to_string(),
            Self::AutoDetect => "auto-detect".to_string(),
        }
    }
}

/// Output codec targets, tried compressed-first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecTarget {
    /// MP3, 128 kbps, 44.1 kHz mono
    Compressed,

    /// WAV, 16-bit PCM, 16 kHz mono (speech-recognition friendly)
    LosslessPcm,
}

impl CodecTarget {
    /// ffmpeg output-side flags for this target.
    pub fn output_args(&self) -> Vec<&'static str> {
        match self {
            Self::Compressed => vec!["-acodec", "libmp3lame", "-ab", "128k", "-ar", "44100", "-ac", "1"],
            Self::LosslessPcm => vec!["-acodec", "pcm_s16le", "-ar", "16000", "-ac", "1"],
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Compressed => "mp3",
            Self::LosslessPcm => "wav",
        }
    }

    pub fn format(&self) -> DetectedFormat {
        match self {
            Self::Compressed => DetectedFormat::Mp3,
            Self::LosslessPcm => DetectedFormat::Wav,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Compressed => "compressed",
            Self::LosslessPcm => "lossless-pcm",
        }
    }
}

/// How one conversion attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// Tool succeeded and the output met the minimum viable size
    Converted,

    /// Tool succeeded but the output was below the minimum viable size
    OutputTooSmall,

    /// Tool invocation failed (spawn, exit code, or timeout)
    ToolFailed,
}

/// Ordered record of one entry in the fallback chain.
#[derive(Debug, Clone)]
pub struct ConversionAttempt {
    pub hypothesis: InputHypothesis,
    pub target: CodecTarget,
    pub outcome: AttemptOutcome,
    pub output_size: u64,
}

/// A successful conversion plus the attempt trail that led to it.
#[derive(Debug)]
pub struct Conversion {
    pub artifact: AudioArtifact,
    pub attempts: Vec<ConversionAttempt>,
}

/// Every hypothesis failed for both codec targets.
#[derive(Debug, Error)]
#[error("all conversion hypotheses failed for both codec targets ({} attempts)", .attempts.len())]
pub struct ConversionExhausted {
    pub attempts: Vec<ConversionAttempt>,
}

/// Build the ordered strategy plan for a sniffed format.
///
/// The detected-format hypothesis is skipped when the sniffer returned
/// `Unknown`; there is nothing to trust.
pub fn conversion_plan(detected: DetectedFormat) -> Vec<(InputHypothesis, CodecTarget)> {
    let mut hypotheses = vec![InputHypothesis::RawPcm];
    if detected != DetectedFormat::Unknown {
        hypotheses.push(InputHypothesis::Detected(detected));
    }
    hypotheses.push(InputHypothesis::GenericContainer);
    hypotheses.push(InputHypothesis::AutoDetect);

    let mut plan = Vec::new();
    for target in [CodecTarget::Compressed, CodecTarget::LosslessPcm] {
        for hypothesis in &hypotheses {
            plan.push((*hypothesis, target));
        }
    }
    plan
}

/// Drive the fallback chain until an attempt produces a viable artifact.
pub async fn convert_with_fallbacks(
    transcoder: &FfmpegTranscoder,
    scratch: &mut ScratchSpace,
    input: &Path,
    detected: DetectedFormat,
) -> Result<Conversion, ConversionExhausted> {
    let mut attempts = Vec::new();

    for (index, (hypothesis, target)) in conversion_plan(detected).into_iter().enumerate() {
        // one distinct output path per attempt
        let output = scratch.reserve(
            &format!("{}_{}", target.label(), index),
            target.extension(),
        );

        debug!(
            hypothesis = %hypothesis.label(),
            target = target.label(),
            "trying conversion"
        );

        let result = transcoder
            .convert(input, &output, &hypothesis.input_args(), &target.output_args())
            .await;

        if let Err(e) = result {
            warn!(
                hypothesis = %hypothesis.label(),
                target = target.label(),
                error = %e,
                "conversion attempt failed"
            );
            attempts.push(ConversionAttempt {
                hypothesis,
                target,
                outcome: AttemptOutcome::ToolFailed,
                output_size: 0,
            });
            continue;
        }

        let output_size = match tokio::fs::metadata(&output).await {
            Ok(meta) => meta.len(),
            Err(_) => 0,
        };

        if output_size < MIN_VIABLE_OUTPUT_BYTES {
            warn!(
                hypothesis = %hypothesis.label(),
                target = target.label(),
                output_size,
                "converted output too small, presumed corrupt"
            );
            attempts.push(ConversionAttempt {
                hypothesis,
                target,
                outcome: AttemptOutcome::OutputTooSmall,
                output_size,
            });
            continue;
        }

        let degraded = output_size < LOW_CONFIDENCE_OUTPUT_BYTES;
        if degraded {
            warn!(output_size, "converted output small, flagging low confidence");
        }

        attempts.push(ConversionAttempt {
            hypothesis,
            target,
            outcome: AttemptOutcome::Converted,
            output_size,
        });

        info!(
            hypothesis = %hypothesis.label(),
            target = target.label(),
            output_size,
            attempts = attempts.len(),
            "conversion accepted"
        );

        return Ok(Conversion {
            artifact: AudioArtifact {
                path: output,
                format: target.format(),
                degraded,
            },
            attempts,
        });
    }

    Err(ConversionExhausted { attempts })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_orders_compressed_before_lossless() {
        let plan = conversion_plan(DetectedFormat::Webm);

        assert_eq!(plan.len(), 8);
        assert!(plan[..4].iter().all(|(_, t)| *t == CodecTarget::Compressed));
        assert!(plan[4..].iter().all(|(_, t)| *t == CodecTarget::LosslessPcm));
    }

    #[test]
    fn test_plan_hypothesis_priority() {
        let plan = conversion_plan(DetectedFormat::Ogg);
        let hypotheses: Vec<_> = plan[..4].iter().map(|(h, _)| *h).collect();

        assert_eq!(
            hypotheses,
            vec![
                InputHypothesis::RawPcm,
                InputHypothesis::Detected(DetectedFormat::Ogg),
                InputHypothesis::GenericContainer,
                InputHypothesis::AutoDetect,
            ]
        );
    }

    #[test]
    fn test_plan_skips_detected_hypothesis_for_unknown() {
        let plan = conversion_plan(DetectedFormat::Unknown);

        assert_eq!(plan.len(), 6);
        assert!(plan
            .iter()
            .all(|(h, _)| !matches!(h, InputHypothesis::Detected(_))));
    }

    #[test]
    fn test_raw_pcm_args_pin_rate_and_channels() {
        let args = InputHypothesis::RawPcm.input_args();
        assert_eq!(args, vec!["-f", "s16le", "-ar", "16000", "-ac", "1"]);
    }

    #[test]
    fn test_auto_detect_passes_no_input_flags() {
        assert!(InputHypothesis::AutoDetect.input_args().is_empty());
    }

    #[tokio::test]
    async fn test_exhaustion_records_every_attempt() {
        use std::time::Duration;
        use tempfile::TempDir;

        let temp = TempDir::new().unwrap();
        let mut scratch = super::super::scratch::ScratchSpace::create(temp.path())
            .await
            .unwrap();
        let input = scratch.write("raw", "bin", &[0xabu8; 2048]).await.unwrap();

        let transcoder =
            FfmpegTranscoder::new("/nonexistent/ffmpeg-missing", Duration::from_secs(5));

        let err = convert_with_fallbacks(
            &transcoder,
            &mut scratch,
            &input,
            DetectedFormat::Unknown,
        )
        .await
        .unwrap_err();

        assert_eq!(err.attempts.len(), 6);
        assert!(err
            .attempts
            .iter()
            .all(|a| a.outcome == AttemptOutcome::ToolFailed));

        // failed attempts stay registered for cleanup (raw + 6 reserved)
        assert_eq!(scratch.tracked().len(), 7);
        scratch.cleanup().await;
    }
}
