//! Last-resort artifact fabrication.
//!
//! When every transcoding hypothesis fails, the raw bytes are wrapped in
//! a minimal RIFF/WAVE header (valid for true PCM samples, acoustically
//! meaningless otherwise, acceptable as a strict last resort). If even
//! that is implausible, a short silent clip is synthesized via ffmpeg,
//! and if the tool itself is unavailable a pre-validated MP3 byte
//! sequence embedded in the binary is written verbatim. The stage never
//! fails outward short of the scratch directory itself being unwritable:
//! downstream transcription must always receive a syntactically valid
//! file.

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use tracing::{info, warn};

use crate::adapters::FfmpegTranscoder;
use crate::domain::{AudioArtifact, DetectedFormat, PipelineError};

use super::convert::MIN_VIABLE_OUTPUT_BYTES;
use super::scratch::ScratchSpace;

/// Sample rate declared in fabricated WAV headers (speech-friendly).
pub const FABRICATED_SAMPLE_RATE: u32 = 16_000;

/// Duration of the synthesized silent clip.
pub const SILENT_CLIP_SECONDS: u32 = 1;

/// Pre-validated minimal MP3 (a fraction of a second of silence),
/// written verbatim when even ffmpeg's synthetic source is unavailable.
const PLACEHOLDER_MP3_BASE64: &str = "SUQzBAAAAAAAI1RTU0UAAAAPAAADTGF2ZjU4Ljc2LjEwMAAAAAAAAAAAAAAA//tAwAAAAAAAAAAAAAAAAAAAAAAAWGluZwAAAA8AAAACAAADxAC2tra2tra2tra2tra2tra2tra2tra2tra2tra2tra2tra2tra2tra2AAAAA//tAxAAAAsUJvdQQAAtCZG+3hCAAkIIggCCMAYBgCAIBAMWH8f/+EP8fniB+H8fzB8HwQx+H54PiOH+dgEYfniCD4gGD5/B8HxAMHznBiBAP5/lAhwf4PnED//nx/UCAIfnznHBDPEB/OHEH/pTEFNRTMuMTAwVVVVVVVVVVVVVVVVVVVVVVVVVVVVVVVVVVVVVVVVVVVVVVVVVVVVVVVVVVVVVVVVVVVVVVVVVVVVVVVQ=";

/// Build a minimal 44-byte RIFF/WAVE header for mono 16-bit PCM with the
/// declared data length equal to the raw byte count.
pub fn wav_header(data_len: u32) -> [u8; 44] {
    let byte_rate = FABRICATED_SAMPLE_RATE * 2; // mono, 2 bytes per sample
    let mut header = [0u8; 44];

    header[0..4].copy_from_slice(b"RIFF");
    header[4..8].copy_from_slice(&(36 + data_len).to_le_bytes());
    header[8..12].copy_from_slice(b"WAVE");
    header[12..16].copy_from_slice(b"fmt ");
    header[16..20].copy_from_slice(&16u32.to_le_bytes()); // fmt chunk size
    header[20..22].copy_from_slice(&1u16.to_le_bytes()); // PCM
    header[22..24].copy_from_slice(&1u16.to_le_bytes()); // mono
    header[24..28].copy_from_slice(&FABRICATED_SAMPLE_RATE.to_le_bytes());
    header[28..32].copy_from_slice(&byte_rate.to_le_bytes());
    header[32..34].copy_from_slice(&2u16.to_le_bytes()); // block align
    header[34..36].copy_from_slice(&16u16.to_le_bytes()); // bits per sample
    header[36..40].copy_from_slice(b"data");
    header[40..44].copy_from_slice(&data_len.to_le_bytes());

    header
}

/// Wrap raw bytes in a WAV container.
pub fn wrap_pcm(bytes: &[u8]) -> Vec<u8> {
    let mut wrapped = Vec::with_capacity(44 + bytes.len());
    wrapped.extend_from_slice(&wav_header(bytes.len() as u32));
    wrapped.extend_from_slice(bytes);
    wrapped
}

/// Produce *some* playable artifact from bytes nothing could convert.
///
/// Always `degraded = true`.
pub async fn fabricate(
    transcoder: &FfmpegTranscoder,
    scratch: &mut ScratchSpace,
    bytes: &[u8],
) -> Result<AudioArtifact, PipelineError> {
    // Step 1: treat the bytes as raw PCM and wrap them directly.
    let wrapped = wrap_pcm(bytes);
    if wrapped.len() as u64 >= MIN_VIABLE_OUTPUT_BYTES {
        let path = scratch.write("fallback", "wav", &wrapped).await?;
        info!(bytes = wrapped.len(), "fabricated WAV container from raw bytes");
        return Ok(AudioArtifact {
            path,
            format: DetectedFormat::Wav,
            degraded: true,
        });
    }

    warn!(
        bytes = wrapped.len(),
        "wrapped WAV implausibly small, synthesizing silent clip"
    );

    // Step 2: short silent clip via ffmpeg's synthetic source.
    let silent = scratch.reserve("silent", "mp3");
    match transcoder
        .synthesize_silence(&silent, SILENT_CLIP_SECONDS)
        .await
    {
        Ok(()) => {
            info!("synthesized silent placeholder clip");
            Ok(AudioArtifact {
                path: silent,
                format: DetectedFormat::Mp3,
                degraded: true,
            })
        }
        Err(e) => {
            warn!(error = %e, "silent clip synthesis failed, writing embedded placeholder");

            let placeholder = BASE64_STANDARD
                .decode(PLACEHOLDER_MP3_BASE64)
                .unwrap_or_default();
            let path = scratch.write("placeholder", "mp3", &placeholder).await?;

            Ok(AudioArtifact {
                path,
                format: DetectedFormat::Mp3,
                degraded: true,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_wav_header_layout() {
        let header = wav_header(2048);

        assert_eq!(&header[0..4], b"RIFF");
        assert_eq!(u32::from_le_bytes(header[4..8].try_into().unwrap()), 36 + 2048);
        assert_eq!(&header[8..12], b"WAVE");
        assert_eq!(&header[12..16], b"fmt ");
        assert_eq!(u16::from_le_bytes(header[20..22].try_into().unwrap()), 1);
        assert_eq!(u16::from_le_bytes(header[22..24].try_into().unwrap()), 1);
        assert_eq!(
            u32::from_le_bytes(header[24..28].try_into().unwrap()),
            FABRICATED_SAMPLE_RATE
        );
        assert_eq!(
            u32::from_le_bytes(header[28..32].try_into().unwrap()),
            FABRICATED_SAMPLE_RATE * 2
        );
        assert_eq!(u16::from_le_bytes(header[34..36].try_into().unwrap()), 16);
        assert_eq!(&header[36..40], b"data");
        assert_eq!(u32::from_le_bytes(header[40..44].try_into().unwrap()), 2048);
    }

    #[test]
    fn test_wrap_pcm_declares_data_length() {
        let wrapped = wrap_pcm(&[0x11u8; 1500]);
        assert_eq!(wrapped.len(), 44 + 1500);
        assert_eq!(
            u32::from_le_bytes(wrapped[40..44].try_into().unwrap()),
            1500
        );
    }

    #[test]
    fn test_placeholder_decodes_to_mp3() {
        let bytes = BASE64_STANDARD.decode(PLACEHOLDER_MP3_BASE64).unwrap();
        assert!(bytes.starts_with(b"ID3"));
    }

    #[tokio::test]
    async fn test_fabricate_wraps_viable_payload() {
        let temp = TempDir::new().unwrap();
        let mut scratch = ScratchSpace::create(temp.path()).await.unwrap();
        let transcoder =
            FfmpegTranscoder::new("/nonexistent/ffmpeg-missing", Duration::from_secs(5));

        let artifact = fabricate(&transcoder, &mut scratch, &[0xabu8; 2048])
            .await
            .unwrap();

        assert!(artifact.degraded);
        assert_eq!(artifact.format, DetectedFormat::Wav);
        let written = tokio::fs::read(&artifact.path).await.unwrap();
        assert_eq!(written.len(), 44 + 2048);

        scratch.cleanup().await;
    }

    #[tokio::test]
    async fn test_fabricate_falls_back_to_embedded_placeholder() {
        let temp = TempDir::new().unwrap();
        let mut scratch = ScratchSpace::create(temp.path()).await.unwrap();
        let transcoder =
            FfmpegTranscoder::new("/nonexistent/ffmpeg-missing", Duration::from_secs(5));

        // Too small to wrap, and the tool is unreachable: embedded bytes win.
        let artifact = fabricate(&transcoder, &mut scratch, &[0x01u8; 16])
            .await
            .unwrap();

        assert!(artifact.degraded);
        assert_eq!(artifact.format, DetectedFormat::Mp3);
        let written = tokio::fs::read(&artifact.path).await.unwrap();
        assert!(written.starts_with(b"ID3"));

        scratch.cleanup().await;
    }
}
