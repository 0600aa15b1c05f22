//! Container/codec families recognized by the signature sniffer.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Audio container family derived from the payload's leading bytes.
///
/// `Unknown` is a legal outcome: it routes the payload into the
/// conversion fallback chain rather than failing the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectedFormat {
    Webm,
    Wav,
    Mp3,
    Ogg,
    Mp4,
    Unknown,
}

impl DetectedFormat {
    /// File extension used when staging the payload on disk.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Webm => "webm",
            Self::Wav => "wav",
            Self::Mp3 => "mp3",
            Self::Ogg => "ogg",
            Self::Mp4 => "mp4",
            Self::Unknown => "bin",
        }
    }

    /// MIME type sent alongside the artifact on upload.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Webm => "audio/webm",
            Self::Wav => "audio/wav",
            Self::Mp3 => "audio/mpeg",
            Self::Ogg => "audio/ogg",
            Self::Mp4 => "audio/mp4",
            Self::Unknown => "application/octet-stream",
        }
    }

    /// Whether the transcription service accepts this container as-is.
    ///
    /// Native formats take the fast path: no conversion attempts at all.
    pub fn is_native(&self) -> bool {
        !matches!(self, Self::Unknown)
    }

    /// ffmpeg demuxer name for the detected-format input hypothesis.
    ///
    /// `None` for `Unknown`; the hypothesis is skipped from the plan.
    pub fn demuxer(&self) -> Option<&'static str> {
        match self {
            Self::Webm => Some("matroska"),
            Self::Wav => Some("wav"),
            Self::Mp3 => Some("mp3"),
            Self::Ogg => Some("ogg"),
            Self::Mp4 => Some("mp4"),
            Self::Unknown => None,
        }
    }
}

impl fmt::Display for DetectedFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Webm => "webm",
            Self::Wav => "wav",
            Self::Mp3 => "mp3",
            Self::Ogg => "ogg",
            Self::Mp4 => "mp4",
            Self::Unknown => "unknown",
        };
        write!(f, "{}", name)
    }
}
