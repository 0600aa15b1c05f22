//! Format detection over raw payload bytes.
//!
//! Pure functions, no I/O. Detection runs in three passes:
//! 1. signature table over the first bytes,
//! 2. envelope unwrapping when the payload opens as a JSON object
//!    (re-running the signature table on the inner bytes),
//! 3. content scan for embedded container markers.
//!
//! Anything that never matches is `Unknown`, a routing decision for the
//! conversion stage, not an error.

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use tracing::{debug, warn};

use crate::domain::DetectedFormat;

/// Envelope fields conventionally carrying base64 audio, in probe order.
const ENVELOPE_FIELDS: [&str; 3] = ["audio", "data", "audioData"];

/// Outcome of running the detector over a payload.
#[derive(Debug, Clone)]
pub struct Detection {
    /// Format of the effective bytes.
    pub format: DetectedFormat,

    /// The payload itself, or the unwrapped inner payload.
    pub bytes: Vec<u8>,

    /// True when an envelope was found and its inner payload extracted.
    pub unwrapped: bool,
}

/// Inspect a payload, unwrapping a structured-text envelope if present.
pub fn detect(payload: &[u8]) -> Detection {
    let mut format = sniff(payload);

    if format == DetectedFormat::Unknown && payload.first() == Some(&b'{') {
        if let Some(inner) = unwrap_envelope(payload) {
            debug!(inner_bytes = inner.len(), "unwrapped envelope payload");
            format = sniff(&inner);
            if format == DetectedFormat::Unknown {
                format = scan_markers(&inner);
            }
            return Detection {
                format,
                bytes: inner,
                unwrapped: true,
            };
        }
    }

    if format == DetectedFormat::Unknown {
        format = scan_markers(payload);
    }

    Detection {
        format,
        bytes: payload.to_vec(),
        unwrapped: false,
    }
}

/// Match the first four bytes against the signature table.
pub fn sniff(bytes: &[u8]) -> DetectedFormat {
    if bytes.len() < 4 {
        return DetectedFormat::Unknown;
    }

    let signature = hex::encode(&bytes[..4]);

    if signature.starts_with("1a45") {
        DetectedFormat::Webm
    } else if signature.starts_with("4949") || signature.starts_with("4d4d") {
        DetectedFormat::Wav
    } else if signature.starts_with("494433") || signature.starts_with("fffb") {
        DetectedFormat::Mp3
    } else if signature.starts_with("4f676753") {
        DetectedFormat::Ogg
    } else {
        DetectedFormat::Unknown
    }
}

/// Render the leading bytes as a fixed-width hex signature (for logs
/// and the probe command).
pub fn signature_hex(bytes: &[u8]) -> String {
    hex::encode(&bytes[..bytes.len().min(4)])
}

/// Scan for container markers embedded past the header.
fn scan_markers(bytes: &[u8]) -> DetectedFormat {
    if contains(bytes, b"ftyp") {
        DetectedFormat::Mp4
    } else if contains(bytes, b"OggS") {
        DetectedFormat::Ogg
    } else {
        DetectedFormat::Unknown
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

/// Try to extract base64 audio from a JSON envelope.
///
/// Full parse first, probing the conventional field names; when the
/// payload is not valid JSON (truncated uploads are common), fall back
/// to a best-effort scan for a `"data":"…"` substring. Returns `None`
/// when nothing decodable was found, in which case the caller keeps the
/// original bytes.
fn unwrap_envelope(payload: &[u8]) -> Option<Vec<u8>> {
    let text = String::from_utf8_lossy(payload);

    match serde_json::from_str::<serde_json::Value>(&text) {
        Ok(value) => {
            for field in ENVELOPE_FIELDS {
                if let Some(encoded) = value.get(field).and_then(|v| v.as_str()) {
                    debug!(field, "envelope field found");
                    match BASE64_STANDARD.decode(encoded) {
                        Ok(inner) => return Some(inner),
                        Err(e) => {
                            warn!(field, error = %e, "envelope field is not valid base64");
                        }
                    }
                }
            }
            None
        }
        Err(e) => {
            warn!(error = %e, "payload opens as JSON but does not parse; scanning for base64 data");
            let encoded = extract_data_substring(&text)?;
            BASE64_STANDARD.decode(encoded).ok()
        }
    }
}

/// Pull the value out of a `"data":"…"` fragment without a full parse.
fn extract_data_substring(text: &str) -> Option<&str> {
    let marker = "\"data\":\"";
    let start = text.find(marker)? + marker.len();
    let rest = &text[start..];
    let end = rest.find('"')?;
    let value = &rest[..end];
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}
