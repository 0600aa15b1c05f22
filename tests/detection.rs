//! Format Detection Properties
//!
//! Library-level checks for the detector's contract: envelope
//! unwrapping is equivalent to submitting the decoded bytes directly,
//! and garbage never errors.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use escriba::core::detect::detect;
use escriba::DetectedFormat;

fn padded(head: &[u8], len: usize) -> Vec<u8> {
    let mut bytes = head.to_vec();
    bytes.resize(len, 0u8);
    bytes
}

#[test]
fn test_envelope_unwraps_to_same_format_as_direct_submission() {
    let formats: Vec<(&[u8], DetectedFormat)> = vec![
        (&[0x1a, 0x45, 0xdf, 0xa3], DetectedFormat::Webm),
        (b"ID3\x04", DetectedFormat::Mp3),
        (b"OggS", DetectedFormat::Ogg),
        (b"II\x2a\x00", DetectedFormat::Wav),
    ];

    for (head, expected) in formats {
        let inner = padded(head, 4096);
        let envelope = format!("{{\"audio\":\"{}\"}}", STANDARD.encode(&inner));

        let direct = detect(&inner);
        let wrapped = detect(envelope.as_bytes());

        assert_eq!(direct.format, expected);
        assert_eq!(wrapped.format, direct.format);
        assert_eq!(wrapped.bytes, direct.bytes);
    }
}

#[test]
fn test_every_signature_format_is_native() {
    for head in [
        &[0x1a, 0x45, 0xdf, 0xa3][..],
        b"ID3\x04",
        &[0xff, 0xfb, 0x90, 0x00],
        b"OggS",
        b"II\x2a\x00",
        b"MM\x00\x2a",
    ] {
        let detection = detect(&padded(head, 2048));
        assert!(
            detection.format.is_native(),
            "{:?} should route to the fast path",
            head
        );
    }
}

#[test]
fn test_garbage_of_any_shape_never_panics() {
    // No signature, not JSON
    assert_eq!(detect(&vec![0xcdu8; 1500]).format, DetectedFormat::Unknown);

    // Opens like JSON but is not
    let mut pseudo_json = b"{not really json at all".to_vec();
    pseudo_json.resize(1500, b'x');
    assert_eq!(detect(&pseudo_json).format, DetectedFormat::Unknown);

    // Valid JSON without any audio field
    let bare = br#"{"kind":"ping","value":42}"#;
    let detection = detect(bare);
    assert_eq!(detection.format, DetectedFormat::Unknown);
    assert_eq!(detection.bytes, bare.to_vec());

    // Empty payload
    assert_eq!(detect(&[]).format, DetectedFormat::Unknown);
}

#[test]
fn test_embedded_markers_route_container_formats() {
    let mut mp4 = vec![0u8; 4096];
    mp4[4..8].copy_from_slice(b"ftyp");
    assert_eq!(detect(&mp4).format, DetectedFormat::Mp4);
    assert!(detect(&mp4).format.is_native());
}
