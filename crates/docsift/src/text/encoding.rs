//! Byte-to-text decoding with a fallback chain that always terminates.
//!
//! 1. Sniff an encoding with `chardetng` and decode strictly with it.
//! 2. Decode as UTF-8.
//! 3. Decode as ISO-8859-1, which accepts every byte sequence.

use chardetng::EncodingDetector;
use encoding_rs::Encoding;

/// Inputs shorter than this carry too little signal to sniff.
const MIN_SNIFF_LEN: usize = 2;

/// Decode raw bytes into text. Never fails.
///
/// # Example
///
/// ```rust
/// use docsift::text::encoding::decode_text_bytes;
///
/// assert_eq!(decode_text_bytes("Olá".as_bytes()), "Olá");
/// assert!(decode_text_bytes(b"Ol\xE1").starts_with("Ol"));
/// ```
pub fn decode_text_bytes(bytes: &[u8]) -> String {
    if bytes.is_empty() {
        return String::new();
    }

    if let Some(encoding) = sniff_encoding(bytes) {
        if let Some(text) = decode_strict(encoding, bytes) {
            return text;
        }
        tracing::debug!(
            "Sniffed encoding {} could not decode the input, falling back to UTF-8",
            encoding.name()
        );
    }

    if let Some(text) = decode_utf8(bytes) {
        return text;
    }

    decode_latin1(bytes)
}

fn sniff_encoding(bytes: &[u8]) -> Option<&'static Encoding> {
    if bytes.len() < MIN_SNIFF_LEN {
        return None;
    }

    if let Some((encoding, _)) = Encoding::for_bom(bytes) {
        return Some(encoding);
    }

    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    Some(detector.guess(None, true))
}

fn decode_strict(encoding: &'static Encoding, bytes: &[u8]) -> Option<String> {
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        return None;
    }
    Some(text.into_owned())
}

#[cfg(feature = "simd-utf8")]
fn decode_utf8(bytes: &[u8]) -> Option<String> {
    simdutf8::basic::from_utf8(bytes).ok().map(str::to_owned)
}

#[cfg(not(feature = "simd-utf8"))]
fn decode_utf8(bytes: &[u8]) -> Option<String> {
    std::str::from_utf8(bytes).ok().map(str::to_owned)
}

fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}
