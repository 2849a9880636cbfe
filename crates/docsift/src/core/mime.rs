//! MIME type detection.
//!
//! Classification is content-based: magic-byte signatures first (via `infer`),
//! then markup and plain-text heuristics for formats that carry no signature.
//! Extension lookup is kept for informational use only and never drives the
//! extraction path.

use crate::{DocsiftError, Result};
use encoding_rs::{Encoding, UTF_8};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::path::Path;

pub const HTML_MIME_TYPE: &str = "text/html";
pub const PDF_MIME_TYPE: &str = "application/pdf";
pub const PLAIN_TEXT_MIME_TYPE: &str = "text/plain";
pub const OCTET_STREAM_MIME_TYPE: &str = "application/octet-stream";
pub const UNKNOWN_MIME_TYPE: &str = "unknown";

/// Leading tags that identify a resource as HTML when no signature matched.
const HTML_SIGNATURES: &[&[u8]] = &[
    b"<!doctype html",
    b"<html",
    b"<head",
    b"<script",
    b"<iframe",
    b"<h1",
    b"<div",
    b"<font",
    b"<table",
    b"<a",
    b"<style",
    b"<title",
    b"<b",
    b"<body",
    b"<br",
    b"<p",
    b"<!--",
];

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Share of control bytes above which content is no longer treated as text.
const MAX_CONTROL_RATIO: f64 = 0.05;

static EXT_TO_MIME: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    let mut m = HashMap::new();

    m.insert("txt", PLAIN_TEXT_MIME_TYPE);
    m.insert("text", PLAIN_TEXT_MIME_TYPE);
    m.insert("pdf", PDF_MIME_TYPE);
    m.insert("html", HTML_MIME_TYPE);
    m.insert("htm", HTML_MIME_TYPE);
    m.insert("xhtml", HTML_MIME_TYPE);

    m
});

/// Detect the MIME type of raw document bytes.
///
/// # Errors
///
/// Returns `DocsiftError::Validation` for empty input, which has no content
/// to classify.
pub fn detect_mime_type_from_bytes(content: &[u8]) -> Result<String> {
    if content.is_empty() {
        return Err(DocsiftError::validation("Cannot classify empty content"));
    }

    if let Some(mime_type) = detect_utf16(content) {
        return Ok(mime_type.to_string());
    }

    if let Some(kind) = infer::get(content) {
        return Ok(kind.mime_type().to_string());
    }

    if looks_like_html(content) {
        return Ok(HTML_MIME_TYPE.to_string());
    }

    if looks_like_text(content) {
        return Ok(PLAIN_TEXT_MIME_TYPE.to_string());
    }

    Ok(OCTET_STREAM_MIME_TYPE.to_string())
}

/// Classify UTF-16 content announced by a byte order mark.
///
/// The NUL bytes of UTF-16 would otherwise read as binary.
fn detect_utf16(content: &[u8]) -> Option<&'static str> {
    let (encoding, bom_len) = Encoding::for_bom(content)?;
    if encoding == UTF_8 {
        return None;
    }

    let decoded = encoding.decode_without_bom_handling_and_without_replacement(&content[bom_len..])?;
    let decoded = decoded.as_bytes();
    if decoded.is_empty() || !looks_like_text(decoded) {
        return None;
    }

    Some(if looks_like_html(decoded) {
        HTML_MIME_TYPE
    } else {
        PLAIN_TEXT_MIME_TYPE
    })
}

fn looks_like_html(content: &[u8]) -> bool {
    let content = content.strip_prefix(UTF8_BOM).unwrap_or(content);
    let start = content
        .iter()
        .position(|b| !matches!(b, b' ' | b'\t' | b'\n' | b'\r' | b'\x0C'))
        .unwrap_or(content.len());
    let content = &content[start..];

    HTML_SIGNATURES.iter().any(|signature| {
        if content.len() < signature.len() || !content[..signature.len()].eq_ignore_ascii_case(signature) {
            return false;
        }
        // `<!--` needs no terminator; tag names must end here.
        if signature.ends_with(b"--") {
            return true;
        }
        matches!(
            content.get(signature.len()),
            None | Some(b' ' | b'>' | b'\t' | b'\n' | b'\r' | b'/')
        )
    })
}

fn looks_like_text(content: &[u8]) -> bool {
    if content.contains(&0) {
        return false;
    }

    let control = content
        .iter()
        .filter(|&&b| b < 0x20 && !matches!(b, b'\t' | b'\n' | b'\r' | b'\x0C' | b'\x1B'))
        .count();

    (control as f64) / (content.len() as f64) <= MAX_CONTROL_RATIO
}

/// Guess a MIME type from a file name.
///
/// Only used to report what a file claims to be; extraction ignores it.
///
/// # Errors
///
/// Returns `DocsiftError::UnsupportedFormat` if the extension is not known.
pub fn detect_mime_type(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();

    let extension = path.extension().and_then(|ext| ext.to_str()).map(|s| s.to_lowercase());

    if let Some(ext) = &extension
        && let Some(mime_type) = EXT_TO_MIME.get(ext.as_str())
    {
        return Ok(mime_type.to_string());
    }

    if let Some(mime) = mime_guess::from_path(path).first() {
        return Ok(mime.to_string());
    }

    Err(DocsiftError::UnsupportedFormat(format!(
        "Could not determine MIME type from file name: {}",
        path.display()
    )))
}
