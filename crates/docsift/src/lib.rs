//! Docsift - Document to Plain Text Normalization
//!
//! Docsift turns uploaded documents (plain text, HTML, PDF) into clean plain
//! text with file metadata and the detected language, ready for downstream
//! text analysis.
//!
//! # Quick Start
//!
//! ```rust
//! use docsift::{ExtractionConfig, RawDocument, extract_document_sync};
//!
//! let document = RawDocument::new("This is a test file.\nI'm testing the extractor worker!");
//! let extracted = extract_document_sync(&document, &ExtractionConfig::default());
//! assert_eq!(extracted.mimetype.as_str(), "text/plain");
//! ```
//!
//! # Architecture
//!
//! - **Core Module** (`core`): Extraction orchestration, MIME detection, config loading
//! - **Extraction** (`extraction`): Markup conversion and the external PDF tools
//! - **Text** (`text`): Encoding resolution, entity decoding, whitespace cleaning
//! - **Language Detection** (`language_detection`): ISO 639-1 language of the final text
//!
//! The pipeline never fails for input-data reasons. Unsupported content
//! yields the [`ExtractedDocument::unknown`] sentinel, and a failed
//! conversion yields empty text with `extraction_error` set.

#![deny(unsafe_code)]

pub mod core;
pub mod error;
pub mod extraction;
pub mod language_detection;
pub mod text;
pub mod types;

pub use error::{DocsiftError, Result};
pub use types::*;

pub use core::extractor::{
    batch_extract_documents, batch_extract_documents_with_runner, extract_document, extract_document_sync,
    extract_document_with_runner,
};

pub use core::config::{ExtractionConfig, LanguageDetectionConfig, MarkupConfig, PdfConfig};

pub use core::mime::{
    HTML_MIME_TYPE, OCTET_STREAM_MIME_TYPE, PDF_MIME_TYPE, PLAIN_TEXT_MIME_TYPE, UNKNOWN_MIME_TYPE, detect_mime_type,
    detect_mime_type_from_bytes,
};

pub use extraction::process::{CommandOutput, CommandRunner, SystemCommandRunner};
