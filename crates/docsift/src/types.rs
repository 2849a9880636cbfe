use base64::Engine;
use indexmap::IndexMap;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::Result;
use crate::core::mime::{HTML_MIME_TYPE, PDF_MIME_TYPE, PLAIN_TEXT_MIME_TYPE, UNKNOWN_MIME_TYPE};

/// Ordered `field -> value` mapping read from a PDF info dump.
pub type PdfMetadata = IndexMap<String, String>;

/// A document as handed to the pipeline.
///
/// The filename is advisory only; classification always looks at `contents`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawDocument {
    pub filename: Option<String>,
    pub contents: Vec<u8>,
}

impl RawDocument {
    pub fn new(contents: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: None,
            contents: contents.into(),
        }
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    /// Decode the boundary record, whose contents travel as base64.
    ///
    /// # Errors
    ///
    /// Returns `DocsiftError::Validation` if `contents` is not valid base64.
    pub fn from_encoded(encoded: &EncodedDocument) -> Result<Self> {
        let contents = base64::engine::general_purpose::STANDARD.decode(encoded.contents.trim())?;
        Ok(Self {
            filename: encoded.filename.clone(),
            contents,
        })
    }
}

/// Wire form of [`RawDocument`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EncodedDocument {
    #[serde(default)]
    pub filename: Option<String>,
    pub contents: String,
}

impl EncodedDocument {
    pub fn encode(document: &RawDocument) -> Self {
        Self {
            filename: document.filename.clone(),
            contents: base64::engine::general_purpose::STANDARD.encode(&document.contents),
        }
    }
}

/// Classification driving the extraction path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MimeType {
    #[serde(rename = "text/plain")]
    PlainText,
    #[serde(rename = "text/html")]
    Html,
    #[serde(rename = "application/pdf")]
    Pdf,
    #[serde(rename = "unknown")]
    Unknown,
}

impl MimeType {
    /// Map a sniffed MIME string onto a supported path; anything else is `Unknown`.
    pub fn from_detected(mime_type: &str) -> Self {
        match mime_type {
            PLAIN_TEXT_MIME_TYPE => MimeType::PlainText,
            HTML_MIME_TYPE => MimeType::Html,
            PDF_MIME_TYPE => MimeType::Pdf,
            _ => MimeType::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MimeType::PlainText => PLAIN_TEXT_MIME_TYPE,
            MimeType::Html => HTML_MIME_TYPE,
            MimeType::Pdf => PDF_MIME_TYPE,
            MimeType::Unknown => UNKNOWN_MIME_TYPE,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, MimeType::Unknown)
    }
}

impl std::fmt::Display for MimeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The normalized artifact produced for one document.
///
/// Serialization follows the downstream contract: the unknown-type sentinel
/// carries exactly `mimetype`, `text`, `file_metadata` and `language`; every
/// other artifact also carries `forced_decoding` (currently always `null`).
/// `extraction_error` is only written when set.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExtractedDocument {
    pub text: String,
    pub mimetype: MimeType,
    #[serde(default)]
    pub file_metadata: PdfMetadata,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub forced_decoding: Option<String>,
    /// Why the extraction path produced an empty result, when it failed
    /// rather than finding genuinely empty content.
    #[serde(default)]
    pub extraction_error: Option<String>,
}

impl ExtractedDocument {
    /// Sentinel returned for content that cannot be classified.
    pub fn unknown() -> Self {
        Self {
            text: String::new(),
            mimetype: MimeType::Unknown,
            file_metadata: PdfMetadata::new(),
            language: String::new(),
            forced_decoding: None,
            extraction_error: None,
        }
    }
}

impl Serialize for ExtractedDocument {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut len = 4;
        if !self.mimetype.is_unknown() {
            len += 1;
        }
        if self.extraction_error.is_some() {
            len += 1;
        }

        let mut map = serializer.serialize_map(Some(len))?;
        map.serialize_entry("text", &self.text)?;
        map.serialize_entry("mimetype", &self.mimetype)?;
        map.serialize_entry("file_metadata", &self.file_metadata)?;
        map.serialize_entry("language", &self.language)?;
        if !self.mimetype.is_unknown() {
            map.serialize_entry("forced_decoding", &self.forced_decoding)?;
        }
        if let Some(error) = &self.extraction_error {
            map.serialize_entry("extraction_error", error)?;
        }
        map.end()
    }
}
