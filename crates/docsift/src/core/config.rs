//! Configuration loading and management.
//!
//! This module provides utilities for loading extraction configuration from
//! TOML, YAML or JSON files and for discovering a `docsift.toml` in the
//! directory hierarchy. Every field has a default, so an empty file is a
//! valid configuration.

use crate::{DocsiftError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main extraction configuration.
///
/// # Example
///
/// ```rust
/// use docsift::core::config::ExtractionConfig;
///
/// let config = ExtractionConfig::default();
/// assert!(config.markup.remove_subtree_tags.contains(&"script".to_string()));
///
/// // let config = ExtractionConfig::from_toml_file("docsift.toml")?;
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Tag rewriting tables for the markup converter
    #[serde(default)]
    pub markup: MarkupConfig,

    /// External PDF conversion tools
    #[serde(default)]
    pub pdf: PdfConfig,

    /// Language detection options
    #[serde(default)]
    pub language_detection: LanguageDetectionConfig,

    /// Maximum concurrent extractions in batch operations (None = num_cpus * 2).
    #[serde(default)]
    pub max_concurrent_extractions: Option<usize>,
}

/// Markup conversion tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkupConfig {
    /// Tags rendered as a line break; closing forms are listed explicitly (`/div`)
    #[serde(default = "default_breakline_tags")]
    pub breakline_tags: Vec<String>,

    /// Breakline tags rendered as a blank line, by bare name
    #[serde(default = "default_double_breakline_tags")]
    pub double_breakline_tags: Vec<String>,

    /// Tags deleted together with their whole subtree
    #[serde(default = "default_remove_subtree_tags")]
    pub remove_subtree_tags: Vec<String>,
}

/// External PDF tool configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PdfConfig {
    /// Program converting PDF to HTML (reads the document on stdin)
    #[serde(default = "default_markup_program")]
    pub markup_program: String,

    /// Arguments placed before the output base path
    #[serde(default = "default_markup_args")]
    pub markup_args: Vec<String>,

    /// Program dumping PDF info as `Key: value` lines
    #[serde(default = "default_metadata_program")]
    pub metadata_program: String,

    #[serde(default = "default_metadata_args")]
    pub metadata_args: Vec<String>,

    /// Per-process timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Language detection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanguageDetectionConfig {
    /// Enable language detection
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Minimum confidence threshold (0.0-1.0)
    #[serde(default)]
    pub min_confidence: f64,

    /// Restrict detection to these ISO 639-1 codes (None = all supported)
    #[serde(default)]
    pub allowed_languages: Option<Vec<String>>,

    /// Candidates for a second pass when the unrestricted guess is unreliable
    #[serde(default = "default_fallback_languages")]
    pub fallback_languages: Vec<String>,
}

fn default_true() -> bool {
    true
}
fn default_fallback_languages() -> Vec<String> {
    ["en", "es", "pt", "fr", "de", "it", "nl", "ru", "zh", "ja", "ar", "hi"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}
fn default_breakline_tags() -> Vec<String> {
    [
        "table", "/table", "tr", "div", "/div", "h1", "/h1", "h2", "/h2", "h3", "/h3", "h4", "/h4", "h5", "/h5", "h6",
        "/h6", "br", "br/",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}
fn default_double_breakline_tags() -> Vec<String> {
    ["table", "h1", "h2", "h3", "h4", "h5", "h6"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}
fn default_remove_subtree_tags() -> Vec<String> {
    vec!["script".to_string(), "style".to_string()]
}
fn default_markup_program() -> String {
    std::env::var("DOCSIFT_PDFTOHTML_PATH")
        .ok()
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| "pdftohtml".to_string())
}
fn default_markup_args() -> Vec<String> {
    vec!["-q".to_string(), "-i".to_string(), "-".to_string()]
}
fn default_metadata_program() -> String {
    std::env::var("DOCSIFT_PDFINFO_PATH")
        .ok()
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| "pdfinfo".to_string())
}
fn default_metadata_args() -> Vec<String> {
    vec!["-".to_string()]
}
fn default_timeout_secs() -> u64 {
    120
}

impl Default for MarkupConfig {
    fn default() -> Self {
        Self {
            breakline_tags: default_breakline_tags(),
            double_breakline_tags: default_double_breakline_tags(),
            remove_subtree_tags: default_remove_subtree_tags(),
        }
    }
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            markup_program: default_markup_program(),
            markup_args: default_markup_args(),
            metadata_program: default_metadata_program(),
            metadata_args: default_metadata_args(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for LanguageDetectionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_confidence: 0.0,
            allowed_languages: None,
            fallback_languages: default_fallback_languages(),
        }
    }
}

impl ExtractionConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns `DocsiftError::Validation` if the file can't be read or is invalid TOML.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = read_config(path.as_ref())?;
        toml::from_str(&content)
            .map_err(|e| {
                DocsiftError::validation_with_source(format!("Invalid TOML in {}: {}", path.as_ref().display(), e), e)
            })
    }

    /// Load configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = read_config(path.as_ref())?;
        serde_yaml_ng::from_str(&content)
            .map_err(|e| {
                DocsiftError::validation_with_source(format!("Invalid YAML in {}: {}", path.as_ref().display(), e), e)
            })
    }

    /// Load configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = read_config(path.as_ref())?;
        serde_json::from_str(&content)
            .map_err(|e| {
                DocsiftError::validation_with_source(format!("Invalid JSON in {}: {}", path.as_ref().display(), e), e)
            })
    }

    /// Load configuration, picking the format from the file extension.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let extension = path.extension().and_then(|ext| ext.to_str()).map(|s| s.to_lowercase());

        match extension.as_deref() {
            Some("toml") => Self::from_toml_file(path),
            Some("yaml") | Some("yml") => Self::from_yaml_file(path),
            Some("json") => Self::from_json_file(path),
            _ => Err(DocsiftError::validation(format!(
                "Unsupported config file format: {} (expected .toml, .yaml, .yml or .json)",
                path.display()
            ))),
        }
    }

    /// Discover configuration file in parent directories.
    ///
    /// Searches for `docsift.toml` in current directory and parent directories.
    pub fn discover() -> Result<Option<Self>> {
        let mut current = std::env::current_dir().map_err(DocsiftError::Io)?;

        loop {
            let docsift_toml = current.join("docsift.toml");
            if docsift_toml.exists() {
                return Ok(Some(Self::from_toml_file(docsift_toml)?));
            }

            if let Some(parent) = current.parent() {
                current = parent.to_path_buf();
            } else {
                break;
            }
        }

        Ok(None)
    }
}

fn read_config(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .map_err(|e| {
            DocsiftError::validation_with_source(format!("Failed to read config file {}: {}", path.display(), e), e)
        })
}
