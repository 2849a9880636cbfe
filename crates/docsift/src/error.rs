//! Error types for docsift.
//!
//! The extraction pipeline itself never surfaces these to its caller for
//! input-data reasons: every component returns `Result`, and the
//! orchestrator in [`crate::core::extractor`] decides how each failure
//! degrades the final artifact. Errors do reach callers of the lower-level
//! building blocks and of the configuration loaders.
//!
//! - `Io` - File system and I/O errors (always bubble up unchanged)
//! - `Validation` - Invalid configuration or parameters
//! - `ExternalTool` - A conversion process failed or reported errors
//! - `MissingDependency` - A required executable is not installed
//! - `LanguageDetection` - No language could be identified
//!
//! # Example
//!
//! ```rust
//! use docsift::{DocsiftError, Result};
//!
//! fn read_config(path: &str) -> Result<String> {
//!     let content = std::fs::read_to_string(path)?;
//!
//!     if content.is_empty() {
//!         return Err(DocsiftError::validation(format!("Config is empty: {}", path)));
//!     }
//!
//!     Ok(content)
//! }
//! ```
use thiserror::Error;

/// Result type alias using `DocsiftError`.
pub type Result<T> = std::result::Result<T, DocsiftError>;

/// Main error type for all docsift operations.
#[derive(Debug, Error)]
pub enum DocsiftError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Validation error: {message}")]
    Validation {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Serialization error: {message}")]
    Serialization {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("External tool '{tool}' failed: {message}")]
    ExternalTool { tool: String, message: String },

    #[error("Missing dependency: {0}")]
    MissingDependency(String),

    #[error("Language detection failed: {0}")]
    LanguageDetection(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

impl From<serde_json::Error> for DocsiftError {
    fn from(err: serde_json::Error) -> Self {
        DocsiftError::Serialization {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

impl From<base64::DecodeError> for DocsiftError {
    fn from(err: base64::DecodeError) -> Self {
        DocsiftError::Validation {
            message: format!("Invalid base64 document contents: {}", err),
            source: Some(Box::new(err)),
        }
    }
}

macro_rules! error_constructor {
    ($name:ident, $variant:ident) => {
        pastey::paste! {
            #[doc = "Create a " $variant " error"]
            pub fn $name<S: Into<String>>(message: S) -> Self {
                Self::$variant {
                    message: message.into(),
                    source: None,
                }
            }

            #[doc = "Create a " $variant " error with source"]
            pub fn [<$name _with_source>]<S: Into<String>, E: std::error::Error + Send + Sync + 'static>(
                message: S,
                source: E,
            ) -> Self {
                Self::$variant {
                    message: message.into(),
                    source: Some(Box::new(source)),
                }
            }
        }
    };
}

impl DocsiftError {
    error_constructor!(validation, Validation);

    /// Create an ExternalTool error for the named program.
    pub fn external_tool<T: Into<String>, S: Into<String>>(tool: T, message: S) -> Self {
        Self::ExternalTool {
            tool: tool.into(),
            message: message.into(),
        }
    }
}
