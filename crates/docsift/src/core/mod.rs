//! Core extraction orchestration module.
//!
//! The core module is responsible for:
//! - **Entry Points**: `extract_document()` and its sync and batch variants
//! - **MIME Detection**: Classifying raw document bytes
//! - **Configuration**: Loading and managing extraction configuration
//!
//! # Example
//!
//! ```rust,no_run
//! use docsift::core::extractor::extract_document;
//! use docsift::core::config::ExtractionConfig;
//! use docsift::types::RawDocument;
//!
//! # async fn example() -> docsift::Result<()> {
//! let config = ExtractionConfig::discover()?.unwrap_or_default();
//! let contents = std::fs::read("document.pdf")?;
//! let extracted = extract_document(&RawDocument::new(contents), &config).await;
//! println!("Extracted text: {}", extracted.text);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod extractor;
pub mod mime;

pub use config::{ExtractionConfig, LanguageDetectionConfig, MarkupConfig, PdfConfig};
