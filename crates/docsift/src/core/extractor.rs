//! Main extraction entry points.
//!
//! One document flows through a fixed sequence of steps:
//!
//! ```text
//! classify -> dispatch (plain | markup | pdf | unknown) -> decode -> unescape -> clean -> detect language
//! ```
//!
//! Unclassifiable content stops at dispatch with the
//! [`ExtractedDocument::unknown`] sentinel. Nothing in the pipeline fails
//! for input-data reasons: every failure degrades the artifact (empty text,
//! metadata or language) and is logged.
//!
//! # Functions
//!
//! - [`extract_document`] - Extract one document using the system's poppler tools
//! - [`extract_document_with_runner`] - Same, with a custom [`CommandRunner`]
//! - [`extract_document_sync`] - Blocking wrapper over [`extract_document`]
//! - [`batch_extract_documents`] - Extract many documents concurrently

use crate::core::config::ExtractionConfig;
use crate::core::mime::detect_mime_type_from_bytes;
use crate::extraction::markup::{TagRules, markup_to_text};
use crate::extraction::pdf::extract_pdf;
use crate::extraction::process::{CommandRunner, SystemCommandRunner};
use crate::language_detection::detect_language;
use crate::text::cleaner::clean;
use crate::text::encoding::decode_text_bytes;
use crate::text::entities::unescape_html;
use crate::types::{ExtractedDocument, MimeType, PdfMetadata, RawDocument};
use once_cell::sync::Lazy;
use std::sync::Arc;

/// Global Tokio runtime for synchronous operations.
///
/// Lazily initialized on first use and shared across all sync wrappers.
/// Runtime creation only fails on resource exhaustion, in which case
/// nothing else would work either.
static GLOBAL_RUNTIME: Lazy<tokio::runtime::Runtime> = Lazy::new(|| {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("Failed to create global Tokio runtime - system may be out of resources")
});

/// Value carried from dispatch into the decode step.
enum Carried<'a> {
    Bytes(&'a [u8]),
    Text(String),
}

/// Extract plain text, metadata and language from a document.
///
/// PDF conversion runs the configured poppler programs with the configured
/// timeout.
///
/// # Example
///
/// ```rust
/// use docsift::core::config::ExtractionConfig;
/// use docsift::core::extractor::extract_document;
/// use docsift::types::{MimeType, RawDocument};
///
/// # async fn example() {
/// let document = RawDocument::new("This is a test file.\nI'm testing the extractor worker!");
/// let extracted = extract_document(&document, &ExtractionConfig::default()).await;
/// assert_eq!(extracted.mimetype, MimeType::PlainText);
/// assert_eq!(extracted.text, "This is a test file.\nI'm testing the extractor worker!");
/// # }
/// ```
pub async fn extract_document(document: &RawDocument, config: &ExtractionConfig) -> ExtractedDocument {
    let runner = SystemCommandRunner::new(config.pdf.timeout_secs);
    extract_document_with_runner(document, config, &runner).await
}

/// Extract a document, running external conversions through `runner`.
#[cfg_attr(feature = "otel", tracing::instrument(
    skip(document, config, runner),
    fields(
        extraction.filename = ?document.filename,
        extraction.size_bytes = document.contents.len(),
    )
))]
pub async fn extract_document_with_runner(
    document: &RawDocument,
    config: &ExtractionConfig,
    runner: &dyn CommandRunner,
) -> ExtractedDocument {
    let detected = match detect_mime_type_from_bytes(&document.contents) {
        Ok(mime_type) => mime_type,
        Err(e) => {
            tracing::warn!("Classification of {:?} failed, treating as unknown: {}", document.filename, e);
            return ExtractedDocument::unknown();
        }
    };

    let mimetype = MimeType::from_detected(&detected);
    let rules = TagRules::from_config(&config.markup);
    let mut file_metadata = PdfMetadata::new();
    let mut extraction_error = None;

    let carried = match mimetype {
        MimeType::Unknown => {
            tracing::debug!("Unsupported content type {} for {:?}", detected, document.filename);
            return ExtractedDocument::unknown();
        }
        MimeType::PlainText => Carried::Bytes(&document.contents),
        MimeType::Html => Carried::Text(markup_to_text(&decode_text_bytes(&document.contents), &rules)),
        MimeType::Pdf => match extract_pdf(&document.contents, &config.pdf, &rules, runner).await {
            Ok(extraction) => {
                file_metadata = extraction.metadata;
                Carried::Text(extraction.text)
            }
            Err(e) => {
                tracing::warn!("PDF conversion of {:?} failed: {}", document.filename, e);
                extraction_error = Some(e.to_string());
                Carried::Text(String::new())
            }
        },
    };

    let decoded = match carried {
        Carried::Bytes(bytes) => decode_text_bytes(bytes),
        Carried::Text(text) => text,
    };
    let text = clean(&unescape_html(&decoded));

    let language = match detect_language(&text, &config.language_detection) {
        Ok(language) => language.unwrap_or_default(),
        Err(e) => {
            tracing::warn!("Language detection for {:?} failed: {}", document.filename, e);
            String::new()
        }
    };

    ExtractedDocument {
        text,
        mimetype,
        file_metadata,
        language,
        forced_decoding: None,
        extraction_error,
    }
}

/// Synchronous wrapper for [`extract_document`].
///
/// Uses the global Tokio runtime; must not be called from inside an async
/// context.
pub fn extract_document_sync(document: &RawDocument, config: &ExtractionConfig) -> ExtractedDocument {
    GLOBAL_RUNTIME.block_on(extract_document(document, config))
}

/// Extract multiple documents concurrently.
///
/// The concurrency limit comes from
/// `ExtractionConfig::max_concurrent_extractions` and defaults to
/// `num_cpus * 2`. Results are returned in input order.
pub async fn batch_extract_documents(documents: Vec<RawDocument>, config: &ExtractionConfig) -> Vec<ExtractedDocument> {
    let runner: Arc<dyn CommandRunner> = Arc::new(SystemCommandRunner::new(config.pdf.timeout_secs));
    batch_extract_documents_with_runner(documents, config, runner).await
}

/// [`batch_extract_documents`] with a custom [`CommandRunner`].
#[cfg_attr(feature = "otel", tracing::instrument(
    skip(config, documents, runner),
    fields(
        extraction.batch_size = documents.len(),
    )
))]
pub async fn batch_extract_documents_with_runner(
    documents: Vec<RawDocument>,
    config: &ExtractionConfig,
    runner: Arc<dyn CommandRunner>,
) -> Vec<ExtractedDocument> {
    use tokio::sync::Semaphore;
    use tokio::task::JoinSet;

    if documents.is_empty() {
        return vec![];
    }

    let config = Arc::new(config.clone());

    let max_concurrent = config
        .max_concurrent_extractions
        .unwrap_or_else(|| num_cpus::get() * 2)
        .max(1);
    let semaphore = Arc::new(Semaphore::new(max_concurrent));

    let mut tasks = JoinSet::new();

    for (index, document) in documents.into_iter().enumerate() {
        let config_clone = Arc::clone(&config);
        let semaphore_clone = Arc::clone(&semaphore);
        let runner_clone = Arc::clone(&runner);

        tasks.spawn(async move {
            // The semaphore is never closed, so acquisition always succeeds.
            let _permit = semaphore_clone.acquire().await.ok();
            let result = extract_document_with_runner(&document, &config_clone, runner_clone.as_ref()).await;
            (index, result)
        });
    }

    let mut results: Vec<Option<ExtractedDocument>> = vec![None; tasks.len()];

    while let Some(task_result) = tasks.join_next().await {
        match task_result {
            Ok((index, result)) => {
                results[index] = Some(result);
            }
            Err(join_err) => {
                tracing::warn!("Extraction task panicked: {}", join_err);
            }
        }
    }

    results
        .into_iter()
        .map(|result| {
            result.unwrap_or_else(|| ExtractedDocument {
                extraction_error: Some("extraction task panicked".to_string()),
                ..ExtractedDocument::unknown()
            })
        })
        .collect()
}
