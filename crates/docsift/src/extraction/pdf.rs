//! PDF text and metadata extraction through poppler's command line tools.
//!
//! Two programs run per document, both reading the PDF on stdin:
//!
//! - `pdftohtml -q -i - <base>` writes `<base>.html`, `<base>_ind.html` and
//!   `<base>s.html`; the last one holds the page text as markup.
//! - `pdfinfo -` prints `Key: value` lines.
//!
//! The output base lives inside a private temporary directory that is
//! removed when extraction returns, whichever way it returns.
//!
//! # System Requirement
//!
//! poppler-utils must be installed:
//! - **macOS**: `brew install poppler`
//! - **Linux**: `apt install poppler-utils` or `dnf install poppler-utils`

use crate::core::config::PdfConfig;
use crate::extraction::markup::{TagRules, markup_to_text};
use crate::extraction::process::{CommandOutput, CommandRunner};
use crate::text::encoding::decode_text_bytes;
use crate::types::PdfMetadata;
use crate::{DocsiftError, Result};
use std::path::Path;

/// Name of the output base inside the temporary directory.
const OUTPUT_BASE_NAME: &str = "document";

/// Text and metadata recovered from one PDF.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PdfExtraction {
    pub text: String,
    pub metadata: PdfMetadata,
}

impl PdfExtraction {
    pub fn is_empty(&self) -> bool {
        self.text.is_empty() || self.metadata.is_empty()
    }
}

/// Parse `pdfinfo` output into an ordered metadata map.
///
/// Each line is split at its first `:`; key and value are trimmed. Lines
/// without a colon are skipped.
///
/// # Example
///
/// ```rust
/// use docsift::extraction::pdf::parse_pdf_metadata;
///
/// let metadata = parse_pdf_metadata("Author:    Álvaro Justen\nPages:  1\n");
/// assert_eq!(metadata["Author"], "Álvaro Justen");
/// assert_eq!(metadata["Pages"], "1");
/// ```
pub fn parse_pdf_metadata(info: &str) -> PdfMetadata {
    info.lines()
        .filter_map(|line| line.split_once(':'))
        .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
        .collect()
}

/// Extract text and metadata from PDF bytes.
///
/// Outcome, given whether each tool reported errors (non-zero exit or
/// anything on stderr):
///
/// - text or metadata empty: empty result, or an error if conversion failed
/// - conversion clean: text and metadata, with metadata emptied if `pdfinfo` failed
/// - otherwise an `ExternalTool` error
///
/// # Errors
///
/// `MissingDependency` when a tool is not installed, `ExternalTool` per the
/// rules above, `Io` when the temporary directory cannot be created.
pub async fn extract_pdf(
    contents: &[u8],
    config: &PdfConfig,
    rules: &TagRules,
    runner: &dyn CommandRunner,
) -> Result<PdfExtraction> {
    let temp_dir = tempfile::Builder::new().prefix("docsift-pdf-").tempdir()?;
    let base = temp_dir.path().join(OUTPUT_BASE_NAME);

    let mut markup_args = config.markup_args.clone();
    markup_args.push(base.to_string_lossy().into_owned());

    let markup_output = runner.run(&config.markup_program, &markup_args, contents).await?;
    let markup_failed = markup_output.reported_errors();
    let text = read_page_text(&base, rules, &config.markup_program, &markup_output).await?;

    let info_output = runner
        .run(&config.metadata_program, &config.metadata_args, contents)
        .await?;
    let info_failed = info_output.reported_errors();
    let metadata = match std::str::from_utf8(&info_output.stdout) {
        Ok(info) => parse_pdf_metadata(info),
        Err(e) => {
            tracing::warn!("Ignoring {} output that is not UTF-8: {}", config.metadata_program, e);
            PdfMetadata::new()
        }
    };

    tracing::debug!(
        "PDF converted: {} chars of text, {} metadata fields (conversion failed: {}, info failed: {})",
        text.len(),
        metadata.len(),
        markup_failed,
        info_failed
    );

    let extraction = PdfExtraction { text, metadata };

    if extraction.is_empty() {
        if markup_failed {
            return Err(tool_failure(&config.markup_program, &markup_output));
        }
        return Ok(PdfExtraction::default());
    }

    if !markup_failed {
        if info_failed {
            tracing::warn!(
                "{} reported errors, dropping metadata: {}",
                config.metadata_program,
                info_output.stderr_text()
            );
            return Ok(PdfExtraction {
                metadata: PdfMetadata::new(),
                ..extraction
            });
        }
        return Ok(extraction);
    }

    Err(tool_failure(&config.markup_program, &markup_output))
}

async fn read_page_text(base: &Path, rules: &TagRules, program: &str, output: &CommandOutput) -> Result<String> {
    let mut page_file = base.as_os_str().to_owned();
    page_file.push("s.html");

    let bytes = match tokio::fs::read(&page_file).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            let detail = output.stderr_text();
            return Err(DocsiftError::external_tool(
                program,
                if detail.is_empty() {
                    "no page text was written".to_string()
                } else {
                    format!("no page text was written: {}", detail)
                },
            ));
        }
        Err(e) => return Err(e.into()),
    };

    let markup = decode_text_bytes(&bytes).replace("&#160;", " ");
    Ok(markup_to_text(&markup, rules))
}

fn tool_failure(program: &str, output: &CommandOutput) -> DocsiftError {
    let detail = output.stderr_text();
    if detail.is_empty() {
        DocsiftError::external_tool(program, "exited with a failure status")
    } else {
        DocsiftError::external_tool(program, detail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::path::PathBuf;
    use std::sync::Mutex;

    const PAGE_HTML: &str = "<!DOCTYPE html><html><head></head><body>\
        <a name=1></a><b>Hello</b>&#160;PDF<br/>\nSecond line<br/>\n</body></html>";
    const INFO: &str = "Title:          test\nAuthor:         Álvaro Justen\nPages:          1\n";

    struct FakePoppler {
        page_html: Option<&'static str>,
        markup_stderr: &'static str,
        info_stdout: Vec<u8>,
        info_stderr: &'static str,
        base: Mutex<Option<PathBuf>>,
    }

    impl FakePoppler {
        fn new() -> Self {
            Self {
                page_html: Some(PAGE_HTML),
                markup_stderr: "",
                info_stdout: INFO.as_bytes().to_vec(),
                info_stderr: "",
                base: Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl CommandRunner for FakePoppler {
        async fn run(&self, program: &str, args: &[String], stdin: &[u8]) -> Result<CommandOutput> {
            assert_eq!(stdin, b"%PDF-1.4 fake");
            if program == "pdftohtml" {
                let base = PathBuf::from(args.last().unwrap());
                *self.base.lock().unwrap() = Some(base.clone());
                if let Some(html) = self.page_html {
                    let base = base.to_string_lossy().into_owned();
                    std::fs::write(format!("{}.html", base), "frames").unwrap();
                    std::fs::write(format!("{}_ind.html", base), "index").unwrap();
                    std::fs::write(format!("{}s.html", base), html).unwrap();
                }
                Ok(CommandOutput {
                    success: true,
                    stdout: Vec::new(),
                    stderr: self.markup_stderr.as_bytes().to_vec(),
                })
            } else {
                Ok(CommandOutput {
                    success: true,
                    stdout: self.info_stdout.clone(),
                    stderr: self.info_stderr.as_bytes().to_vec(),
                })
            }
        }
    }

    fn config() -> PdfConfig {
        PdfConfig {
            markup_program: "pdftohtml".to_string(),
            metadata_program: "pdfinfo".to_string(),
            ..PdfConfig::default()
        }
    }

    async fn run(runner: &FakePoppler) -> Result<PdfExtraction> {
        extract_pdf(b"%PDF-1.4 fake", &config(), &TagRules::default(), runner).await
    }

    #[test]
    fn test_parse_pdf_metadata() {
        let metadata = parse_pdf_metadata("Title:  a: b\nno colon here\nPages:1\n  Tagged:  no  \n");
        let keys: Vec<&str> = metadata.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["Title", "Pages", "Tagged"]);
        assert_eq!(metadata["Title"], "a: b");
        assert_eq!(metadata["Pages"], "1");
        assert_eq!(metadata["Tagged"], "no");
    }

    #[test]
    fn test_parse_pdf_metadata_empty() {
        assert!(parse_pdf_metadata("").is_empty());
    }

    #[tokio::test]
    async fn test_extract_pdf_success() {
        let runner = FakePoppler::new();
        let extraction = run(&runner).await.unwrap();

        assert_eq!(extraction.text, "Hello PDF\nSecond line");
        assert_eq!(extraction.metadata["Author"], "Álvaro Justen");
        assert_eq!(extraction.metadata["Pages"], "1");
    }

    #[tokio::test]
    async fn test_extract_pdf_removes_temporary_files() {
        let runner = FakePoppler::new();
        run(&runner).await.unwrap();

        let base = runner.base.lock().unwrap().clone().unwrap();
        assert!(!base.parent().unwrap().exists());
    }

    #[tokio::test]
    async fn test_extract_pdf_removes_temporary_files_on_failure() {
        let runner = FakePoppler {
            markup_stderr: "Syntax Error: Couldn't read xref table",
            ..FakePoppler::new()
        };
        assert!(run(&runner).await.is_err());

        let base = runner.base.lock().unwrap().clone().unwrap();
        assert!(!base.parent().unwrap().exists());
    }

    #[tokio::test]
    async fn test_extract_pdf_conversion_errors_fail() {
        let runner = FakePoppler {
            markup_stderr: "Syntax Error: Couldn't read xref table",
            ..FakePoppler::new()
        };
        let error = run(&runner).await.unwrap_err();
        assert!(matches!(error, DocsiftError::ExternalTool { ref tool, .. } if tool == "pdftohtml"));
        assert!(error.to_string().contains("xref"));
    }

    #[tokio::test]
    async fn test_extract_pdf_info_errors_drop_metadata() {
        let runner = FakePoppler {
            info_stderr: "Syntax Warning: bad annotation",
            ..FakePoppler::new()
        };
        let extraction = run(&runner).await.unwrap();
        assert_eq!(extraction.text, "Hello PDF\nSecond line");
        assert!(extraction.metadata.is_empty());
    }

    #[tokio::test]
    async fn test_extract_pdf_empty_text_is_empty_result() {
        let runner = FakePoppler {
            page_html: Some("<html><body>  </body></html>"),
            ..FakePoppler::new()
        };
        assert_eq!(run(&runner).await.unwrap(), PdfExtraction::default());
    }

    #[tokio::test]
    async fn test_extract_pdf_empty_metadata_is_empty_result() {
        let runner = FakePoppler {
            info_stdout: Vec::new(),
            ..FakePoppler::new()
        };
        assert_eq!(run(&runner).await.unwrap(), PdfExtraction::default());
    }

    #[tokio::test]
    async fn test_extract_pdf_non_utf8_info_is_ignored() {
        let runner = FakePoppler {
            info_stdout: vec![b'T', b'i', b't', b'l', b'e', b':', 0xFF, 0xFE],
            ..FakePoppler::new()
        };
        assert_eq!(run(&runner).await.unwrap(), PdfExtraction::default());
    }

    #[tokio::test]
    async fn test_extract_pdf_missing_output_fails() {
        let runner = FakePoppler {
            page_html: None,
            ..FakePoppler::new()
        };
        let error = run(&runner).await.unwrap_err();
        assert!(matches!(error, DocsiftError::ExternalTool { .. }));
    }
}
