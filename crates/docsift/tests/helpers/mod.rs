//! Shared fixtures for docsift integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use docsift::core::config::{ExtractionConfig, PdfConfig};
use docsift::{CommandOutput, CommandRunner, Result};
use std::path::PathBuf;
use std::sync::Mutex;

pub const MARKUP_PROGRAM: &str = "pdftohtml";
pub const METADATA_PROGRAM: &str = "pdfinfo";

/// `pdfinfo` output of a one-page LibreOffice export.
pub const PDFINFO_OUTPUT: &str = "Author:         Álvaro Justen
Creator:        Writer
Producer:       LibreOffice 3.5
CreationDate:   Fri Jun  1 17:07:57 2012
Tagged:         no
Pages:          1
Encrypted:      no
Page size:      612 x 792 pts (letter)
Optimized:      no
PDF version:    1.4
";

/// `pdftohtml -i` page text for the same document.
pub const PDFTOHTML_PAGE: &str = "<!DOCTYPE html>
<html>
<head>
<title></title>
</head>
<body>
<a name=1></a>This&#160;is&#160;a&#160;test&#160;file.<br/>
I'm&#160;testing&#160;PyPLN&#160;extractor&#160;worker!<br/>
<hr/>
</body>
</html>
";

/// Configuration whose PDF programs match the scripted runner.
pub fn test_config() -> ExtractionConfig {
    ExtractionConfig {
        pdf: PdfConfig {
            markup_program: MARKUP_PROGRAM.to_string(),
            metadata_program: METADATA_PROGRAM.to_string(),
            ..PdfConfig::default()
        },
        ..ExtractionConfig::default()
    }
}

/// Stand-in for poppler that writes the three `pdftohtml` output files and
/// answers `pdfinfo` with canned output.
pub struct ScriptedPoppler {
    pub page_html: Option<String>,
    pub markup_success: bool,
    pub markup_stderr: String,
    pub info_stdout: Vec<u8>,
    pub info_stderr: String,
    pub output_base: Mutex<Option<PathBuf>>,
    pub calls: Mutex<Vec<String>>,
}

impl Default for ScriptedPoppler {
    fn default() -> Self {
        Self {
            page_html: Some(PDFTOHTML_PAGE.to_string()),
            markup_success: true,
            markup_stderr: String::new(),
            info_stdout: PDFINFO_OUTPUT.as_bytes().to_vec(),
            info_stderr: String::new(),
            output_base: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl ScriptedPoppler {
    pub fn failing_conversion(stderr: &str) -> Self {
        Self {
            markup_success: false,
            markup_stderr: stderr.to_string(),
            ..Self::default()
        }
    }

    /// Output base passed to the last `pdftohtml` call.
    pub fn output_base(&self) -> Option<PathBuf> {
        self.output_base.lock().unwrap().clone()
    }

    /// Programs run so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandRunner for ScriptedPoppler {
    async fn run(&self, program: &str, args: &[String], _stdin: &[u8]) -> Result<CommandOutput> {
        self.calls.lock().unwrap().push(program.to_string());

        match program {
            MARKUP_PROGRAM => {
                let base = args.last().cloned().unwrap_or_default();
                *self.output_base.lock().unwrap() = Some(PathBuf::from(&base));

                if let Some(page) = &self.page_html {
                    std::fs::write(format!("{}.html", base), "<frameset></frameset>")?;
                    std::fs::write(format!("{}_ind.html", base), "<a href=\"documents.html#1\">Page 1</a>")?;
                    std::fs::write(format!("{}s.html", base), page)?;
                }

                Ok(CommandOutput {
                    success: self.markup_success,
                    stdout: Vec::new(),
                    stderr: self.markup_stderr.as_bytes().to_vec(),
                })
            }
            METADATA_PROGRAM => Ok(CommandOutput {
                success: true,
                stdout: self.info_stdout.clone(),
                stderr: self.info_stderr.as_bytes().to_vec(),
            }),
            other => panic!("unexpected program {}", other),
        }
    }
}

/// Build a small valid one-page PDF whose Info dictionary names `author`.
///
/// Strings are written in PDFDocEncoding, which matches Latin-1 for the
/// characters used here.
pub fn minimal_pdf(text: &str, author: &str) -> Vec<u8> {
    let latin1 = |s: &str| -> Vec<u8> { s.chars().map(|c| c as u32 as u8).collect() };
    let stream = format!("BT /F1 12 Tf 72 720 Td ({}) Tj ET", text);

    let objects: Vec<Vec<u8>> = vec![
        b"<< /Type /Catalog /Pages 2 0 R >>".to_vec(),
        b"<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_vec(),
        concat!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents 4 0 R ",
            "/Resources << /Font << /F1 5 0 R >> >> >>"
        )
        .as_bytes()
        .to_vec(),
        format!("<< /Length {} >>\nstream\n{}\nendstream", stream.len(), stream).into_bytes(),
        b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_vec(),
        [b"<< /Author (".to_vec(), latin1(author), b") >>".to_vec()].concat(),
    ];

    let mut pdf = b"%PDF-1.4\n".to_vec();
    let mut offsets = Vec::with_capacity(objects.len());
    for (index, body) in objects.iter().enumerate() {
        offsets.push(pdf.len());
        pdf.extend_from_slice(format!("{} 0 obj\n", index + 1).as_bytes());
        pdf.extend_from_slice(body);
        pdf.extend_from_slice(b"\nendobj\n");
    }

    let xref_offset = pdf.len();
    pdf.extend_from_slice(format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1).as_bytes());
    for offset in offsets {
        pdf.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
    }
    pdf.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R /Info {} 0 R >>\nstartxref\n{}\n%%EOF\n",
            objects.len() + 1,
            objects.len(),
            xref_offset
        )
        .as_bytes(),
    );
    pdf
}
