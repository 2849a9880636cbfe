//! Format-specific conversion to plain text.
//!
//! - [`markup`] - Lenient tag-stream conversion of HTML-like markup
//! - [`pdf`] - PDF text and metadata through poppler's command line tools
//! - [`process`] - External process execution used by the PDF path

pub mod markup;
pub mod pdf;
pub mod process;

pub use markup::{TagRules, markup_to_text};
pub use pdf::{PdfExtraction, extract_pdf, parse_pdf_metadata};
pub use process::{CommandOutput, CommandRunner, SystemCommandRunner};
