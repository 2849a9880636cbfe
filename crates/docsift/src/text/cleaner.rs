//! Whitespace and punctuation canonicalization.
//!
//! The rules run in a fixed order; changing the order changes the output.

use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;

static SPACES_AFTER_NEWLINES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\n+)[ \t]*").expect("Newline padding regex pattern is valid and should compile"));
static SPACES_BEFORE_NEWLINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[ \t]*\n").expect("Trailing space regex pattern is valid and should compile"));
static BLANK_LINES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n{3,}").expect("Blank line regex pattern is valid and should compile"));
static SPACE_RUNS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[ \t]{2,}").expect("Space run regex pattern is valid and should compile"));
static SPACE_BEFORE_PUNCTUATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[ \t]*([!,.:;?])").expect("Punctuation spacing regex pattern is valid and should compile")
});

#[inline]
fn chain_replacements<'a>(mut text: Cow<'a, str>, replacements: &[(&Regex, &str)]) -> Cow<'a, str> {
    for (pattern, replacement) in replacements {
        if pattern.is_match(&text) {
            text = Cow::Owned(pattern.replace_all(&text, *replacement).into_owned());
        }
    }
    text
}

/// Canonicalize whitespace in extracted text.
///
/// Applying it to its own output returns the same text.
///
/// # Example
///
/// ```rust
/// use docsift::text::cleaner::clean;
///
/// assert_eq!(clean("  Hello   world ,\n\n\n\n  again !  "), "Hello world,\n\nagain!");
/// ```
pub fn clean(text: &str) -> String {
    let replacements = [
        (&*SPACES_AFTER_NEWLINES, "${1}"),
        (&*SPACES_BEFORE_NEWLINE, "\n"),
        (&*BLANK_LINES, "\n\n"),
        (&*SPACE_RUNS, " "),
        (&*SPACE_BEFORE_PUNCTUATION, "${1}"),
    ];

    chain_replacements(Cow::Borrowed(text), &replacements).trim().to_string()
}
