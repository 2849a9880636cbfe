//! Lenient markup to plain text conversion.
//!
//! Markup is not parsed into a tree. It is lexed into a flat stream that
//! alternates content runs and tag runs, and each tag run is rewritten
//! according to a [`TagRules`] table:
//!
//! - breakline tags become a newline (two for headings and tables)
//! - every other tag becomes a single space
//! - subtree-removal tags (`script`, `style` by default) are deleted together
//!   with everything up to their balanced closing tag
//!
//! # Example
//!
//! ```rust
//! use docsift::extraction::markup::{TagRules, markup_to_text};
//!
//! let html = "<h1>Title</h1><script>var x = 1;</script><p>Body <b>text</b></p>";
//! let text = markup_to_text(html, &TagRules::default());
//! assert_eq!(text, "Title\n\nBody text");
//! ```

use crate::core::config::MarkupConfig;
use crate::text::cleaner::clean;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

static COMMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<!--.*?-->").expect("Comment regex pattern is valid and should compile"));
static TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)<[ \t]*([a-zA-Z0-9!"./_-]*)[^>]*>"#).expect("Tag regex pattern is valid and should compile")
});

/// Replacement applied to a tag run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagPolicy {
    Space,
    Newline,
    DoubleNewline,
}

impl TagPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            TagPolicy::Space => " ",
            TagPolicy::Newline => "\n",
            TagPolicy::DoubleNewline => "\n\n",
        }
    }
}

/// A tag run in the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag<'a> {
    /// The tag exactly as it appeared, brackets included.
    pub raw: &'a str,
    /// Lower-cased tag name without the leading `/` of closing tags.
    pub name: String,
    pub is_closing: bool,
    /// Written as `<name ... />`.
    pub is_self_closing: bool,
}

impl<'a> Tag<'a> {
    fn parse(raw: &'a str, captured_name: &str) -> Self {
        let lowered = captured_name.to_lowercase();
        let (name, is_closing) = match lowered.strip_prefix('/') {
            Some(bare) => (bare.to_string(), true),
            None => (lowered, false),
        };
        let is_self_closing = !is_closing && raw.trim_end_matches('>').trim_end().ends_with('/');

        Tag {
            raw,
            name,
            is_closing,
            is_self_closing,
        }
    }

    /// Name as written in the rule tables: closing tags keep their `/`.
    pub fn qualified_name(&self) -> String {
        if self.is_closing {
            format!("/{}", self.name)
        } else {
            self.name.clone()
        }
    }
}

/// One unit of the markup stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagToken<'a> {
    Content(&'a str),
    Tag(&'a Tag<'a>),
}

/// Alternating content and tag runs.
///
/// `contents` always holds exactly one more element than `tags`:
/// `contents[i]` precedes `tags[i]`, and the last content run trails the
/// final tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagStream<'a> {
    pub contents: Vec<&'a str>,
    pub tags: Vec<Tag<'a>>,
}

impl TagStream<'_> {
    /// Iterate the runs in document order.
    pub fn tokens(&self) -> impl Iterator<Item = TagToken<'_>> {
        let trailing = self.contents.last().map(|content| TagToken::Content(content));
        self.contents
            .iter()
            .zip(self.tags.iter())
            .flat_map(|(content, tag)| [TagToken::Content(content), TagToken::Tag(tag)])
            .chain(trailing)
    }
}

/// Tag rewriting tables.
///
/// Breakline entries are matched on the qualified name (`div`, `/div`,
/// `br/`); double-breakline and subtree-removal entries on the bare name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagRules {
    breakline: HashSet<String>,
    double_breakline: HashSet<String>,
    remove_subtree: HashSet<String>,
}

impl TagRules {
    pub fn new<I, J, K, S>(breakline: I, double_breakline: J, remove_subtree: K) -> Self
    where
        I: IntoIterator<Item = S>,
        J: IntoIterator<Item = S>,
        K: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let lower = |name: S| name.as_ref().trim().to_lowercase();
        Self {
            breakline: breakline.into_iter().map(lower).collect(),
            double_breakline: double_breakline.into_iter().map(lower).collect(),
            remove_subtree: remove_subtree.into_iter().map(lower).collect(),
        }
    }

    pub fn from_config(config: &MarkupConfig) -> Self {
        Self::new(
            &config.breakline_tags,
            &config.double_breakline_tags,
            &config.remove_subtree_tags,
        )
    }

    pub fn policy(&self, tag: &Tag<'_>) -> TagPolicy {
        if !self.breakline.contains(&tag.qualified_name()) {
            return TagPolicy::Space;
        }
        if self.double_breakline.contains(&tag.name) {
            TagPolicy::DoubleNewline
        } else {
            TagPolicy::Newline
        }
    }

    /// Whether this tag opens a subtree that must be deleted.
    pub fn opens_removed_subtree(&self, tag: &Tag<'_>) -> bool {
        !tag.is_closing && !tag.is_self_closing && self.remove_subtree.contains(&tag.name)
    }
}

impl Default for TagRules {
    fn default() -> Self {
        Self::from_config(&MarkupConfig::default())
    }
}

/// Remove comments and embedded line breaks ahead of tokenization.
pub fn preprocess(markup: &str) -> String {
    COMMENT.replace_all(&markup.replace(['\r', '\n'], ""), "").into_owned()
}

/// Split preprocessed markup into a [`TagStream`].
pub fn tokenize(markup: &str) -> TagStream<'_> {
    let mut contents = Vec::new();
    let mut tags = Vec::new();
    let mut last_end = 0;

    for captures in TAG.captures_iter(markup) {
        let Some(whole) = captures.get(0) else {
            continue;
        };
        let name = captures.get(1).map_or("", |m| m.as_str());

        contents.push(&markup[last_end..whole.start()]);
        tags.push(Tag::parse(whole.as_str(), name));
        last_end = whole.end();
    }
    contents.push(&markup[last_end..]);

    TagStream { contents, tags }
}

/// Render a tag stream into text, before cleaning.
///
/// A removed subtree is replaced by a single newline. Nested tags of the
/// same name are balanced; an unclosed subtree runs to the end of the stream.
pub fn render(stream: &TagStream<'_>, rules: &TagRules) -> String {
    let mut output = String::with_capacity(stream.contents.iter().map(|c| c.len()).sum::<usize>() + stream.tags.len());
    let mut removing: Option<&str> = None;
    let mut depth = 0usize;

    for token in stream.tokens() {
        let tag = match token {
            TagToken::Content(content) => {
                if removing.is_none() {
                    output.push_str(content);
                }
                continue;
            }
            TagToken::Tag(tag) => tag,
        };

        if let Some(name) = removing {
            if tag.name == name {
                if tag.is_closing {
                    depth -= 1;
                    if depth == 0 {
                        removing = None;
                    }
                } else if !tag.is_self_closing {
                    depth += 1;
                }
            }
            continue;
        }

        if rules.opens_removed_subtree(tag) {
            output.push('\n');
            removing = Some(tag.name.as_str());
            depth = 1;
        } else {
            output.push_str(rules.policy(tag).as_str());
        }
    }

    if let Some(name) = removing {
        tracing::debug!("Unclosed <{}> removed the rest of the document", name);
    }

    output
}

/// Convert markup to cleaned plain text.
pub fn markup_to_text(markup: &str, rules: &TagRules) -> String {
    let preprocessed = preprocess(markup);
    let stream = tokenize(&preprocessed);
    clean(&render(&stream, rules))
}
