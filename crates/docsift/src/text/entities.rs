//! HTML character reference decoding.
//!
//! Lenient by construction: malformed or unknown references are kept
//! verbatim instead of failing the whole text. References missing their
//! `;` are decoded the way browsers do: numeric ones always, named ones
//! only for the legacy names HTML allows without a terminator.

use once_cell::sync::Lazy;
use quick_xml::escape::resolve_html5_entity;
use std::borrow::Cow;
use std::collections::HashSet;

/// Longest named reference in the HTML5 table (`&CounterClockwiseContourIntegral;`).
const MAX_ENTITY_NAME_LEN: usize = 32;

/// Named references that are recognised without a trailing `;`.
static LEGACY_ENTITIES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "AElig", "AMP", "Aacute", "Acirc", "Agrave", "Aring", "Atilde", "Auml", "COPY", "Ccedil", "ETH", "Eacute",
        "Ecirc", "Egrave", "Euml", "GT", "Iacute", "Icirc", "Igrave", "Iuml", "LT", "Ntilde", "Oacute", "Ocirc",
        "Ograve", "Oslash", "Otilde", "Ouml", "QUOT", "REG", "THORN", "Uacute", "Ucirc", "Ugrave", "Uuml", "Yacute",
        "aacute", "acirc", "acute", "aelig", "agrave", "amp", "aring", "atilde", "auml", "brvbar", "ccedil", "cedil",
        "cent", "copy", "curren", "deg", "divide", "eacute", "ecirc", "egrave", "eth", "euml", "frac12", "frac14",
        "frac34", "gt", "iacute", "icirc", "iexcl", "igrave", "iquest", "iuml", "laquo", "lt", "macr", "micro",
        "middot", "nbsp", "not", "ntilde", "oacute", "ocirc", "ograve", "ordf", "ordm", "oslash", "otilde", "ouml",
        "para", "plusmn", "pound", "quot", "raquo", "reg", "sect", "shy", "sup1", "sup2", "sup3", "szlig", "thorn",
        "times", "uacute", "ucirc", "ugrave", "uml", "uuml", "yacute", "yen", "yuml",
    ]
    .into_iter()
    .collect()
});

/// Replace HTML character references with the characters they name.
///
/// Handles named (`&amp;`), decimal (`&#160;`) and hexadecimal (`&#xA0;`)
/// references, with or without the closing `;` where HTML permits it.
/// Each reference is decoded once; the output is not rescanned, so
/// `&amp;lt;` becomes `&lt;`.
///
/// # Example
///
/// ```rust
/// use docsift::text::entities::unescape_html;
///
/// assert_eq!(unescape_html("fish &amp; chips"), "fish & chips");
/// assert_eq!(unescape_html("a&#160;b"), "a\u{A0}b");
/// assert_eq!(unescape_html("&copy 2024"), "© 2024");
/// ```
pub fn unescape_html(text: &str) -> Cow<'_, str> {
    if !text.contains('&') {
        return Cow::Borrowed(text);
    }

    let mut output = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(amp) = rest.find('&') {
        output.push_str(&rest[..amp]);
        let candidate = &rest[amp + 1..];

        match decode_reference(candidate) {
            Some((decoded, consumed)) => {
                output.push_str(&decoded);
                rest = &candidate[consumed..];
            }
            None => {
                output.push('&');
                rest = candidate;
            }
        }
    }

    output.push_str(rest);
    Cow::Owned(output)
}

/// Decode the reference at the start of `candidate` (just after the `&`).
///
/// Returns the replacement and the number of bytes consumed, `;` included
/// when present.
fn decode_reference(candidate: &str) -> Option<(Cow<'static, str>, usize)> {
    match candidate.strip_prefix('#') {
        Some(numeric) => decode_numeric_reference(numeric).map(|(c, len)| (Cow::Owned(c.to_string()), len + 1)),
        None => decode_named_reference(candidate),
    }
}

fn decode_numeric_reference(numeric: &str) -> Option<(char, usize)> {
    let (digits_start, radix) = match numeric.as_bytes().first() {
        Some(b'x' | b'X') => (1, 16),
        _ => (0, 10),
    };
    let digits_len = numeric[digits_start..]
        .bytes()
        .take_while(|b| b.is_ascii_digit() || (radix == 16 && b.is_ascii_hexdigit()))
        .count();
    if digits_len == 0 {
        return None;
    }

    let digits_end = digits_start + digits_len;
    let code = u32::from_str_radix(&numeric[digits_start..digits_end], radix).unwrap_or(u32::MAX);
    let consumed = if numeric[digits_end..].starts_with(';') {
        digits_end + 1
    } else {
        digits_end
    };

    Some((decode_numeric(code), consumed))
}

fn decode_named_reference(candidate: &str) -> Option<(Cow<'static, str>, usize)> {
    let name_len = candidate
        .bytes()
        .take(MAX_ENTITY_NAME_LEN)
        .take_while(u8::is_ascii_alphanumeric)
        .count();
    let name = &candidate[..name_len];
    if name.is_empty() {
        return None;
    }

    if candidate[name_len..].starts_with(';')
        && let Some(decoded) = resolve_html5_entity(name)
    {
        return Some((Cow::Borrowed(decoded), name_len + 1));
    }

    // Longest legacy name prefixing the run: `&copy2024` is `©2024`.
    (2..=name_len).rev().find_map(|len| {
        let prefix = &name[..len];
        if !LEGACY_ENTITIES.contains(prefix) {
            return None;
        }
        resolve_html5_entity(prefix).map(|decoded| (Cow::Borrowed(decoded), len))
    })
}

fn decode_numeric(code: u32) -> char {
    match code {
        0 => '\u{FFFD}',
        // Windows-1252 code points that browsers remap inside references.
        0x80..=0x9F => windows_1252_c1(code),
        _ => char::from_u32(code).unwrap_or('\u{FFFD}'),
    }
}

fn windows_1252_c1(code: u32) -> char {
    let mapped = match code {
        0x80 => 0x20AC,
        0x82 => 0x201A,
        0x83 => 0x0192,
        0x84 => 0x201E,
        0x85 => 0x2026,
        0x86 => 0x2020,
        0x87 => 0x2021,
        0x88 => 0x02C6,
        0x89 => 0x2030,
        0x8A => 0x0160,
        0x8B => 0x2039,
        0x8C => 0x0152,
        0x8E => 0x017D,
        0x91 => 0x2018,
        0x92 => 0x2019,
        0x93 => 0x201C,
        0x94 => 0x201D,
        0x95 => 0x2022,
        0x96 => 0x2013,
        0x97 => 0x2014,
        0x98 => 0x02DC,
        0x99 => 0x2122,
        0x9A => 0x0161,
        0x9B => 0x203A,
        0x9C => 0x0153,
        0x9E => 0x017E,
        0x9F => 0x0178,
        other => other,
    };
    char::from_u32(mapped).unwrap_or('\u{FFFD}')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unescape_without_references_borrows() {
        assert!(matches!(unescape_html("plain text"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_unescape_named() {
        assert_eq!(unescape_html("&lt;b&gt; &amp; &quot;q&quot;"), "<b> & \"q\"");
        assert_eq!(unescape_html("caf&eacute;"), "café");
    }

    #[test]
    fn test_unescape_numeric() {
        assert_eq!(unescape_html("&#65;&#x42;&#X43;"), "ABC");
        assert_eq!(unescape_html("&#160;"), "\u{A0}");
    }

    #[test]
    fn test_unescape_decodes_once() {
        assert_eq!(unescape_html("&amp;amp;"), "&amp;");
        assert_eq!(unescape_html("&amp;lt;"), "&lt;");
    }

    #[test]
    fn test_unescape_keeps_malformed_references() {
        assert_eq!(unescape_html("AT&T"), "AT&T");
        assert_eq!(unescape_html("a & b"), "a & b");
        assert_eq!(unescape_html("&nosuchentity;"), "&nosuchentity;");
        assert_eq!(unescape_html("&#xZZ;"), "&#xZZ;");
        assert_eq!(unescape_html("trailing &"), "trailing &");
    }

    #[test]
    fn test_unescape_windows_1252_references() {
        assert_eq!(unescape_html("&#150;"), "\u{2013}");
        assert_eq!(unescape_html("&#128;"), "€");
    }

    #[test]
    fn test_unescape_out_of_range() {
        assert_eq!(unescape_html("&#1114112;"), "\u{FFFD}");
        assert_eq!(unescape_html("&#xD800;"), "\u{FFFD}");
        assert_eq!(unescape_html("a&#99999999999;b"), "a\u{FFFD}b");
        assert_eq!(unescape_html("&#xFFFFFFFFFFFF;"), "\u{FFFD}");
    }

    #[test]
    fn test_unescape_without_semicolon() {
        assert_eq!(unescape_html("&amp &lt &#160 &#99999999999;"), "& < \u{A0} \u{FFFD}");
        assert_eq!(unescape_html("a &nbsp b &copy x"), "a \u{A0} b © x");
        assert_eq!(unescape_html("&#x41&#66z"), "ABz");
    }

    #[test]
    fn test_unescape_legacy_prefix() {
        assert_eq!(unescape_html("&copy2024"), "©2024");
        assert_eq!(unescape_html("&notit;"), "¬it;");
        assert_eq!(unescape_html("fish &ampchips"), "fish &chips");
    }

    #[test]
    fn test_unescape_modern_names_need_semicolon() {
        assert_eq!(unescape_html("&hellip"), "&hellip");
        assert_eq!(unescape_html("&hellip;"), "\u{2026}");
    }
}
