// SPDX-License-Identifier: MIT OR Apache-2.0

//! Syntactic validation of configuration documents.
//!
//! Documents are JSON extended with `//` and `/* */` comments and trailing
//! commas, and nothing else. Only syntax is checked; there is no schema at
//! this layer.

use crate::domain::{Category, Result, StoreError};
use jsonc_parser::{parse_to_value, ParseOptions};
use serde::de::IgnoredAny;

/// Checks that `contents` is a syntactically valid JSONC document.
///
/// An empty (or whitespace and comment only) document is rejected. Beyond
/// comments and trailing commas the document must be strict JSON: missing
/// commas, single-quoted strings and raw control characters in strings are
/// all rejected.
///
/// # Examples
///
/// ```
/// use cfgstore::domain::{validate_document, Category};
///
/// assert!(validate_document(Category::Site, "{\"a\": 1, // note\n}").is_ok());
/// assert!(validate_document(Category::Site, "{\"a\": 1").is_err());
/// assert!(validate_document(Category::Site, "[1 2]").is_err());
/// ```
pub fn validate_document(category: Category, contents: &str) -> Result<()> {
    let options = ParseOptions {
        allow_comments: true,
        allow_trailing_commas: true,
        allow_loose_object_property_names: false,
        ..Default::default()
    };

    match parse_to_value(contents, &options) {
        Ok(Some(_)) => {}
        Ok(None) => return Err(malformed(category, "document is empty")),
        Err(e) => return Err(malformed(category, e.to_string())),
    }

    // The JSONC parser is lenient about separators and quoting, so the
    // document is also checked as strict JSON once the extensions are gone.
    serde_json::from_str::<IgnoredAny>(&strip_extensions(contents))
        .map(|_| ())
        .map_err(|e| malformed(category, e.to_string()))
}

fn malformed(category: Category, message: impl Into<String>) -> StoreError {
    StoreError::MalformedConfiguration {
        category,
        message: message.into(),
    }
}

/// Rewrites JSONC as plain JSON: comments and trailing commas become blanks.
///
/// Line breaks are kept so strict-parse errors point at the original line.
fn strip_extensions(contents: &str) -> String {
    let mut out = String::with_capacity(contents.len());
    let mut chars = contents.chars().peekable();
    // Byte offset in `out` of a comma not yet followed by a value.
    let mut pending_comma: Option<usize> = None;

    while let Some(c) = chars.next() {
        match c {
            '"' => {
                pending_comma = None;
                out.push(c);
                let mut escaped = false;
                for c in chars.by_ref() {
                    out.push(c);
                    if escaped {
                        escaped = false;
                    } else if c == '\\' {
                        escaped = true;
                    } else if c == '"' {
                        break;
                    }
                }
            }
            '/' if chars.peek() == Some(&'/') => {
                chars.next();
                out.push_str("  ");
                while let Some(&c) = chars.peek() {
                    if c == '\n' {
                        break;
                    }
                    out.push(blank(c));
                    chars.next();
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                out.push_str("  ");
                let mut prev = ' ';
                for c in chars.by_ref() {
                    out.push(blank(c));
                    if prev == '*' && c == '/' {
                        break;
                    }
                    prev = c;
                }
            }
            ',' => {
                pending_comma = Some(out.len());
                out.push(c);
            }
            '}' | ']' => {
                if let Some(at) = pending_comma.take() {
                    out.replace_range(at..at + 1, " ");
                }
                out.push(c);
            }
            c if c.is_whitespace() => out.push(c),
            c => {
                pending_comma = None;
                out.push(c);
            }
        }
    }
    out
}

fn blank(c: char) -> char {
    if c == '\n' {
        '\n'
    } else {
        ' '
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_valid(contents: &str) -> bool {
        validate_document(Category::Core, contents).is_ok()
    }

    #[test]
    fn test_plain_json() {
        assert!(is_valid("{}"));
        assert!(is_valid(r#"{"a": 1, "b": [true, null, "x"]}"#));
    }

    #[test]
    fn test_comments_allowed() {
        assert!(is_valid("// leading\n{\"a\": 1}"));
        assert!(is_valid("{/* block */ \"a\": 1}"));
    }

    #[test]
    fn test_trailing_commas_allowed() {
        assert!(is_valid(r#"{"a": 1,}"#));
        assert!(is_valid(r#"{"a": [1, 2,],}"#));
    }

    #[test]
    fn test_unbalanced_braces_rejected() {
        assert!(!is_valid("{"));
        assert!(!is_valid(r#"{"a": 1}}"#));
        assert!(!is_valid(r#"{"a": [1, 2}"#));
        assert!(!is_valid(r#"{"a": 1 "b": 2}"#));
        assert!(!is_valid("[1 2 3]"));
        assert!(!is_valid("{'a': 1}"));
    }

    #[test]
    fn test_raw_control_characters_rejected() {
        assert!(!is_valid("{\"a\": \"tab\there\"}"));
        assert!(is_valid(r#"{"a": "tab\there"}"#));
    }

    #[test]
    fn test_extensions_inside_strings_preserved() {
        assert!(is_valid(r#"{"url": "http://example.com/*x*/", "b": ",]"}"#));
        assert!(is_valid("{\"a\": \"say \\\"hi\\\"\", // done\n}"));
    }

    #[test]
    fn test_trailing_comma_after_comment() {
        assert!(is_valid("[1, 2, /* last */\n]"));
        assert!(is_valid("{\"a\": 1, // end\n}"));
        assert!(!is_valid("[1,, 2]"));
    }

    #[test]
    fn test_strip_extensions_keeps_lines() {
        let stripped = strip_extensions("{\"a\": 1, // c\n}");
        assert_eq!(stripped.lines().count(), 2);
        assert!(!stripped.contains("//"));
        assert!(!stripped.contains(','));
    }

    #[test]
    fn test_empty_document_rejected() {
        let err = validate_document(Category::Site, "   ").unwrap_err();
        assert!(matches!(
            err,
            StoreError::MalformedConfiguration {
                category: Category::Site,
                ..
            }
        ));
    }

    #[test]
    fn test_unquoted_keys_rejected() {
        assert!(!is_valid("{a: 1}"));
    }
}
