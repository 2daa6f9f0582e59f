//! Record-to-document transformation.
//!
//! Every record written to an index passes through [`transform`], which runs
//! three steps:
//!
//! 1. **Flatten** the nested record into dot-separated keys. Arrays are either
//!    flattened into index keys (`tags.0`, `tags.1`) or kept whole, depending
//!    on the collection's `preserveArrays` setting.
//! 2. **Sanitize** each key: drop rich-text structure (`blocks`, `nodes`,
//!    `content`) unless the key ends in a known text attribute, drop nulls,
//!    and strip HTML from text-like fields.
//! 3. **Tag** the document with its source collection.
//!
//! # Example
//!
//! ```
//! use meilisync_engine::transform::transform;
//! use serde_json::json;
//!
//! let record = json!({
//!     "id": 1,
//!     "article": {"content": "<p>Hello</p>", "subtitle": null},
//!     "tags": ["rust", "search"]
//! });
//!
//! let doc = transform(&record, "articles", false).unwrap();
//! assert_eq!(doc.get("article.content"), Some(&json!("Hello")));
//! assert_eq!(doc.get("tags.1"), Some(&json!("search")));
//! assert!(!doc.contains_key("article.subtitle"));
//! assert_eq!(doc.collection(), Some("articles"));
//! ```

use serde_json::{Map, Value};

use crate::error::TransformError;
use crate::types::{COLLECTION_FIELD, FlattenedDocument};

/// Maximum nesting depth the flattener descends into.
pub const MAX_DEPTH: usize = 64;

/// Key fragments that mark rich-text structure.
const SUPPRESSED_FRAGMENTS: [&str; 3] = ["blocks", "nodes", "content"];

/// Suffixes that keep a key despite containing a suppressed fragment.
const EXEMPT_SUFFIXES: [&str; 6] = [
    ".title",
    ".content",
    ".text",
    ".caption",
    ".description",
    ".summary",
];

/// Suffixes of keys whose string values are HTML-stripped.
const HTML_SUFFIXES: [&str; 5] = ["content", "description", "text", "summary", "caption"];

/// Transforms a raw record into a flat, sanitized document.
///
/// # Errors
///
/// * `TransformError::NotAnObject` - The record is not a JSON object
/// * `TransformError::TooDeep` - The record nests deeper than [`MAX_DEPTH`]
pub fn transform(
    record: &Value,
    collection: &str,
    preserve_arrays: bool,
) -> Result<FlattenedDocument, TransformError> {
    let object = record.as_object().ok_or(TransformError::NotAnObject {
        kind: kind_of(record),
    })?;

    let mut document = FlattenedDocument::new();
    flatten_object(object, "", 0, preserve_arrays, &mut document)?;
    sanitize(&mut document);
    document.insert(
        COLLECTION_FIELD.to_string(),
        Value::String(collection.to_string()),
    );

    Ok(document)
}

fn flatten_object(
    object: &Map<String, Value>,
    prefix: &str,
    depth: usize,
    preserve_arrays: bool,
    out: &mut FlattenedDocument,
) -> Result<(), TransformError> {
    if depth > MAX_DEPTH {
        return Err(TransformError::TooDeep {
            path: prefix.to_string(),
            max_depth: MAX_DEPTH,
        });
    }

    for (key, value) in object {
        flatten_value(value, join(prefix, key), depth, preserve_arrays, out)?;
    }
    Ok(())
}

fn flatten_value(
    value: &Value,
    path: String,
    depth: usize,
    preserve_arrays: bool,
    out: &mut FlattenedDocument,
) -> Result<(), TransformError> {
    match value {
        // An empty object is a leaf when flattening everything, and vanishes
        // when only objects are descended into.
        Value::Object(map) if preserve_arrays || !map.is_empty() => {
            flatten_object(map, &path, depth + 1, preserve_arrays, out)
        }
        Value::Array(items) if !preserve_arrays && !items.is_empty() => {
            if depth + 1 > MAX_DEPTH {
                return Err(TransformError::TooDeep {
                    path,
                    max_depth: MAX_DEPTH,
                });
            }
            for (position, item) in items.iter().enumerate() {
                flatten_value(
                    item,
                    join(&path, &position.to_string()),
                    depth + 1,
                    preserve_arrays,
                    out,
                )?;
            }
            Ok(())
        }
        _ => {
            out.insert(path, value.clone());
            Ok(())
        }
    }
}

fn join(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", prefix, key)
    }
}

fn sanitize(document: &mut FlattenedDocument) {
    document.retain(|key, value| {
        if is_suppressed(key) || value.is_null() {
            return false;
        }
        if let Value::String(text) = value {
            if HTML_SUFFIXES.iter().any(|suffix| key.ends_with(suffix)) {
                *text = strip_html(text);
            }
        }
        true
    });
}

/// Returns true if a key carries rich-text structure that should not be indexed.
///
/// The exemption requires a dot before the suffix, so a top-level `content`
/// key is suppressed.
fn is_suppressed(key: &str) -> bool {
    SUPPRESSED_FRAGMENTS
        .iter()
        .any(|fragment| key.contains(fragment))
        && !EXEMPT_SUFFIXES.iter().any(|suffix| key.ends_with(suffix))
}

/// Elements whose contents are dropped along with their tags.
const RAW_TEXT_ELEMENTS: [&str; 3] = ["script", "style", "xml"];

/// Strips HTML tags from a string, returning plain text.
///
/// A `<` only opens a tag when followed by a letter, `/`, `!` or `?`, so
/// comparisons such as `a < b` survive. A `>` inside a quoted attribute value
/// does not close the tag. Comments are removed, and `script`, `style` and
/// `xml` elements are removed with their contents. Whitespace is collapsed.
pub fn strip_html(html: &str) -> String {
    let mut result = String::with_capacity(html.len());
    let mut rest = html;

    while let Some(start) = rest.find('<') {
        let (text, markup) = rest.split_at(start);
        result.push_str(text);

        if !opens_tag(markup) {
            result.push('<');
            rest = &markup[1..];
            continue;
        }

        result.push(' ');
        if let Some(comment) = markup.strip_prefix("<!--") {
            rest = comment.find("-->").map_or("", |end| &comment[end + 3..]);
            continue;
        }

        // An unterminated tag swallows the rest of the input.
        let Some(end) = tag_end(markup) else {
            rest = "";
            break;
        };
        let tag = &markup[1..end];
        rest = &markup[end + 1..];

        if let Some(name) = raw_text_element(tag) {
            rest = skip_raw_text(rest, name);
        }
    }
    result.push_str(rest);

    result.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn opens_tag(markup: &str) -> bool {
    markup[1..]
        .chars()
        .next()
        .is_some_and(|next| next.is_ascii_alphabetic() || matches!(next, '/' | '!' | '?'))
}

/// Byte offset of the `>` closing the tag that starts `markup`.
fn tag_end(markup: &str) -> Option<usize> {
    let mut quote = None;
    for (idx, c) in markup.char_indices().skip(1) {
        match (quote, c) {
            (Some(open), c) if c == open => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '>') => return Some(idx),
            (None, _) => {}
        }
    }
    None
}

/// Returns the element name if `tag` opens a raw-text element.
fn raw_text_element(tag: &str) -> Option<&'static str> {
    if tag.trim_end().ends_with('/') {
        return None;
    }
    let name_len = tag
        .find(|c: char| !c.is_ascii_alphanumeric())
        .unwrap_or(tag.len());
    let name = &tag[..name_len];
    RAW_TEXT_ELEMENTS
        .iter()
        .copied()
        .find(|element| element.eq_ignore_ascii_case(name))
}

/// Skips past the closing tag of `element`.
fn skip_raw_text<'a>(rest: &'a str, element: &str) -> &'a str {
    let lowered = rest.to_ascii_lowercase();
    let Some(close) = lowered.find(&format!("</{}", element)) else {
        return "";
    };
    let after = &rest[close..];
    after.find('>').map_or("", |end| &after[end + 1..])
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
