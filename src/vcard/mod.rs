//! This module handles conversion between vCard text and internal representations
//!
//! Building is done by hand (vCards are simple line-oriented text), parsing relies on the `ical` crate.

mod record;
pub use record::{ContactRecord, Field};
mod builder;
pub use builder::build_from;
mod parser;
pub use parser::{parse, parse_records, split_records, to_source_contact};

/// The vCard version of the records built from source contacts
pub const VCARD_VERSION: &str = "3.0";

/// Escape the characters that have a meaning in a vCard value: backslashes, line breaks, commas and semicolons
pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                escaped.push_str("\\n");
            },
            '\n' => escaped.push_str("\\n"),
            ',' => escaped.push_str("\\,"),
            ';' => escaped.push_str("\\;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// The inverse of [`escape`]
pub fn unescape(text: &str) -> String {
    let mut unescaped = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            unescaped.push(c);
            continue;
        }
        match chars.next() {
            Some('n') | Some('N') => unescaped.push('\n'),
            Some(other) => unescaped.push(other),
            None => unescaped.push('\\'),
        }
    }
    unescaped
}

/// Split an escaped value on every non-escaped `separator`. Components are returned still escaped.
pub(crate) fn split_components(raw: &str, separator: char) -> Vec<String> {
    let mut components = Vec::new();
    let mut current = String::new();
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            current.push(c);
            if let Some(next) = chars.next() {
                current.push(next);
            }
        } else if c == separator {
            components.push(std::mem::take(&mut current));
        } else {
            current.push(c);
        }
    }
    components.push(current);
    components
}
