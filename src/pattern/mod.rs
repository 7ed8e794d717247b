// src/pattern/mod.rs

//! Line patterns with named captures.
//!
//! A pattern is matched against a whole line. The grammar is small:
//!
//! - `{name}` captures any run of characters (possibly empty) as field `name`.
//!   Captures are lazy: `{a} {b}` against `"x y z"` gives `a = "x"`,
//!   `b = "y z"`.
//! - `*` matches any run of characters without capturing.
//! - `?` matches exactly one character.
//! - `\` makes the next character literal (`\{`, `\}`, `\*`, `\?`, `\\`).
//! - Everything else matches itself.
//!
//! Field names follow `[A-Za-z_][A-Za-z0-9_]*` and must be unique within a
//! pattern. Patterns compile down to a [`regex::Regex`].

pub mod interpolate;

use std::collections::BTreeMap;
use std::fmt;

use regex::Regex;

use crate::errors::{LogTriggerError, Result};

pub use interpolate::interpolate;

/// Named fields extracted from one matched line.
pub type Captures = BTreeMap<String, String>;

/// A compiled line pattern.
#[derive(Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
    fields: Vec<String>,
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pattern")
            .field("source", &self.source)
            .field("fields", &self.fields)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl Pattern {
    /// Compile a pattern string.
    ///
    /// Fails on malformed syntax; an empty pattern is rejected as well since it
    /// can only ever match empty lines, which is never what a trigger wants.
    pub fn compile(pattern: &str) -> Result<Self> {
        if pattern.is_empty() {
            return Err(invalid(pattern, "pattern must not be empty"));
        }

        let mut re = String::with_capacity(pattern.len() * 2 + 8);
        re.push_str("^(?s:");
        let mut fields: Vec<String> = Vec::new();

        let mut chars = pattern.chars();
        while let Some(c) = chars.next() {
            match c {
                '\\' => {
                    let escaped = chars
                        .next()
                        .ok_or_else(|| invalid(pattern, "trailing escape character"))?;
                    push_literal(&mut re, escaped);
                }
                '*' => re.push_str(".*?"),
                '?' => re.push('.'),
                '}' => return Err(invalid(pattern, "unmatched '}'")),
                '{' => {
                    let mut name = String::new();
                    let mut closed = false;
                    for n in chars.by_ref() {
                        if n == '}' {
                            closed = true;
                            break;
                        }
                        name.push(n);
                    }
                    if !closed {
                        return Err(invalid(pattern, "unterminated '{'"));
                    }
                    if !is_field_name(&name) {
                        return Err(invalid(
                            pattern,
                            &format!("invalid field name {name:?}"),
                        ));
                    }
                    if fields.contains(&name) {
                        return Err(invalid(
                            pattern,
                            &format!("duplicate field name {name:?}"),
                        ));
                    }
                    re.push_str("(?P<");
                    re.push_str(&name);
                    re.push_str(">.*?)");
                    fields.push(name);
                }
                other => push_literal(&mut re, other),
            }
        }
        re.push_str(")$");

        let regex = Regex::new(&re).map_err(|e| invalid(pattern, &e.to_string()))?;

        Ok(Self {
            source: pattern.to_string(),
            regex,
            fields,
        })
    }

    /// Match a line, returning its captured fields.
    ///
    /// `None` means the line did not match. A pattern without fields yields
    /// `Some` of an empty map on a match.
    pub fn apply(&self, line: &str) -> Option<Captures> {
        let caps = self.regex.captures(line)?;
        let captures = self
            .fields
            .iter()
            .map(|name| {
                let value = caps.name(name).map(|m| m.as_str()).unwrap_or_default();
                (name.clone(), value.to_string())
            })
            .collect();
        Some(captures)
    }

    /// Field names in the order they appear in the pattern.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

/// `[A-Za-z_][A-Za-z0-9_]*`
pub(crate) fn is_field_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn push_literal(re: &mut String, c: char) {
    let mut buf = [0u8; 4];
    re.push_str(&regex::escape(c.encode_utf8(&mut buf)));
}

fn invalid(pattern: &str, reason: &str) -> LogTriggerError {
    LogTriggerError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: reason.to_string(),
    }
}
