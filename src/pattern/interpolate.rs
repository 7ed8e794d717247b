// src/pattern/interpolate.rs

use crate::pattern::{is_field_name, Captures};

/// Substitute `{name}` placeholders in `template` with values from `fields`.
///
/// - A placeholder whose field is absent becomes the empty string.
/// - A `{` that does not start a well-formed placeholder is copied as-is, so
///   templates without placeholders come back unchanged.
///
/// Interpolation works on one argument at a time; callers keep arguments as
/// separate elements so a value can never spill into a neighbouring argument.
pub fn interpolate(template: &str, fields: &Captures) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];

        match after.find('}') {
            Some(close) if is_field_name(&after[..close]) => {
                if let Some(value) = fields.get(&after[..close]) {
                    out.push_str(value);
                }
                rest = &after[close + 1..];
            }
            _ => {
                out.push('{');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}
