//! Deep decode of JSON-encoded aggregate columns.
//!
//! SQLite hands back aggregate columns as text, and an aggregate embedded in
//! another aggregate arrives as a string inside the outer JSON. Decoding is
//! guided by the hierarchy schema: only the children field of each level is
//! parsed, so stored text (titles, names) is never reinterpreted.

use crate::view::hierarchy::HierarchyLevel;
use log::warn;
use serde_json::Value;

/// Parses the children field of every level in `levels`, top-down.
///
/// A children field that is not valid JSON container text is kept as-is for
/// the typed stage to reject.
pub fn unstringify_deep(value: Value, levels: &[HierarchyLevel]) -> Value {
    let Some((level, rest)) = levels.split_first() else {
        return value;
    };
    let Value::Object(mut node) = value else {
        return value;
    };

    if let Some(children) = node.remove(level.children) {
        let children = match decode_container(level.children, children) {
            Value::Array(items) => Value::Array(
                items
                    .into_iter()
                    .map(|child| unstringify_deep(child, rest))
                    .collect(),
            ),
            other => other,
        };
        node.insert(level.children.to_string(), children);
    }
    Value::Object(node)
}

fn decode_container(field: &str, value: Value) -> Value {
    let Value::String(text) = value else {
        return value;
    };
    match serde_json::from_str::<Value>(text.trim()) {
        Ok(parsed @ (Value::Array(_) | Value::Object(_))) => parsed,
        Ok(_) => Value::String(text),
        Err(err) => {
            warn!(
                "event=json_decode module=view status=skipped reason=malformed_fragment field={} len={} line={} column={}",
                field,
                text.len(),
                err.line(),
                err.column()
            );
            Value::String(text)
        }
    }
}
