//! Response-shape normalization
//!
//! The remote service reports some response fields as a single object when
//! there is exactly one item and as a list otherwise. An allow-list of fields
//! is forced to list shape here, at a single boundary, so no call site has to
//! care about cardinality.

use serde_json::Value;

/// Fields normalized to list shape, as paths from the response root
const LIST_FIELDS: &[&[&str]] = &[
    &["details", "componentFailures"],
    &["details", "componentSuccesses"],
    &["details", "runTestResult", "codeCoverageWarnings"],
];

/// Normalize a raw deploy response.
///
/// Pure and total: a present-but-scalar field is wrapped in a one-element
/// list, an already-list field passes through unchanged, an absent field
/// stays absent. No empty lists are synthesized.
pub fn normalize(mut raw: Value) -> Value {
    for path in LIST_FIELDS {
        ensure_list(&mut raw, path);
    }
    raw
}

fn ensure_list(value: &mut Value, path: &[&str]) {
    let Some((last, parents)) = path.split_last() else {
        return;
    };

    let mut cursor = value;
    for key in parents {
        match cursor.get_mut(*key) {
            Some(next) => cursor = next,
            None => return,
        }
    }

    let Some(field) = cursor.get_mut(*last) else {
        return;
    };
    if field.is_null() || field.is_array() {
        return;
    }

    let item = field.take();
    *field = Value::Array(vec![item]);
}
