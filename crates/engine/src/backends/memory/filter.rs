//! Evaluation of Directus-style filters against JSON records.
//!
//! Supports field conditions with the operators `_eq`, `_neq`, `_in`,
//! `_nin`, `_null`, `_nnull`, `_gt`, `_gte`, `_lt`, `_lte`, `_contains`,
//! `_ncontains`, `_starts_with`, `_ends_with`, `_empty` and `_nempty`, the
//! logical groups `_and` and `_or`, and nested field paths
//! (`{"author": {"name": {"_eq": "Ada"}}}`). Unknown operators never match.

use std::cmp::Ordering;

use serde_json::Value;

/// Returns true if `record` satisfies `filter`.
pub fn matches(record: &Value, filter: &Value) -> bool {
    let Some(conditions) = filter.as_object() else {
        return false;
    };

    conditions.iter().all(|(key, condition)| match key.as_str() {
        "_and" => condition
            .as_array()
            .is_some_and(|parts| parts.iter().all(|part| matches(record, part))),
        "_or" => condition
            .as_array()
            .is_some_and(|parts| parts.iter().any(|part| matches(record, part))),
        field => {
            let value = record.get(field).unwrap_or(&Value::Null);
            field_matches(value, condition)
        }
    })
}

fn field_matches(value: &Value, condition: &Value) -> bool {
    let Some(entries) = condition.as_object() else {
        return false;
    };

    entries.iter().all(|(key, operand)| {
        if key.starts_with('_') {
            apply(key, value, operand)
        } else {
            let nested = value.get(key).unwrap_or(&Value::Null);
            field_matches(nested, operand)
        }
    })
}

fn apply(operator: &str, value: &Value, operand: &Value) -> bool {
    match operator {
        "_eq" => loose_eq(value, operand),
        "_neq" => !loose_eq(value, operand),
        "_in" => operand
            .as_array()
            .is_some_and(|items| items.iter().any(|item| loose_eq(value, item))),
        "_nin" => !operand
            .as_array()
            .is_some_and(|items| items.iter().any(|item| loose_eq(value, item))),
        "_null" => value.is_null() == truthy(operand),
        "_nnull" => !value.is_null() == truthy(operand),
        "_gt" => compare(value, operand) == Some(Ordering::Greater),
        "_gte" => matches!(
            compare(value, operand),
            Some(Ordering::Greater | Ordering::Equal)
        ),
        "_lt" => compare(value, operand) == Some(Ordering::Less),
        "_lte" => matches!(
            compare(value, operand),
            Some(Ordering::Less | Ordering::Equal)
        ),
        "_contains" => contains(value, operand),
        "_ncontains" => !contains(value, operand),
        "_starts_with" => with_strings(value, operand, |v, o| v.starts_with(o)),
        "_ends_with" => with_strings(value, operand, |v, o| v.ends_with(o)),
        "_empty" => is_empty(value) == truthy(operand),
        "_nempty" => !is_empty(value) == truthy(operand),
        _ => false,
    }
}

/// Equality that treats `5` and `"5"` as equal.
fn loose_eq(value: &Value, operand: &Value) -> bool {
    match (value, operand) {
        (Value::Number(a), Value::String(b)) | (Value::String(b), Value::Number(a)) => {
            a.to_string() == *b
        }
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        _ => value == operand,
    }
}

fn compare(value: &Value, operand: &Value) -> Option<Ordering> {
    match (value, operand) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::Number(a), Value::String(b)) => a.as_f64()?.partial_cmp(&b.parse::<f64>().ok()?),
        (Value::String(a), Value::Number(b)) => a.parse::<f64>().ok()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

fn contains(value: &Value, operand: &Value) -> bool {
    match value {
        Value::String(text) => operand.as_str().is_some_and(|needle| text.contains(needle)),
        Value::Array(items) => items.iter().any(|item| loose_eq(item, operand)),
        _ => false,
    }
}

fn with_strings(value: &Value, operand: &Value, test: impl Fn(&str, &str) -> bool) -> bool {
    match (value.as_str(), operand.as_str()) {
        (Some(v), Some(o)) => test(v, o),
        _ => false,
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

/// Directus accepts `true`, `"true"` and `1` as boolean operands.
fn truthy(operand: &Value) -> bool {
    match operand {
        Value::Bool(b) => *b,
        Value::String(s) => s == "true" || s == "1",
        Value::Number(n) => n.as_i64() == Some(1),
        _ => false,
    }
}
