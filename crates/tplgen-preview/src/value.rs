//! Host-runtime value semantics over JSON data.
//!
//! `None` stands for `undefined`. Property access on a missing or primitive
//! value yields `undefined` rather than throwing.

use serde_json::Value;
use std::cmp::Ordering;
use tplgen_ir::{format_number, CompareOp, Literal, PathSegment};

/// Read `segments` starting from `base`.
pub fn get_path(base: Option<&Value>, segments: &[PathSegment]) -> Option<Value> {
    let mut current = base?;
    for (i, segment) in segments.iter().enumerate() {
        match segment {
            PathSegment::Key(key) => current = current.as_object()?.get(key.as_str())?,
            PathSegment::Index(index) => current = current.as_array()?.get(*index as usize)?,
            PathSegment::Length if i + 1 == segments.len() => return length(current),
            PathSegment::Length => return None,
        }
    }
    Some(current.clone())
}

/// `.length` of an array or string; strings count UTF-16 units.
pub fn length(value: &Value) -> Option<Value> {
    match value {
        Value::Array(items) => Some(Value::from(items.len())),
        Value::String(s) => Some(Value::from(s.encode_utf16().count())),
        _ => None,
    }
}

/// Truthiness: `undefined`, `null`, `false`, `0`, `NaN` and `""` are falsy.
pub fn truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

/// Whether a value is nullish (`undefined` or `null`), the `??` test.
pub fn is_nullish(value: Option<&Value>) -> bool {
    matches!(value, None | Some(Value::Null))
}

/// Convert a literal to a value.
pub fn literal(lit: &Literal) -> Value {
    lit.to_json()
}

/// `ToNumber`.
pub fn to_number(value: Option<&Value>) -> f64 {
    match value {
        None => f64::NAN,
        Some(Value::Null) => 0.0,
        Some(Value::Bool(b)) => f64::from(u8::from(*b)),
        Some(Value::Number(n)) => n.as_f64().unwrap_or(f64::NAN),
        Some(Value::String(s)) => {
            let s = s.trim();
            if s.is_empty() {
                0.0
            } else {
                s.parse().unwrap_or(f64::NAN)
            }
        }
        Some(Value::Array(items)) if items.is_empty() => 0.0,
        Some(Value::Array(_)) | Some(Value::Object(_)) => f64::NAN,
    }
}

/// `String(value)`.
pub fn to_string(value: Option<&Value>) -> String {
    match value {
        None => "undefined".to_string(),
        Some(Value::Null) => "null".to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Number(n)) => number_text(n),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                item => to_string(Some(item)),
            })
            .collect::<Vec<_>>()
            .join(","),
        Some(Value::Object(_)) => "[object Object]".to_string(),
    }
}

fn number_text(n: &serde_json::Number) -> String {
    match (n.as_i64(), n.as_f64()) {
        (Some(i), _) => i.to_string(),
        (None, Some(f)) => format_number(f),
        (None, None) => n.to_string(),
    }
}

/// `===`
pub fn strict_equals(left: Option<&Value>, right: Option<&Value>) -> bool {
    match (left, right) {
        (None, None) => true,
        (Some(Value::Null), Some(Value::Null)) => true,
        (Some(Value::Bool(a)), Some(Value::Bool(b))) => a == b,
        (Some(Value::Number(a)), Some(Value::Number(b))) => a.as_f64() == b.as_f64(),
        (Some(Value::String(a)), Some(Value::String(b))) => a == b,
        // Arrays and objects compare by identity; data never aliases.
        _ => false,
    }
}

/// Evaluate a comparison.
pub fn compare(op: CompareOp, left: Option<&Value>, right: Option<&Value>) -> bool {
    match op {
        CompareOp::Eq => return strict_equals(left, right),
        CompareOp::Ne => return !strict_equals(left, right),
        _ => {}
    }
    let ordering = match (left, right) {
        (Some(Value::String(a)), Some(Value::String(b))) => Some(a.encode_utf16().cmp(b.encode_utf16())),
        _ => to_number(left).partial_cmp(&to_number(right)),
    };
    let Some(ordering) = ordering else {
        return false;
    };
    match op {
        CompareOp::Lt => ordering == Ordering::Less,
        CompareOp::Le => ordering != Ordering::Greater,
        CompareOp::Gt => ordering == Ordering::Greater,
        CompareOp::Ge => ordering != Ordering::Less,
        CompareOp::Eq | CompareOp::Ne => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tplgen_ir::GenPath;

    #[test]
    fn test_get_path() {
        let data = json!({ "items": [{ "name": "a" }, { "name": "bé" }] });
        let get = |p: &str| get_path(Some(&data), &GenPath::parse(p).segments);
        assert_eq!(get("items.1.name"), Some(json!("bé")));
        assert_eq!(get("items.length"), Some(json!(2)));
        assert_eq!(get("items.1.name.length"), Some(json!(2)));
        assert_eq!(get("items.5.name"), None);
        assert_eq!(get("missing.deep"), None);
    }

    #[test]
    fn test_truthiness() {
        for falsy in [json!(null), json!(false), json!(0), json!(0.0), json!("")] {
            assert!(!truthy(Some(&falsy)), "{}", falsy);
        }
        assert!(!truthy(None));
        for value in [json!(true), json!(-1), json!("0"), json!([]), json!({})] {
            assert!(truthy(Some(&value)), "{}", value);
        }
    }

    #[test]
    fn test_comparison() {
        assert!(compare(CompareOp::Eq, Some(&json!(1)), Some(&json!(1.0))));
        assert!(!compare(CompareOp::Eq, Some(&json!("1")), Some(&json!(1))));
        assert!(!compare(CompareOp::Eq, Some(&json!(null)), None));
        assert!(compare(CompareOp::Gt, Some(&json!("10")), Some(&json!(9))));
        assert!(compare(CompareOp::Lt, Some(&json!("10")), Some(&json!("9"))));
        assert!(!compare(CompareOp::Ge, None, Some(&json!(0))));
    }

    #[test]
    fn test_to_string() {
        assert_eq!(to_string(Some(&json!(3.0))), "3");
        assert_eq!(to_string(Some(&json!(1.5))), "1.5");
        assert_eq!(to_string(Some(&json!([1, null, "x"]))), "1,,x");
        assert_eq!(to_number(Some(&json!(" 42 "))), 42.0);
    }
}
