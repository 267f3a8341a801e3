//! Canonical filters as the host runtime applies them.

use crate::value::{to_number, to_string};
use serde_json::Value;

/// Apply a canonical filter. Returns `None` for an unknown filter name.
///
/// `undefined` and `null` filter to the empty string, except under `json`.
pub fn apply(name: &str, value: Option<&Value>) -> Option<String> {
    if name == "json" {
        return Some(match value {
            None => String::new(),
            Some(value) => value.to_string(),
        });
    }
    if !matches!(name, "currency" | "upper" | "lower" | "capitalize" | "trim") {
        return None;
    }
    if matches!(value, None | Some(Value::Null)) {
        return Some(String::new());
    }

    let text = to_string(value);
    Some(match name {
        "currency" => currency(to_number(value)),
        "upper" => text.to_uppercase(),
        "lower" => text.to_lowercase(),
        "capitalize" => capitalize(&text),
        _ => text.trim().to_string(),
    })
}

/// `$1,234.50`, `-$3.00`. `NaN` formats as the empty string.
pub fn currency(amount: f64) -> String {
    if !amount.is_finite() {
        return String::new();
    }
    let cents = (amount.abs() * 100.0).round() as u64;
    let (whole, frac) = (cents / 100, cents % 100);

    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    format!("{}${}.{:02}", sign, grouped, frac)
}

/// First character upper-cased, the rest lower-cased.
fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
