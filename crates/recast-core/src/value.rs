//! Coercion, comparison, and display helpers over JSON values.
//!
//! Every operator that has to decide "is this a number", "are these equal",
//! or "what does this look like as text" goes through this module so the
//! answers stay consistent across the pipeline. `None` stands for an absent
//! field throughout.

use std::cmp::Ordering;

use serde_json::{Number, Value};

/// Largest integer a float64 represents exactly.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Store a float64 result as a JSON number.
///
/// Integral results within the exactly-representable range become integer
/// numbers so `10 + 5` serialises as `15`, not `15.0`. Non-finite input yields
/// `None`.
pub fn number(f: f64) -> Option<Value> {
    if !f.is_finite() {
        return None;
    }
    if f.fract() == 0.0 && f.abs() <= MAX_SAFE_INTEGER {
        return Some(Value::from(f as i64));
    }
    Number::from_f64(f).map(Value::Number)
}

/// Parse a string as a finite float, ignoring surrounding whitespace.
pub fn parse_number(s: &str) -> Option<f64> {
    let t = s.trim();
    if t.is_empty() {
        return None;
    }
    t.parse::<f64>().ok().filter(|f| f.is_finite())
}

/// Numeric view of a value: JSON numbers and numeric strings qualify.
pub fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_number(s),
        _ => None,
    }
}

/// Text form used when a value is joined, padded, masked, or looked up.
///
/// Null renders empty; containers render as compact JSON.
pub fn display(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => display_number(n),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Like [`display`], but an absent value renders empty too.
pub fn display_opt(value: Option<&Value>) -> String {
    value.map(display).unwrap_or_default()
}

fn display_number(n: &Number) -> String {
    if n.is_f64() {
        if let Some(f) = n.as_f64() {
            return format_f64(f);
        }
    }
    n.to_string()
}

/// Render a float without a trailing `.0` when it is integral.
pub fn format_f64(f: f64) -> String {
    if f.fract() == 0.0 && f.abs() <= MAX_SAFE_INTEGER {
        format!("{}", f as i64)
    } else {
        format!("{f}")
    }
}

/// Absent, null, and the empty string all count as blank.
pub fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}

/// Loose equality used by the condition grammar.
///
/// Absent and null are interchangeable and equal only to each other. Numbers
/// compare against numeric strings numerically, booleans against
/// `"true"`/`"false"` (any case) and against `1`/`0`. Containers compare
/// structurally. Every other mixed pair is unequal.
pub fn loose_eq(a: Option<&Value>, b: Option<&Value>) -> bool {
    let a = a.unwrap_or(&Value::Null);
    let b = b.unwrap_or(&Value::Null);
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Null, _) | (_, Value::Null) => false,
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        (Value::Number(n), Value::String(s)) | (Value::String(s), Value::Number(n)) => {
            parse_number(s).is_some() && parse_number(s) == n.as_f64()
        }
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Bool(flag), Value::String(s)) | (Value::String(s), Value::Bool(flag)) => {
            s.trim()
                .eq_ignore_ascii_case(if *flag { "true" } else { "false" })
        }
        (Value::Bool(flag), Value::Number(n)) | (Value::Number(n), Value::Bool(flag)) => {
            n.as_f64() == Some(if *flag { 1.0 } else { 0.0 })
        }
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Array(_), Value::Array(_)) | (Value::Object(_), Value::Object(_)) => {
            structural_eq(a, b)
        }
        _ => false,
    }
}

/// Deep equality where numbers compare by float value (`1 == 1.0`).
pub fn structural_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| structural_eq(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(k, x)| ys.get(k).is_some_and(|y| structural_eq(x, y)))
        }
        _ => a == b,
    }
}

/// Ordering used by `>`, `<`, `>=`, `<=` in conditions.
///
/// Two numeric-coercible operands compare numerically; two strings that are
/// not both numeric compare by code point. Every other pairing (null, absent,
/// booleans, containers, number vs non-numeric string) has no ordering and
/// the comparison evaluates false.
pub fn compare_ordered(a: Option<&Value>, b: Option<&Value>) -> Option<Ordering> {
    let (a, b) = (a?, b?);
    match (a, b) {
        (Value::String(x), Value::String(y)) => match (parse_number(x), parse_number(y)) {
            (Some(fx), Some(fy)) => fx.partial_cmp(&fy),
            _ => Some(x.cmp(y)),
        },
        (Value::Number(_) | Value::String(_), Value::Number(_) | Value::String(_)) => {
            as_number(a)?.partial_cmp(&as_number(b)?)
        }
        _ => None,
    }
}

/// Ordering used by `sort` between two present, non-null values: numeric for
/// two numbers, otherwise lexicographic over the display form.
pub fn sort_cmp(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(fx), Some(fy)) => fx.partial_cmp(&fy).unwrap_or(Ordering::Equal),
            _ => Ordering::Equal,
        },
        _ => display(a).cmp(&display(b)),
    }
}

/// Truthiness for boolean formatting.
///
/// Strings such as `"false"`, `"0"`, `"no"`, and `"off"` are false so that
/// text-sourced flags behave like their boolean counterparts.
pub fn truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => {
            let t = s.trim().to_ascii_lowercase();
            !matches!(t.as_str(), "" | "false" | "0" | "no" | "n" | "off")
        }
        Some(Value::Array(_) | Value::Object(_)) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn integral_floats_normalise_to_integers() {
        assert_eq!(number(15.0), Some(json!(15)));
        assert_eq!(number(2.5), Some(json!(2.5)));
        assert_eq!(number(f64::NAN), None);
        assert_eq!(number(f64::INFINITY), None);
    }

    #[test]
    fn display_forms() {
        assert_eq!(display(&json!(null)), "");
        assert_eq!(display(&json!(true)), "true");
        assert_eq!(display(&json!(3.0)), "3");
        assert_eq!(display(&json!(3.25)), "3.25");
        assert_eq!(display(&json!("x")), "x");
        assert_eq!(display(&json!([1, "a"])), r#"[1,"a"]"#);
    }

    #[test]
    fn loose_equality_table() {
        let eq = |a: Value, b: Value| loose_eq(Some(&a), Some(&b));
        // null / absent
        assert!(loose_eq(None, None));
        assert!(loose_eq(None, Some(&json!(null))));
        assert!(!loose_eq(None, Some(&json!(0))));
        assert!(!eq(json!(null), json!("")));
        // number / number, number / string
        assert!(eq(json!(5), json!(5.0)));
        assert!(eq(json!("5"), json!(5)));
        assert!(eq(json!(5), json!(" 5 ")));
        assert!(!eq(json!(5), json!("five")));
        // booleans
        assert!(eq(json!(true), json!(true)));
        assert!(eq(json!(true), json!("TRUE")));
        assert!(!eq(json!(false), json!("true")));
        assert!(eq(json!(true), json!(1)));
        assert!(eq(json!(0), json!(false)));
        // strings
        assert!(eq(json!("a"), json!("a")));
        assert!(!eq(json!("a"), json!("A")));
        // containers
        assert!(eq(json!([1, 2]), json!([1.0, 2])));
        assert!(eq(json!({"a": 1, "b": 2}), json!({"b": 2, "a": 1})));
        assert!(!eq(json!([1]), json!(1)));
        assert!(!eq(json!({"a": 1}), json!("a")));
    }

    #[test]
    fn ordering_table() {
        let cmp = |a: Value, b: Value| compare_ordered(Some(&a), Some(&b));
        assert_eq!(cmp(json!(2), json!(10)), Some(Ordering::Less));
        assert_eq!(cmp(json!("10"), json!(9)), Some(Ordering::Greater));
        assert_eq!(cmp(json!("10"), json!("9")), Some(Ordering::Greater));
        assert_eq!(cmp(json!("apple"), json!("banana")), Some(Ordering::Less));
        assert_eq!(cmp(json!(5), json!("abc")), None);
        assert_eq!(cmp(json!(true), json!(1)), None);
        assert_eq!(cmp(json!(null), json!(1)), None);
        assert_eq!(compare_ordered(None, Some(&json!(1))), None);
        assert_eq!(cmp(json!([1]), json!([2])), None);
    }

    #[test]
    fn truthiness() {
        assert!(truthy(Some(&json!(true))));
        assert!(truthy(Some(&json!("yes"))));
        assert!(!truthy(Some(&json!("No"))));
        assert!(!truthy(Some(&json!(0))));
        assert!(!truthy(None));
    }

    #[test]
    fn blank_detection() {
        assert!(is_blank(None));
        assert!(is_blank(Some(&json!(null))));
        assert!(is_blank(Some(&json!(""))));
        assert!(!is_blank(Some(&json!(" "))));
        assert!(!is_blank(Some(&json!(0))));
    }
}
