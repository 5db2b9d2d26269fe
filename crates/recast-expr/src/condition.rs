//! Condition grammar for `filter` and `if`: `<path> <operator> <literal>`.
//!
//! Operators: `==`, `!=`, `>`, `<`, `>=`, `<=`, `contains`, `startswith`,
//! `endswith`. The operator is the earliest one found in the string; when two
//! start at the same offset the longer symbol wins (`>=` over `>`). Word
//! operators must be surrounded by whitespace and match in any case.
//!
//! Literals lose one pair of surrounding `'` or `"` quotes. Unquoted `null`,
//! `true`, `false`, and numeric-looking tokens are coerced before comparing;
//! quoted literals always stay strings.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use recast_core::path::resolve;
use recast_core::types::Record;
use recast_core::value::{compare_ordered, display, loose_eq, number, parse_number};

use crate::error::ExprError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Lt,
    Ge,
    Le,
    Contains,
    StartsWith,
    EndsWith,
}

/// Scan order; multi-character symbols precede their prefixes.
const OPERATORS: [(&str, CompareOp); 9] = [
    (">=", CompareOp::Ge),
    ("<=", CompareOp::Le),
    ("==", CompareOp::Eq),
    ("!=", CompareOp::Ne),
    (">", CompareOp::Gt),
    ("<", CompareOp::Lt),
    (" contains ", CompareOp::Contains),
    (" startswith ", CompareOp::StartsWith),
    (" endswith ", CompareOp::EndsWith),
];

impl CompareOp {
    pub fn as_str(self) -> &'static str {
        match self {
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
            CompareOp::Gt => ">",
            CompareOp::Lt => "<",
            CompareOp::Ge => ">=",
            CompareOp::Le => "<=",
            CompareOp::Contains => "contains",
            CompareOp::StartsWith => "startswith",
            CompareOp::EndsWith => "endswith",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub path: String,
    pub op: CompareOp,
    pub literal: Value,
}

impl Condition {
    /// Parse a condition string.
    pub fn parse(src: &str) -> Result<Self, ExprError> {
        // Pad so a trailing word operator with an empty literal still matches.
        let padded = format!("{src} ");
        // ASCII lowering keeps byte offsets aligned with `padded`.
        let lowered = padded.to_ascii_lowercase();

        let mut found: Option<(usize, &str, CompareOp)> = None;
        for (symbol, op) in OPERATORS {
            if let Some(pos) = lowered.find(symbol) {
                if found.map_or(true, |(best, _, _)| pos < best) {
                    found = Some((pos, symbol, op));
                }
            }
        }

        let Some((pos, symbol, op)) = found else {
            return Err(ExprError::Syntax(format!(
                "no comparison operator in condition '{src}'"
            )));
        };

        let path = padded[..pos].trim();
        if path.is_empty() {
            return Err(ExprError::Syntax(format!(
                "missing field path in condition '{src}'"
            )));
        }
        let literal = parse_literal(&padded[pos + symbol.len()..]);

        Ok(Condition {
            path: path.to_string(),
            op,
            literal,
        })
    }

    /// Evaluate against one record.
    pub fn evaluate(&self, record: &Record) -> bool {
        let field = resolve(record, &self.path);
        let literal = Some(&self.literal);
        match self.op {
            CompareOp::Eq => loose_eq(field, literal),
            CompareOp::Ne => !loose_eq(field, literal),
            CompareOp::Gt => compare_ordered(field, literal) == Some(Ordering::Greater),
            CompareOp::Lt => compare_ordered(field, literal) == Some(Ordering::Less),
            CompareOp::Ge => matches!(
                compare_ordered(field, literal),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            CompareOp::Le => matches!(
                compare_ordered(field, literal),
                Some(Ordering::Less | Ordering::Equal)
            ),
            CompareOp::Contains => self.text_test(field, |hay, needle| hay.contains(needle)),
            CompareOp::StartsWith => self.text_test(field, |hay, needle| hay.starts_with(needle)),
            CompareOp::EndsWith => self.text_test(field, |hay, needle| hay.ends_with(needle)),
        }
    }

    fn text_test(&self, field: Option<&Value>, test: impl Fn(&str, &str) -> bool) -> bool {
        let needle = display(&self.literal).to_lowercase();
        match field {
            None | Some(Value::Null) => false,
            Some(Value::Array(items)) if self.op == CompareOp::Contains => items
                .iter()
                .any(|item| display(item).to_lowercase() == needle),
            Some(v) => test(&display(v).to_lowercase(), &needle),
        }
    }
}

impl FromStr for Condition {
    type Err = ExprError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Condition::parse(s)
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.path, self.op.as_str(), self.literal)
    }
}

fn parse_literal(raw: &str) -> Value {
    let t = raw.trim();
    for quote in ['\'', '"'] {
        if t.len() >= 2 && t.starts_with(quote) && t.ends_with(quote) {
            return Value::String(t[1..t.len() - 1].to_string());
        }
    }
    match t {
        "null" => Value::Null,
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => parse_number(t)
            .and_then(number)
            .unwrap_or_else(|| Value::String(t.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn check(cond: &str, record: Value) -> bool {
        Condition::parse(cond)
            .unwrap()
            .evaluate(record.as_object().unwrap())
    }

    #[test]
    fn parses_operator_and_literal() {
        let c = Condition::parse("age >= 18").unwrap();
        assert_eq!(c.path, "age");
        assert_eq!(c.op, CompareOp::Ge);
        assert_eq!(c.literal, json!(18));

        let c = Condition::parse("status == 'active'").unwrap();
        assert_eq!(c.literal, json!("active"));

        let c = Condition::parse(r#"code == "42""#).unwrap();
        assert_eq!(c.literal, json!("42"));

        let c = Condition::parse("deleted == null").unwrap();
        assert_eq!(c.literal, Value::Null);
    }

    #[test]
    fn earliest_operator_wins() {
        let c = Condition::parse("note == 'a>b'").unwrap();
        assert_eq!(c.op, CompareOp::Eq);
        assert_eq!(c.literal, json!("a>b"));

        let c = Condition::parse("title contains '=='").unwrap();
        assert_eq!(c.op, CompareOp::Contains);
    }

    #[test]
    fn word_operators_ignore_case() {
        let c = Condition::parse("name StartsWith Al").unwrap();
        assert_eq!(c.op, CompareOp::StartsWith);
        assert_eq!(c.literal, json!("Al"));
    }

    #[test]
    fn malformed_conditions_name_the_input() {
        let err = Condition::parse("status active").unwrap_err();
        assert!(err.to_string().contains("status active"));
        assert!(Condition::parse("== 5").is_err());
        assert!(Condition::parse("a = 5").is_err());
    }

    #[test]
    fn loose_equality_matches_across_types() {
        assert!(check("n == 5", json!({"n": "5"})));
        assert!(check("n == '5'", json!({"n": 5})));
        assert!(check("flag == true", json!({"flag": true})));
        assert!(check("flag == true", json!({"flag": "true"})));
        assert!(check("gone == null", json!({})));
        assert!(check("gone == null", json!({"gone": null})));
        assert!(!check("gone != null", json!({})));
        assert!(check("n != 6", json!({"n": 5})));
    }

    #[test]
    fn ordering_on_incompatible_types_is_false() {
        assert!(check("age > 17", json!({"age": 30})));
        assert!(check("age > 17", json!({"age": "30"})));
        assert!(!check("age > 17", json!({"age": "thirty"})));
        assert!(!check("age < 17", json!({"age": "thirty"})));
        assert!(!check("age > 17", json!({})));
        assert!(!check("age >= 0", json!({"age": null})));
        assert!(check("name < m", json!({"name": "alice"})));
        assert!(check("age <= 30", json!({"age": 30})));
    }

    #[test]
    fn text_operators_are_case_insensitive() {
        assert!(check("email endswith @EXAMPLE.com", json!({"email": "a@example.COM"})));
        assert!(check("name contains LIC", json!({"name": "Alice"})));
        assert!(check("code startswith 12", json!({"code": 12345})));
        assert!(!check("name contains x", json!({"name": null})));
        assert!(!check("name contains x", json!({})));
    }

    #[test]
    fn contains_checks_array_members() {
        assert!(check("tags contains VIP", json!({"tags": ["new", "vip"]})));
        assert!(!check("tags contains vi", json!({"tags": ["new", "vip"]})));
    }

    #[test]
    fn nested_paths_resolve() {
        assert!(check("user.city == Oslo", json!({"user": {"city": "Oslo"}})));
    }
}
