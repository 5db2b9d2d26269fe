//! Stable multi-key sort.
//!
//! Absent and null keys sort last whatever the direction. Two numbers compare
//! numerically; anything else compares by display text. Records with equal
//! keys keep their input order.

use std::cmp::Ordering;

use serde_json::Value;

use recast_core::path::resolve;
use recast_core::types::{Collection, Record};
use recast_core::value::sort_cmp;

use crate::args;
use crate::traits::{sequence_only, OpContext, OpError, Operator};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub path: String,
    pub descending: bool,
}

impl SortKey {
    /// `"path"`, `"path asc"`, `"path desc"`, or `{field, order}`.
    fn from_config(config: &Value) -> Result<Self, OpError> {
        match config {
            Value::String(s) => {
                let mut parts = s.split_whitespace();
                let path = parts
                    .next()
                    .ok_or_else(|| OpError::Config("sort key must not be empty".into()))?;
                let order = parts.next();
                if parts.next().is_some() {
                    return Err(OpError::Config(format!(
                        "sort key '{s}' must be 'path' or 'path asc|desc'"
                    )));
                }
                Ok(Self {
                    path: path.to_string(),
                    descending: parse_order(order)?,
                })
            }
            Value::Object(map) => {
                let path = args::required_str(map, &["field", "by", "path"])?;
                let order = args::optional_str(map, &["order", "direction"])?;
                Ok(Self {
                    path,
                    descending: parse_order(order.as_deref())?,
                })
            }
            other => Err(OpError::Config(format!(
                "sort key must be a string or a mapping, got {other}"
            ))),
        }
    }
}

fn parse_order(order: Option<&str>) -> Result<bool, OpError> {
    match order.map(str::to_ascii_lowercase).as_deref() {
        None | Some("asc") | Some("ascending") => Ok(false),
        Some("desc") | Some("descending") => Ok(true),
        Some(other) => Err(OpError::Config(format!(
            "sort order must be 'asc' or 'desc', got '{other}'"
        ))),
    }
}

#[derive(Debug, Clone)]
pub struct Sort {
    pub keys: Vec<SortKey>,
}

impl Sort {
    pub fn from_config(config: &Value) -> Result<Self, OpError> {
        let keys = match config {
            Value::Array(items) => items
                .iter()
                .map(SortKey::from_config)
                .collect::<Result<Vec<_>, _>>()?,
            other => vec![SortKey::from_config(other)?],
        };
        if keys.is_empty() {
            return Err(OpError::Config("sort needs at least one key".into()));
        }
        Ok(Self { keys })
    }

    fn compare(&self, a: &Record, b: &Record) -> Ordering {
        for key in &self.keys {
            let ord = match (present(a, &key.path), present(b, &key.path)) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
                (Some(x), Some(y)) => {
                    let ord = sort_cmp(x, y);
                    if key.descending {
                        ord.reverse()
                    } else {
                        ord
                    }
                }
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }
}

fn present<'a>(record: &'a Record, path: &str) -> Option<&'a Value> {
    resolve(record, path).filter(|v| !v.is_null())
}

impl Operator for Sort {
    fn name(&self) -> &'static str {
        "sort"
    }

    fn apply(&self, input: &Collection, ctx: &OpContext<'_>) -> Result<Collection, OpError> {
        sequence_only(self.name(), input, ctx, |records| {
            let mut out = records.to_vec();
            // `sort_by` is stable: ties keep input order.
            out.sort_by(|a, b| self.compare(a, b));
            Ok(out)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::testing::run;
    use serde_json::json;

    #[test]
    fn numeric_ascending_with_missing_last() {
        let op = Sort::from_config(&json!("n")).unwrap();
        let (out, _) = run(
            &op,
            json!([{"n": 10}, {"x": 1}, {"n": 9}, {"n": null}, {"n": 100}]),
        );
        assert_eq!(
            out,
            json!([{"n": 9}, {"n": 10}, {"n": 100}, {"x": 1}, {"n": null}])
        );
    }

    #[test]
    fn descending_keeps_missing_last() {
        let op = Sort::from_config(&json!({"field": "n", "order": "desc"})).unwrap();
        let (out, _) = run(&op, json!([{"n": 1}, {}, {"n": 3}]));
        assert_eq!(out, json!([{"n": 3}, {"n": 1}, {}]));
    }

    #[test]
    fn string_form_with_order() {
        let op = Sort::from_config(&json!("name desc")).unwrap();
        assert_eq!(
            op.keys,
            vec![SortKey {
                path: "name".into(),
                descending: true
            }]
        );
        assert!(Sort::from_config(&json!("name sideways")).is_err());
        assert!(Sort::from_config(&json!("")).is_err());
        assert!(Sort::from_config(&json!([])).is_err());
    }

    #[test]
    fn mixed_types_compare_as_text() {
        let op = Sort::from_config(&json!("v")).unwrap();
        let (out, _) = run(&op, json!([{"v": "b"}, {"v": 10}, {"v": "a"}]));
        assert_eq!(out, json!([{"v": 10}, {"v": "a"}, {"v": "b"}]));
    }

    #[test]
    fn ties_keep_input_order_and_secondary_keys_apply() {
        let op = Sort::from_config(&json!(["team", "score desc"])).unwrap();
        let (out, _) = run(
            &op,
            json!([
                {"team": "b", "score": 1, "id": 1},
                {"team": "a", "score": 1, "id": 2},
                {"team": "a", "score": 5, "id": 3},
                {"team": "a", "score": 1, "id": 4}
            ]),
        );
        let ids: Vec<_> = out
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["id"].clone())
            .collect();
        assert_eq!(ids, vec![json!(3), json!(2), json!(4), json!(1)]);
    }
}
