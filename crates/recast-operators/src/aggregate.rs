//! Aggregation engine shared by `group` and `summarize`.
//!
//! Numeric functions (`sum`, `avg`, `min`, `max`) only see values that are
//! numbers or numeric strings; everything else in the partition is skipped.
//! `sum` of nothing is 0; `avg`, `min`, `max` of nothing are null.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use recast_core::hash::GroupKey;
use recast_core::path::resolve;
use recast_core::types::{kind_name, Record};
use recast_core::value::{as_number, display, number};

use crate::args;
use crate::traits::OpError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggFn {
    Sum,
    Avg,
    Count,
    Min,
    Max,
    First,
    Last,
    /// Join display forms with the engine's list separator.
    List,
}

impl AggFn {
    pub fn as_str(self) -> &'static str {
        match self {
            AggFn::Sum => "sum",
            AggFn::Avg => "avg",
            AggFn::Count => "count",
            AggFn::Min => "min",
            AggFn::Max => "max",
            AggFn::First => "first",
            AggFn::Last => "last",
            AggFn::List => "list",
        }
    }
}

impl FromStr for AggFn {
    type Err = OpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "sum" => AggFn::Sum,
            "avg" | "average" | "mean" => AggFn::Avg,
            "count" => AggFn::Count,
            "min" => AggFn::Min,
            "max" => AggFn::Max,
            "first" => AggFn::First,
            "last" => AggFn::Last,
            "list" | "concat" => AggFn::List,
            other => {
                return Err(OpError::Config(format!(
                    "unknown aggregate operation '{other}'"
                )))
            }
        })
    }
}

impl fmt::Display for AggFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One named aggregate: `total: {op: sum, field: amt}`.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregationSpec {
    pub name: String,
    pub func: AggFn,
    /// Only `count` may omit the field; it then counts records.
    pub field: Option<String>,
}

impl AggregationSpec {
    /// Accepts `{op|operation, field|sourceField}` or a bare operation name.
    /// `default_field` stands in for a missing field.
    pub fn from_config(
        name: &str,
        config: &Value,
        default_field: Option<&str>,
    ) -> Result<Self, OpError> {
        let (func, field) = match config {
            Value::String(op) => (op.parse::<AggFn>()?, default_field.map(str::to_string)),
            Value::Object(map) => {
                let func = args::required_str(map, &["op", "operation", "fn"])?.parse::<AggFn>()?;
                let field = args::optional_str(map, &["field", "sourceField", "source"])?;
                // `{op: count}` with no field counts records.
                let field = match func {
                    AggFn::Count => field,
                    _ => field.or_else(|| default_field.map(str::to_string)),
                };
                (func, field)
            }
            other => {
                return Err(OpError::Config(format!(
                    "aggregation '{name}' must be an operation name or a mapping, got {}",
                    kind_name(other)
                )))
            }
        };
        if field.is_none() && func != AggFn::Count {
            return Err(OpError::Config(format!(
                "aggregation '{name}' ({func}) needs a field"
            )));
        }
        Ok(Self {
            name: name.to_string(),
            func,
            field,
        })
    }

    /// Reduce a partition to one value.
    pub fn reduce(&self, partition: &[&Record], list_separator: &str) -> Value {
        let Some(field) = self.field.as_deref() else {
            return Value::from(partition.len());
        };
        let mut values = partition.iter().map(|r| resolve(r, field));
        match self.func {
            AggFn::Count => Value::from(values.filter(Option::is_some).count()),
            AggFn::First => values.next().flatten().cloned().unwrap_or(Value::Null),
            AggFn::Last => values.last().flatten().cloned().unwrap_or(Value::Null),
            AggFn::List => {
                let parts: Vec<String> = values
                    .flatten()
                    .filter(|v| !v.is_null())
                    .map(display)
                    .collect();
                Value::String(parts.join(list_separator))
            }
            AggFn::Sum | AggFn::Avg | AggFn::Min | AggFn::Max => {
                let nums: Vec<f64> = values.flatten().filter_map(as_number).collect();
                numeric(self.func, &nums)
            }
        }
    }
}

fn numeric(func: AggFn, nums: &[f64]) -> Value {
    let result = match func {
        AggFn::Sum => Some(nums.iter().sum()),
        AggFn::Avg if nums.is_empty() => None,
        AggFn::Avg => Some(nums.iter().sum::<f64>() / nums.len() as f64),
        AggFn::Min => nums.iter().copied().reduce(f64::min),
        AggFn::Max => nums.iter().copied().reduce(f64::max),
        _ => None,
    };
    result.and_then(number).unwrap_or(Value::Null)
}

/// Partition `records` by the values at `by`, in first-seen key order, and
/// emit one record per partition: the grouping fields, `_count`, then each
/// aggregate.
pub fn group_records(
    records: &[Record],
    by: &[String],
    aggregations: &[AggregationSpec],
    list_separator: &str,
) -> Vec<Record> {
    let mut index: HashMap<GroupKey, usize> = HashMap::new();
    let mut partitions: Vec<Vec<&Record>> = Vec::new();
    for record in records {
        let values: Vec<Option<&Value>> = by.iter().map(|p| resolve(record, p)).collect();
        let slot = *index
            .entry(GroupKey::from_values(&values))
            .or_insert_with(|| {
                partitions.push(Vec::new());
                partitions.len() - 1
            });
        partitions[slot].push(record);
    }

    partitions
        .iter()
        .map(|partition| {
            let mut out = Record::new();
            // non-empty by construction
            if let Some(head) = partition.first() {
                for path in by {
                    let v = resolve(head, path).cloned().unwrap_or(Value::Null);
                    out.insert(path.clone(), v);
                }
            }
            out.insert("_count".into(), Value::from(partition.len()));
            for agg in aggregations {
                out.insert(agg.name.clone(), agg.reduce(partition, list_separator));
            }
            out
        })
        .collect()
}

/// One record of aggregates over the whole input, after the `label` fields.
pub fn summarize_records(
    records: &[Record],
    aggregations: &[AggregationSpec],
    label: &Record,
    list_separator: &str,
) -> Record {
    let all: Vec<&Record> = records.iter().collect();
    let mut out = label.clone();
    for agg in aggregations {
        out.insert(agg.name.clone(), agg.reduce(&all, list_separator));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rows(v: Value) -> Vec<Record> {
        v.as_array()
            .unwrap()
            .iter()
            .map(|r| r.as_object().unwrap().clone())
            .collect()
    }

    fn spec(name: &str, op: &str, field: Option<&str>) -> AggregationSpec {
        AggregationSpec {
            name: name.into(),
            func: op.parse().unwrap(),
            field: field.map(str::to_string),
        }
    }

    #[test]
    fn groups_in_first_seen_order() {
        let input = rows(json!([
            {"cat": "x", "amt": 10},
            {"cat": "y", "amt": 2},
            {"cat": "x", "amt": 5}
        ]));
        let out = group_records(
            &input,
            &["cat".into()],
            &[spec("total", "sum", Some("amt"))],
            ", ",
        );
        assert_eq!(
            Value::from(out.into_iter().map(Value::Object).collect::<Vec<_>>()),
            json!([
                {"cat": "x", "_count": 2, "total": 15},
                {"cat": "y", "_count": 1, "total": 2}
            ])
        );
    }

    #[test]
    fn numeric_functions_skip_non_numbers() {
        let input = rows(json!([
            {"v": 4}, {"v": "6"}, {"v": "n/a"}, {"v": null}, {}
        ]));
        let all: Vec<&Record> = input.iter().collect();
        assert_eq!(spec("s", "sum", Some("v")).reduce(&all, ","), json!(10));
        assert_eq!(spec("a", "avg", Some("v")).reduce(&all, ","), json!(5));
        assert_eq!(spec("m", "min", Some("v")).reduce(&all, ","), json!(4));
        assert_eq!(spec("m", "max", Some("v")).reduce(&all, ","), json!(6));
        assert_eq!(spec("c", "count", Some("v")).reduce(&all, ","), json!(4));
        assert_eq!(spec("c", "count", None).reduce(&all, ","), json!(5));
        assert_eq!(spec("f", "first", Some("v")).reduce(&all, ","), json!(4));
        assert_eq!(spec("l", "last", Some("v")).reduce(&all, ","), Value::Null);
        assert_eq!(
            spec("l", "list", Some("v")).reduce(&all, ", "),
            json!("4, 6, n/a")
        );
    }

    #[test]
    fn empty_partitions() {
        let none: Vec<&Record> = Vec::new();
        assert_eq!(spec("s", "sum", Some("v")).reduce(&none, ","), json!(0));
        assert_eq!(spec("a", "avg", Some("v")).reduce(&none, ","), Value::Null);
        assert_eq!(spec("m", "max", Some("v")).reduce(&none, ","), Value::Null);
    }

    #[test]
    fn group_key_distinguishes_absent_from_null() {
        let input = rows(json!([{"k": null}, {}, {"k": null}]));
        let out = group_records(&input, &["k".into()], &[], ",");
        assert_eq!(out.len(), 2);
        assert_eq!(out[0]["_count"], json!(2));
        assert_eq!(out[1]["k"], Value::Null);
    }

    #[test]
    fn spec_parsing() {
        let s = AggregationSpec::from_config("t", &json!({"operation": "SUM", "sourceField": "a"}), None)
            .unwrap();
        assert_eq!(s.func, AggFn::Sum);
        assert_eq!(s.field.as_deref(), Some("a"));
        assert!(AggregationSpec::from_config("t", &json!({"op": "sum"}), None).is_err());
        assert!(AggregationSpec::from_config("t", &json!({"op": "median", "field": "a"}), None).is_err());
        let s = AggregationSpec::from_config("amt", &json!("max"), Some("amt")).unwrap();
        assert_eq!(s.field.as_deref(), Some("amt"));
    }

    #[test]
    fn summarize_appends_label_first() {
        let input = rows(json!([{"amt": 1}, {"amt": 2}]));
        let label = json!({"name": "TOTAL"}).as_object().unwrap().clone();
        let out = summarize_records(&input, &[spec("amt", "sum", Some("amt"))], &label, ",");
        assert_eq!(Value::Object(out), json!({"name": "TOTAL", "amt": 3}));
    }
}
