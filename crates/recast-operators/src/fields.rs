//! Field-setting operators: `lookup`, `coalesce`, `if`, `set`.
//!
//! `if` and `set` read a leading `$` as a field reference (`$price` copies
//! the `price` field); `$$` escapes it (`$$5` is the literal `$5`). A
//! reference to an absent field yields null.

use chrono::SecondsFormat;
use serde_json::Value;

use recast_core::path::resolve;
use recast_core::types::{Collection, Record};
use recast_core::value::{display_opt, is_blank};
use recast_expr::Condition;

use crate::args;
use crate::traits::{OpContext, OpError, Operator};

/// Literal value or `$field` reference.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Literal(Value),
    Field(String),
}

impl Operand {
    pub fn parse(value: &Value) -> Self {
        match value.as_str() {
            Some(s) if s.starts_with("$$") => Operand::Literal(Value::String(s[1..].to_string())),
            Some(s) if s.len() > 1 && s.starts_with('$') => Operand::Field(s[1..].to_string()),
            _ => Operand::Literal(value.clone()),
        }
    }

    pub fn get(&self, record: &Record) -> Value {
        match self {
            Operand::Literal(v) => v.clone(),
            Operand::Field(path) => resolve(record, path).cloned().unwrap_or(Value::Null),
        }
    }
}

/// Map a field's text form through a literal table.
#[derive(Debug, Clone)]
pub struct Lookup {
    pub source: String,
    pub target: String,
    pub table: serde_json::Map<String, Value>,
    pub default: Option<Value>,
}

impl Lookup {
    pub fn from_config(config: &Value) -> Result<Self, OpError> {
        let map = args::object(config, "lookup")?;
        let source = args::required_str(map, &["sourceField", "field", "source"])?;
        let table = match args::get(map, &["map", "table", "mapping"]) {
            Some(Value::Object(t)) => t.clone(),
            Some(_) => return Err(OpError::Config("lookup 'map' must be a mapping".into())),
            None => return Err(OpError::Config("missing required 'map'".into())),
        };
        Ok(Self {
            target: args::optional_str(map, &["targetField", "target"])?
                .unwrap_or_else(|| source.clone()),
            source,
            table,
            default: map.get("default").cloned(),
        })
    }
}

impl Operator for Lookup {
    fn name(&self) -> &'static str {
        "lookup"
    }

    fn apply(&self, input: &Collection, _ctx: &OpContext<'_>) -> Result<Collection, OpError> {
        input.map_records(|_, record| {
            let key = display_opt(resolve(record, &self.source));
            let mapped = self.table.get(&key).or(self.default.as_ref());
            let mut out = record.clone();
            if let Some(v) = mapped {
                out.insert(self.target.clone(), v.clone());
            }
            Ok(out)
        })
    }
}

/// First non-blank value among several fields.
#[derive(Debug, Clone)]
pub struct Coalesce {
    pub target: String,
    pub sources: Vec<String>,
    pub default: Value,
}

impl Coalesce {
    pub fn from_config(config: &Value) -> Result<Self, OpError> {
        let map = args::object(config, "coalesce")?;
        Ok(Self {
            target: args::required_str(map, &["targetField", "target"])?,
            sources: args::required_list(map, &["sourceFields", "fields", "sources"])?,
            default: map.get("default").cloned().unwrap_or(Value::Null),
        })
    }
}

impl Operator for Coalesce {
    fn name(&self) -> &'static str {
        "coalesce"
    }

    fn apply(&self, input: &Collection, _ctx: &OpContext<'_>) -> Result<Collection, OpError> {
        input.map_records(|_, record| {
            let value = self
                .sources
                .iter()
                .map(|p| resolve(record, p))
                .find(|v| !is_blank(*v))
                .flatten()
                .unwrap_or(&self.default)
                .clone();
            let mut out = record.clone();
            out.insert(self.target.clone(), value);
            Ok(out)
        })
    }
}

/// Conditional assignment. A missing branch leaves the target untouched.
#[derive(Debug, Clone)]
pub struct If {
    pub target: String,
    pub condition: Condition,
    pub then: Option<Operand>,
    pub otherwise: Option<Operand>,
}

impl If {
    pub fn from_config(config: &Value) -> Result<Self, OpError> {
        let map = args::object(config, "if")?;
        let src = args::required_str(map, &["condition", "when"])?;
        let condition = Condition::parse(&src)?;
        let then = map.get("then").map(Operand::parse);
        let otherwise = map.get("else").map(Operand::parse);
        if then.is_none() && otherwise.is_none() {
            return Err(OpError::Config("if needs 'then' or 'else'".into()));
        }
        Ok(Self {
            target: args::required_str(map, &["targetField", "target", "field"])?,
            condition,
            then,
            otherwise,
        })
    }
}

impl Operator for If {
    fn name(&self) -> &'static str {
        "if"
    }

    fn apply(&self, input: &Collection, _ctx: &OpContext<'_>) -> Result<Collection, OpError> {
        input.map_records(|_, record| {
            let branch = if self.condition.evaluate(record) {
                &self.then
            } else {
                &self.otherwise
            };
            let mut out = record.clone();
            if let Some(operand) = branch {
                out.insert(self.target.clone(), operand.get(record));
            }
            Ok(out)
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SetValue {
    /// RFC 3339 timestamp of the run clock.
    Now,
    /// `YYYY-MM-DD` of the run clock.
    Today,
    /// Epoch milliseconds of the run clock.
    Timestamp,
    Value(Operand),
}

impl SetValue {
    fn parse(value: &Value) -> Self {
        match value.as_str() {
            Some("$now") => SetValue::Now,
            Some("$today") => SetValue::Today,
            Some("$timestamp") => SetValue::Timestamp,
            _ => SetValue::Value(Operand::parse(value)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Set {
    pub fields: Vec<(String, SetValue)>,
}

impl Set {
    pub fn from_config(config: &Value) -> Result<Self, OpError> {
        let map = args::object(config, "set")?;
        if map.is_empty() {
            return Err(OpError::Config("set needs at least one field".into()));
        }
        Ok(Self {
            fields: map
                .iter()
                .map(|(k, v)| (k.clone(), SetValue::parse(v)))
                .collect(),
        })
    }
}

impl Operator for Set {
    fn name(&self) -> &'static str {
        "set"
    }

    fn apply(&self, input: &Collection, ctx: &OpContext<'_>) -> Result<Collection, OpError> {
        input.map_records(|_, record| {
            let mut out = record.clone();
            for (field, value) in &self.fields {
                let v = match value {
                    SetValue::Now => {
                        Value::String(ctx.now.to_rfc3339_opts(SecondsFormat::Secs, true))
                    }
                    SetValue::Today => Value::String(ctx.now.format("%Y-%m-%d").to_string()),
                    SetValue::Timestamp => Value::from(ctx.now.timestamp_millis()),
                    SetValue::Value(operand) => operand.get(&out),
                };
                out.insert(field.clone(), v);
            }
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
    fn lookup_maps_with_default_and_target() {
        let op = Lookup::from_config(&json!({
            "sourceField": "code",
            "map": {"1": "one", "2": "two"},
            "default": "other",
            "targetField": "label"
        }))
        .unwrap();
        let (out, _) = run(&op, json!([{"code": 1}, {"code": "2"}, {"code": 9}]));
        assert_eq!(
            out,
            json!([
                {"code": 1, "label": "one"},
                {"code": "2", "label": "two"},
                {"code": 9, "label": "other"}
            ])
        );
    }

    #[test]
    fn lookup_without_default_leaves_unmapped() {
        let op = Lookup::from_config(&json!({"sourceField": "s", "map": {"a": "A"}})).unwrap();
        let (out, _) = run(&op, json!([{"s": "a"}, {"s": "b"}]));
        assert_eq!(out, json!([{"s": "A"}, {"s": "b"}]));
        assert!(Lookup::from_config(&json!({"sourceField": "s"})).is_err());
    }

    #[test]
    fn coalesce_skips_blank() {
        let op = Coalesce::from_config(&json!({
            "targetField": "contact",
            "sourceFields": ["email", "phone"],
            "default": "none"
        }))
        .unwrap();
        let (out, _) = run(
            &op,
            json!([
                {"email": "", "phone": "555"},
                {"email": null},
                {"email": "a@b.c", "phone": "1"}
            ]),
        );
        assert_eq!(out[0]["contact"], json!("555"));
        assert_eq!(out[1]["contact"], json!("none"));
        assert_eq!(out[2]["contact"], json!("a@b.c"));
    }

    #[test]
    fn if_resolves_field_references() {
        let op = If::from_config(&json!({
            "targetField": "price_out",
            "condition": "member == true",
            "then": "$member_price",
            "else": "$$list"
        }))
        .unwrap();
        let (out, _) = run(
            &op,
            json!([
                {"member": true, "member_price": 8},
                {"member": false, "member_price": 8}
            ]),
        );
        assert_eq!(out[0]["price_out"], json!(8));
        assert_eq!(out[1]["price_out"], json!("$list"));
    }

    #[test]
    fn if_without_else_keeps_field() {
        let op = If::from_config(&json!({
            "targetField": "tier",
            "condition": "spend > 100",
            "then": "gold"
        }))
        .unwrap();
        let (out, _) = run(&op, json!([{"spend": 150}, {"spend": 10, "tier": "basic"}]));
        assert_eq!(out, json!([{"spend": 150, "tier": "gold"}, {"spend": 10, "tier": "basic"}]));
    }

    #[test]
    fn if_rejects_bad_condition() {
        let err = If::from_config(&json!({
            "targetField": "x",
            "condition": "no operator here",
            "then": 1
        }))
        .unwrap_err();
        assert!(err.to_string().contains("no operator here"));
    }

    #[test]
    fn set_tokens_use_run_clock() {
        let op = Set::from_config(&json!({
            "at": "$now",
            "day": "$today",
            "ms": "$timestamp",
            "copy": "$name",
            "cost": "$$5",
            "n": 3
        }))
        .unwrap();
        let (out, _) = run(&op, json!({"name": "Ada"}));
        assert_eq!(
            out,
            json!({
                "name": "Ada",
                "at": "2024-03-09T14:05:07Z",
                "day": "2024-03-09",
                "ms": 1709993107000_i64,
                "copy": "Ada",
                "cost": "$5",
                "n": 3
            })
        );
    }

    #[test]
    fn set_sees_earlier_assignments() {
        let op = Set::from_config(&json!({"a": 1, "b": "$a", "c": "$missing"})).unwrap();
        let (out, _) = run(&op, json!({}));
        assert_eq!(out, json!({"a": 1, "b": 1, "c": null}));
    }
}
