//! Order- and position-based operators: `limit`, `skip`, `reverse`,
//! `distinct`, `addIndex`.

use std::collections::HashSet;

use serde_json::Value;

use recast_core::hash::GroupKey;
use recast_core::path::resolve;
use recast_core::types::{Collection, Record};

use crate::args;
use crate::traits::{sequence_only, OpContext, OpError, Operator};

fn count_config(config: &Value, op: &str) -> Result<usize, OpError> {
    match config {
        Value::Object(map) => args::optional_count(map, &["count", "n"])?
            .ok_or_else(|| OpError::Config(format!("{op} needs a count"))),
        other => args::count(other, op),
    }
}

/// Keep the first N records.
#[derive(Debug, Clone, Copy)]
pub struct Limit {
    pub n: usize,
}

impl Limit {
    pub fn from_config(config: &Value) -> Result<Self, OpError> {
        Ok(Self {
            n: count_config(config, "limit")?,
        })
    }
}

impl Operator for Limit {
    fn name(&self) -> &'static str {
        "limit"
    }

    fn apply(&self, input: &Collection, ctx: &OpContext<'_>) -> Result<Collection, OpError> {
        sequence_only(self.name(), input, ctx, |records| {
            Ok(records.iter().take(self.n).cloned().collect())
        })
    }
}

/// Drop the first N records.
#[derive(Debug, Clone, Copy)]
pub struct Skip {
    pub n: usize,
}

impl Skip {
    pub fn from_config(config: &Value) -> Result<Self, OpError> {
        Ok(Self {
            n: count_config(config, "skip")?,
        })
    }
}

impl Operator for Skip {
    fn name(&self) -> &'static str {
        "skip"
    }

    fn apply(&self, input: &Collection, ctx: &OpContext<'_>) -> Result<Collection, OpError> {
        sequence_only(self.name(), input, ctx, |records| {
            Ok(records.iter().skip(self.n).cloned().collect())
        })
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Reverse;

impl Operator for Reverse {
    fn name(&self) -> &'static str {
        "reverse"
    }

    fn apply(&self, input: &Collection, ctx: &OpContext<'_>) -> Result<Collection, OpError> {
        sequence_only(self.name(), input, ctx, |records| {
            Ok(records.iter().rev().cloned().collect())
        })
    }
}

/// Drop records whose key was already seen; the first occurrence wins.
#[derive(Debug, Clone, Default)]
pub struct Distinct {
    /// `None` keys on the whole record.
    pub paths: Option<Vec<String>>,
}

impl Distinct {
    pub fn from_config(config: &Value) -> Result<Self, OpError> {
        let paths = match config {
            Value::Null | Value::Bool(true) => None,
            Value::String(s) if s.is_empty() => None,
            Value::Object(map) => match args::get(map, &["fields", "by"]) {
                Some(v) => Some(args::string_list(v, "distinct")?),
                None => None,
            },
            other => Some(args::string_list(other, "distinct")?),
        };
        Ok(Self { paths })
    }

    fn key(&self, record: &Record) -> GroupKey {
        match &self.paths {
            None => GroupKey::from_record(record),
            Some(paths) => {
                let values: Vec<Option<&Value>> =
                    paths.iter().map(|p| resolve(record, p)).collect();
                GroupKey::from_values(&values)
            }
        }
    }
}

impl Operator for Distinct {
    fn name(&self) -> &'static str {
        "distinct"
    }

    fn apply(&self, input: &Collection, ctx: &OpContext<'_>) -> Result<Collection, OpError> {
        sequence_only(self.name(), input, ctx, |records| {
            let mut seen = HashSet::with_capacity(records.len());
            Ok(records
                .iter()
                .filter(|r| seen.insert(self.key(r)))
                .cloned()
                .collect())
        })
    }
}

/// Prepend a sequential counter field.
#[derive(Debug, Clone)]
pub struct AddIndex {
    pub field: String,
    pub start: i64,
}

impl Default for AddIndex {
    fn default() -> Self {
        Self {
            field: "_index".into(),
            start: 1,
        }
    }
}

impl AddIndex {
    pub fn from_config(config: &Value) -> Result<Self, OpError> {
        let mut op = Self::default();
        match config {
            Value::Null | Value::Bool(true) => {}
            Value::String(s) if !s.is_empty() => op.field = s.clone(),
            Value::Object(map) => {
                if let Some(field) = args::optional_str(map, &["field", "name"])? {
                    op.field = field;
                }
                if let Some(start) = args::get(map, &["start"]) {
                    op.start = args::integer(start, "start")?;
                }
            }
            other => {
                return Err(OpError::Config(format!(
                    "addIndex takes a field name or {{field, start}}, got {other}"
                )))
            }
        }
        Ok(op)
    }
}

impl Operator for AddIndex {
    fn name(&self) -> &'static str {
        "addIndex"
    }

    fn apply(&self, input: &Collection, ctx: &OpContext<'_>) -> Result<Collection, OpError> {
        sequence_only(self.name(), input, ctx, |records| {
            Ok(records
                .iter()
                .zip(self.start..)
                .map(|(record, idx)| {
                    let mut out = Record::new();
                    out.insert(self.field.clone(), Value::from(idx));
                    for (k, v) in record {
                        if *k != self.field {
                            out.insert(k.clone(), v.clone());
                        }
                    }
                    out
                })
                .collect())
        })
    }
}
