//! `group` and `summarize` on top of [`crate::aggregate`].

use serde_json::Value;

use recast_core::types::{kind_name, Collection, Record};

use crate::aggregate::{group_records, summarize_records, AggregationSpec};
use crate::args;
use crate::traits::{sequence_only, OpContext, OpError, Operator};

fn aggregation_map(
    value: Option<&Value>,
    what: &str,
    field_defaults_to_name: bool,
) -> Result<Vec<AggregationSpec>, OpError> {
    match value {
        None => Ok(Vec::new()),
        Some(Value::Object(map)) => map
            .iter()
            .map(|(name, spec)| {
                let default_field = field_defaults_to_name.then_some(name.as_str());
                AggregationSpec::from_config(name, spec, default_field)
            })
            .collect(),
        Some(other) => Err(OpError::Config(format!(
            "{what} must be a mapping, got {}",
            kind_name(other)
        ))),
    }
}

#[derive(Debug, Clone)]
pub struct Group {
    pub by: Vec<String>,
    pub aggregations: Vec<AggregationSpec>,
}

impl Group {
    pub fn from_config(config: &Value) -> Result<Self, OpError> {
        let map = match config {
            Value::String(_) | Value::Array(_) => {
                return Ok(Self {
                    by: args::string_list(config, "group by")?,
                    aggregations: Vec::new(),
                })
            }
            other => args::object(other, "group")?,
        };
        Ok(Self {
            aggregations: aggregation_map(
                args::get(map, &["aggregations", "aggregate", "aggs"]),
                "aggregations",
                false,
            )?,
            by: args::required_list(map, &["by", "groupBy", "fields"])?,
        })
    }
}

impl Operator for Group {
    fn name(&self) -> &'static str {
        "group"
    }

    fn apply(&self, input: &Collection, ctx: &OpContext<'_>) -> Result<Collection, OpError> {
        sequence_only(self.name(), input, ctx, |records| {
            Ok(group_records(
                records,
                &self.by,
                &self.aggregations,
                &ctx.config.list_separator,
            ))
        })
    }
}

/// Append one totals record computed over the whole sequence.
#[derive(Debug, Clone)]
pub struct Summarize {
    pub aggregations: Vec<AggregationSpec>,
    pub label: Record,
}

impl Summarize {
    pub fn from_config(config: &Value) -> Result<Self, OpError> {
        let map = args::object(config, "summarize")?;
        let aggregations = aggregation_map(
            args::get(map, &["fields", "aggregations"]),
            "summarize fields",
            true,
        )?;
        if aggregations.is_empty() {
            return Err(OpError::Config("summarize needs at least one field".into()));
        }
        let label = match args::get(map, &["label", "labels"]) {
            None => Record::new(),
            Some(Value::Object(label)) => label.clone(),
            Some(other) => {
                return Err(OpError::Config(format!(
                    "summarize label must be a mapping, got {}",
                    kind_name(other)
                )))
            }
        };
        Ok(Self {
            aggregations,
            label,
        })
    }
}

impl Operator for Summarize {
    fn name(&self) -> &'static str {
        "summarize"
    }

    fn apply(&self, input: &Collection, ctx: &OpContext<'_>) -> Result<Collection, OpError> {
        sequence_only(self.name(), input, ctx, |records| {
            let totals = summarize_records(
                records,
                &self.aggregations,
                &self.label,
                &ctx.config.list_separator,
            );
            let mut out = records.to_vec();
            out.push(totals);
            Ok(out)
        })
    }
}
