//! `unwind`: one output record per element of an array field.

use serde_json::Value;

use recast_core::path::{resolve, set_path};
use recast_core::types::{kind_name, Collection, Record};

use crate::args;
use crate::traits::{sequence_only, OpContext, OpError, Operator};

#[derive(Debug, Clone)]
pub struct Unwind {
    pub path: String,
    /// Keep records whose field is missing, empty, or not an array, with the
    /// field set to null.
    pub preserve_empty: bool,
}

impl Unwind {
    pub fn from_config(config: &Value) -> Result<Self, OpError> {
        match config {
            Value::String(path) if !path.is_empty() => Ok(Self {
                path: path.clone(),
                preserve_empty: false,
            }),
            Value::Object(map) => Ok(Self {
                path: args::required_str(map, &["field", "path"])?,
                preserve_empty: args::optional_bool(
                    map,
                    &["preserveEmpty", "preserveNullAndEmptyArrays"],
                )?
                .unwrap_or(false),
            }),
            other => Err(OpError::Config(format!(
                "unwind needs a field path or {{field, preserveEmpty}}, got {}",
                kind_name(other)
            ))),
        }
    }

    fn explode(&self, record: &Record, out: &mut Vec<Record>) {
        match resolve(record, &self.path) {
            Some(Value::Array(items)) if !items.is_empty() => {
                out.extend(items.iter().map(|item| {
                    let mut row = record.clone();
                    set_path(&mut row, &self.path, item.clone());
                    row
                }));
            }
            _ if self.preserve_empty => {
                let mut row = record.clone();
                set_path(&mut row, &self.path, Value::Null);
                out.push(row);
            }
            _ => {}
        }
    }
}

impl Operator for Unwind {
    fn name(&self) -> &'static str {
        "unwind"
    }

    fn apply(&self, input: &Collection, ctx: &OpContext<'_>) -> Result<Collection, OpError> {
        sequence_only(self.name(), input, ctx, |records| {
            let mut out = Vec::with_capacity(records.len());
            for record in records {
                self.explode(record, &mut out);
            }
            Ok(out)
        })
    }
}
