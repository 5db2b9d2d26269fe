//! Flatten nested records into separator-joined keys.
//!
//! `{"user": {"name": "A"}}` becomes `{"user.name": "A"}`. Arrays are kept as
//! they are, and an empty nested record is kept under its own key.

use serde_json::Value;

use recast_core::types::{Collection, Record};

use crate::args;
use crate::traits::{OpContext, OpError, Operator};

#[derive(Debug, Clone, Default)]
pub struct Flatten {
    /// Falls back to the engine's configured separator when unset.
    pub separator: Option<String>,
}

impl Flatten {
    pub fn from_config(config: &Value) -> Result<Self, OpError> {
        let separator = match config {
            Value::Null | Value::Bool(true) => None,
            Value::String(s) => Some(s.clone()),
            Value::Object(map) => args::optional_str(map, &["separator", "delimiter"])?,
            other => {
                return Err(OpError::Config(format!(
                    "flatten takes an optional separator, got {other}"
                )))
            }
        };
        if separator.as_deref() == Some("") {
            return Err(OpError::Config("flatten separator must not be empty".into()));
        }
        Ok(Self { separator })
    }
}

fn flatten_into(out: &mut Record, prefix: &str, record: &Record, sep: &str) {
    for (k, v) in record {
        let key = if prefix.is_empty() {
            k.clone()
        } else {
            format!("{prefix}{sep}{k}")
        };
        match v {
            Value::Object(inner) if !inner.is_empty() => flatten_into(out, &key, inner, sep),
            other => {
                out.insert(key, other.clone());
            }
        }
    }
}

impl Operator for Flatten {
    fn name(&self) -> &'static str {
        "flatten"
    }

    fn apply(&self, input: &Collection, ctx: &OpContext<'_>) -> Result<Collection, OpError> {
        let sep = self
            .separator
            .as_deref()
            .unwrap_or(&ctx.config.flatten_separator);
        input.map_records(|_, record| {
            let mut out = Record::new();
            flatten_into(&mut out, "", record, sep);
            Ok(out)
        })
    }
}
