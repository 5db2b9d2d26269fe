//! YAML/JSON pipeline document → ordered raw steps.
//!
//! Example:
//! ```yaml
//! config:
//!   list_separator: " | "
//! transforms:
//!   - filter: "age >= 18"
//!   - select: [name, age]
//!   - sort: "age desc"
//! ```
//!
//! JSON is accepted as-is since it parses as YAML.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use recast_core::config::EngineConfig;
use recast_core::error::{Error, Result};
use recast_core::types::kind_name;

/// Per-pipeline overrides of [`EngineConfig`]; unset fields keep the engine's
/// value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    #[serde(alias = "listSeparator")]
    pub list_separator: Option<String>,
    #[serde(alias = "flattenSeparator")]
    pub flatten_separator: Option<String>,
    #[serde(alias = "defaultDateFormat", alias = "dateFormat")]
    pub default_date_format: Option<String>,
    #[serde(alias = "maxSteps")]
    pub max_steps: Option<usize>,
}

impl PipelineConfig {
    pub fn apply_to(&self, cfg: &mut EngineConfig) {
        if let Some(sep) = &self.list_separator {
            cfg.list_separator = sep.clone();
        }
        if let Some(sep) = &self.flatten_separator {
            cfg.flatten_separator = sep.clone();
        }
        if let Some(pattern) = &self.default_date_format {
            cfg.default_date_format = pattern.clone();
        }
        if let Some(max) = self.max_steps {
            cfg.max_steps = max;
        }
    }
}

/// One `- op: config` element, not yet interpreted.
#[derive(Debug, Clone, PartialEq)]
pub struct RawStep {
    pub index: usize,
    pub op: String,
    pub config: Value,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineDocument {
    pub config: PipelineConfig,
    pub transforms: Vec<RawStep>,
}

impl PipelineDocument {
    /// Read an already-decoded document.
    pub fn from_value(doc: &Value) -> Result<Self> {
        let map = match doc {
            // an empty file
            Value::Null => return Ok(Self::default()),
            Value::Object(map) => map,
            other => {
                return Err(Error::Document(format!(
                    "expected a mapping with a 'transforms' list, got {}",
                    kind_name(other)
                )))
            }
        };

        let config = match map.get("config") {
            None | Some(Value::Null) => PipelineConfig::default(),
            Some(v) => serde_json::from_value(v.clone())
                .map_err(|e| Error::Document(format!("config: {e}")))?,
        };

        let transforms = match map.get("transforms") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items
                .iter()
                .enumerate()
                .map(|(index, item)| raw_step(index, item))
                .collect::<Result<Vec<_>>>()?,
            Some(other) => {
                return Err(Error::Document(format!(
                    "'transforms' must be a list, got {}",
                    kind_name(other)
                )))
            }
        };

        Ok(Self { config, transforms })
    }
}

fn raw_step(index: usize, item: &Value) -> Result<RawStep> {
    match item.as_object() {
        Some(map) if map.len() == 1 => {
            let (op, config) = map
                .iter()
                .next()
                .ok_or_else(|| Error::Document(format!("step {index} is empty")))?;
            Ok(RawStep {
                index,
                op: op.clone(),
                config: config.clone(),
            })
        }
        Some(map) => Err(Error::Document(format!(
            "step {index} must name exactly one operator, found {} keys",
            map.len()
        ))),
        None => Err(Error::Document(format!(
            "step {index} must be a single-key mapping, got {}",
            kind_name(item)
        ))),
    }
}

/// Parse YAML (or JSON) text into a [`PipelineDocument`].
pub fn parse_document(src: &str) -> Result<PipelineDocument> {
    if src.trim().is_empty() {
        return Ok(PipelineDocument::default());
    }
    let doc: Value = serde_yaml::from_str(src).map_err(|e| Error::Document(e.to_string()))?;
    PipelineDocument::from_value(&doc)
}
