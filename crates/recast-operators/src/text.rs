//! String-shaping operators: `concat`, `split`, `truncate`, `pad`.

use serde_json::Value;

use recast_core::path::resolve;
use recast_core::types::Collection;
use recast_core::value::{display, is_blank};

use crate::args;
use crate::traits::{OpContext, OpError, Operator};

/// Join several fields into one, skipping blank values.
#[derive(Debug, Clone)]
pub struct Concat {
    pub target: String,
    pub sources: Vec<String>,
    pub separator: String,
}

impl Concat {
    pub fn from_config(config: &Value) -> Result<Self, OpError> {
        let map = args::object(config, "concat")?;
        Ok(Self {
            target: args::required_str(map, &["targetField", "target"])?,
            sources: args::required_list(map, &["sourceFields", "fields", "sources"])?,
            separator: args::optional_str(map, &["separator"])?.unwrap_or_else(|| " ".into()),
        })
    }
}

impl Operator for Concat {
    fn name(&self) -> &'static str {
        "concat"
    }

    fn apply(&self, input: &Collection, _ctx: &OpContext<'_>) -> Result<Collection, OpError> {
        input.map_records(|_, record| {
            let joined = self
                .sources
                .iter()
                .map(|p| resolve(record, p))
                .filter(|v| !is_blank(*v))
                .flatten()
                .map(display)
                .collect::<Vec<_>>()
                .join(&self.separator);
            let mut out = record.clone();
            out.insert(self.target.clone(), Value::String(joined));
            Ok(out)
        })
    }
}

/// Split one field's text into positional target fields.
#[derive(Debug, Clone)]
pub struct Split {
    pub source: String,
    pub separator: String,
    pub targets: Vec<String>,
}

impl Split {
    pub fn from_config(config: &Value) -> Result<Self, OpError> {
        let map = args::object(config, "split")?;
        let separator = args::optional_str(map, &["separator", "delimiter"])?
            .unwrap_or_else(|| ",".into());
        if separator.is_empty() {
            return Err(OpError::Config("split separator must not be empty".into()));
        }
        Ok(Self {
            source: args::required_str(map, &["sourceField", "field", "source"])?,
            separator,
            targets: args::required_list(map, &["targetFields", "targets"])?,
        })
    }
}

impl Operator for Split {
    fn name(&self) -> &'static str {
        "split"
    }

    fn apply(&self, input: &Collection, _ctx: &OpContext<'_>) -> Result<Collection, OpError> {
        input.map_records(|_, record| {
            let text = match resolve(record, &self.source) {
                None | Some(Value::Null) => return Ok(record.clone()),
                Some(v) => display(v),
            };
            let parts: Vec<&str> = text.split(self.separator.as_str()).map(str::trim).collect();
            let mut out = record.clone();
            for (i, target) in self.targets.iter().enumerate() {
                let part = parts.get(i).copied().unwrap_or("");
                out.insert(target.clone(), Value::String(part.to_string()));
            }
            Ok(out)
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TruncateRule {
    pub length: usize,
    pub suffix: String,
}

impl TruncateRule {
    fn apply(&self, text: &str) -> Option<String> {
        if text.chars().count() <= self.length {
            return None;
        }
        let suffix_len = self.suffix.chars().count();
        if suffix_len >= self.length {
            return Some(text.chars().take(self.length).collect());
        }
        let mut out: String = text.chars().take(self.length - suffix_len).collect();
        out.push_str(&self.suffix);
        Some(out)
    }
}

/// Shorten strings longer than a budget; the suffix counts toward it.
#[derive(Debug, Clone)]
pub struct Truncate {
    pub fields: Vec<(String, TruncateRule)>,
}

impl Truncate {
    pub fn from_config(config: &Value) -> Result<Self, OpError> {
        let map = args::object(config, "truncate")?;
        if map.is_empty() {
            return Err(OpError::Config("truncate needs at least one field".into()));
        }
        let fields = map
            .iter()
            .map(|(field, rule)| {
                let rule = match rule {
                    Value::Object(settings) => TruncateRule {
                        length: args::optional_count(settings, &["length", "max"])?.ok_or_else(
                            || OpError::Config(format!("field '{field}': missing 'length'")),
                        )?,
                        suffix: args::optional_str(settings, &["suffix"])?
                            .unwrap_or_else(|| "...".into()),
                    },
                    other => TruncateRule {
                        length: args::count(other, field)?,
                        suffix: "...".into(),
                    },
                };
                Ok((field.clone(), rule))
            })
            .collect::<Result<Vec<_>, OpError>>()?;
        Ok(Self { fields })
    }
}

impl Operator for Truncate {
    fn name(&self) -> &'static str {
        "truncate"
    }

    fn apply(&self, input: &Collection, _ctx: &OpContext<'_>) -> Result<Collection, OpError> {
        input.map_records(|_, record| {
            let mut out = record.clone();
            for (field, rule) in &self.fields {
                if let Some(Value::String(s)) = resolve(record, field) {
                    if let Some(short) = rule.apply(s) {
                        out.insert(field.clone(), Value::String(short));
                    }
                }
            }
            Ok(out)
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PadSide {
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PadRule {
    pub length: usize,
    pub fill: char,
    pub side: PadSide,
}

/// Pad the text form of a value to a fixed width.
#[derive(Debug, Clone)]
pub struct Pad {
    pub fields: Vec<(String, PadRule)>,
}

impl Pad {
    pub fn from_config(config: &Value) -> Result<Self, OpError> {
        let map = args::object(config, "pad")?;
        if map.is_empty() {
            return Err(OpError::Config("pad needs at least one field".into()));
        }
        let fields = map
            .iter()
            .map(|(field, rule)| {
                let rule = match rule {
                    Value::Object(settings) => {
                        let side = match args::optional_str(settings, &["side", "direction"])?
                            .map(|s| s.to_ascii_lowercase())
                            .as_deref()
                        {
                            None | Some("left") | Some("start") => PadSide::Left,
                            Some("right") | Some("end") => PadSide::Right,
                            Some(other) => {
                                return Err(OpError::Config(format!(
                                    "field '{field}': pad side must be 'left' or 'right', got '{other}'"
                                )))
                            }
                        };
                        PadRule {
                            length: args::optional_count(settings, &["length", "width"])?
                                .ok_or_else(|| {
                                    OpError::Config(format!("field '{field}': missing 'length'"))
                                })?,
                            fill: args::optional_char(settings, &["char", "fill"], ' ')?,
                            side,
                        }
                    }
                    other => PadRule {
                        length: args::count(other, field)?,
                        fill: ' ',
                        side: PadSide::Left,
                    },
                };
                Ok((field.clone(), rule))
            })
            .collect::<Result<Vec<_>, OpError>>()?;
        Ok(Self { fields })
    }
}

impl Operator for Pad {
    fn name(&self) -> &'static str {
        "pad"
    }

    fn apply(&self, input: &Collection, _ctx: &OpContext<'_>) -> Result<Collection, OpError> {
        input.map_records(|_, record| {
            let mut out = record.clone();
            for (field, rule) in &self.fields {
                let text = match resolve(record, field) {
                    None | Some(Value::Null) => continue,
                    Some(v) => display(v),
                };
                let missing = rule.length.saturating_sub(text.chars().count());
                let fill: String = std::iter::repeat(rule.fill).take(missing).collect();
                let padded = match rule.side {
                    PadSide::Left => fill + &text,
                    PadSide::Right => text + &fill,
                };
                out.insert(field.clone(), Value::String(padded));
            }
            Ok(out)
        })
    }
}
