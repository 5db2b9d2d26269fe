//! `format`: per-field value formatting.
//!
//! Each field maps to a settings object with a `type`, or to the bare type
//! name (`name: uppercase`). Absent fields are skipped by every type except
//! `default`. A value a type cannot handle (a date that does not parse, text
//! under `number`) is left as it was and reported.

use chrono::{NaiveDate, NaiveDateTime, TimeZone, Utc};
use regex::{Regex, RegexBuilder};
use serde_json::Value;

use recast_core::path::resolve;
use recast_core::types::{kind_name, Collection};
use recast_core::value::{as_number, format_f64, is_blank, truthy};

use crate::args::{self, Args};
use crate::traits::{OpContext, OpError, Operator};

#[derive(Debug, Clone, PartialEq)]
pub struct NumberFormat {
    pub decimals: Option<usize>,
    pub thousands: Option<String>,
    pub prefix: String,
    pub suffix: String,
}

impl NumberFormat {
    pub fn render(&self, f: f64) -> String {
        let body = match self.decimals {
            Some(d) => format!("{f:.d$}"),
            None => format_f64(f),
        };
        let body = match &self.thousands {
            Some(sep) => group_thousands(&body, sep),
            None => body,
        };
        format!("{}{}{}", self.prefix, body, self.suffix)
    }
}

fn group_thousands(body: &str, sep: &str) -> String {
    let (sign, unsigned) = match body.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", body),
    };
    let (int, frac) = match unsigned.find('.') {
        Some(i) => unsigned.split_at(i),
        None => (unsigned, ""),
    };
    let mut grouped = String::with_capacity(int.len() + int.len() / 3 * sep.len());
    for (i, ch) in int.chars().enumerate() {
        if i > 0 && (int.len() - i) % 3 == 0 {
            grouped.push_str(sep);
        }
        grouped.push(ch);
    }
    format!("{sign}{grouped}{frac}")
}

#[derive(Debug, Clone)]
pub enum FieldFormat {
    /// Falls back to the engine's default date pattern when unset.
    Date { pattern: Option<String> },
    Number(NumberFormat),
    Uppercase,
    Lowercase,
    Trim,
    Boolean { on: String, off: String },
    Replace {
        regex: Regex,
        replacement: String,
        global: bool,
    },
    Default { value: Value },
}

impl FieldFormat {
    pub fn from_config(field: &str, config: &Value) -> Result<Self, OpError> {
        let empty = Args::new();
        let (kind, settings) = match config {
            Value::String(kind) => (kind.clone(), &empty),
            Value::Object(settings) => (
                args::required_str(settings, &["type"])
                    .map_err(|e| OpError::Config(format!("field '{field}': {e}")))?,
                settings,
            ),
            other => {
                return Err(OpError::Config(format!(
                    "field '{field}': format must be a type name or a mapping, got {}",
                    kind_name(other)
                )))
            }
        };
        Self::build(&kind.to_ascii_lowercase(), settings)
            .map_err(|e| OpError::Config(format!("field '{field}': {e}")))
    }

    fn build(kind: &str, s: &Args) -> Result<Self, OpError> {
        Ok(match kind {
            "date" => FieldFormat::Date {
                pattern: args::optional_str(s, &["pattern", "format"])?,
            },
            "number" => FieldFormat::Number(NumberFormat {
                decimals: args::optional_count(s, &["decimals", "precision"])?,
                thousands: match args::get(s, &["thousands", "thousandsSeparator"]) {
                    None | Some(Value::Bool(false)) => None,
                    Some(Value::Bool(true)) => Some(",".into()),
                    Some(v) => Some(args::string(v, "thousands")?),
                },
                prefix: args::optional_str(s, &["prefix"])?.unwrap_or_default(),
                suffix: args::optional_str(s, &["suffix"])?.unwrap_or_default(),
            }),
            "uppercase" | "upper" => FieldFormat::Uppercase,
            "lowercase" | "lower" => FieldFormat::Lowercase,
            "trim" => FieldFormat::Trim,
            "boolean" | "bool" => FieldFormat::Boolean {
                on: args::optional_str(s, &["trueLabel", "trueValue", "true"])?
                    .unwrap_or_else(|| "Yes".into()),
                off: args::optional_str(s, &["falseLabel", "falseValue", "false"])?
                    .unwrap_or_else(|| "No".into()),
            },
            "replace" => {
                let pattern = args::required_str(s, &["pattern", "search", "from"])?;
                let flags = args::optional_str(s, &["flags"])?.unwrap_or_else(|| "g".into());
                let mut global = false;
                let mut builder = RegexBuilder::new(&pattern);
                for flag in flags.chars() {
                    match flag {
                        'g' => global = true,
                        'i' => {
                            builder.case_insensitive(true);
                        }
                        other => {
                            return Err(OpError::Config(format!(
                                "unknown replace flag '{other}'"
                            )))
                        }
                    }
                }
                let regex = builder
                    .build()
                    .map_err(|e| OpError::Config(format!("invalid pattern '{pattern}': {e}")))?;
                let replacement = args::optional_str(s, &["replacement", "replace", "with"])?
                    .unwrap_or_default();
                FieldFormat::Replace {
                    replacement: replacement_template(&replacement, &regex),
                    regex,
                    global,
                }
            }
            "default" => FieldFormat::Default {
                value: s.get("value").cloned().unwrap_or(Value::Null),
            },
            other => return Err(OpError::Config(format!("unknown format type '{other}'"))),
        })
    }

    /// New value for the field; `Ok(None)` leaves it unchanged.
    fn apply(&self, value: Option<&Value>, ctx: &OpContext<'_>) -> Result<Option<Value>, String> {
        if let FieldFormat::Default { value: fallback } = self {
            return Ok(is_blank(value).then(|| fallback.clone()));
        }
        let value = match value {
            None | Some(Value::Null) => return Ok(None),
            Some(v) => v,
        };
        let text = |f: &dyn Fn(&str) -> String| match value {
            Value::String(s) => Some(Value::String(f(s))),
            _ => None,
        };
        Ok(match self {
            FieldFormat::Date { pattern } => {
                let dt = parse_datetime(value)
                    .ok_or_else(|| format!("cannot read {value} as a date"))?;
                let pattern = pattern.as_deref().unwrap_or(&ctx.config.default_date_format);
                Some(Value::String(render_date(pattern, &dt)))
            }
            FieldFormat::Number(fmt) => {
                let f = as_number(value).ok_or_else(|| format!("{value} is not numeric"))?;
                Some(Value::String(fmt.render(f)))
            }
            FieldFormat::Uppercase => text(&|s| s.to_uppercase()),
            FieldFormat::Lowercase => text(&|s| s.to_lowercase()),
            FieldFormat::Trim => text(&|s| s.trim().to_string()),
            FieldFormat::Boolean { on, off } => {
                let label = if truthy(Some(value)) { on } else { off };
                Some(Value::String(label.clone()))
            }
            FieldFormat::Replace {
                regex,
                replacement,
                global,
            } => text(&|s| {
                if *global {
                    regex.replace_all(s, replacement.as_str()).into_owned()
                } else {
                    regex.replace(s, replacement.as_str()).into_owned()
                }
            }),
            FieldFormat::Default { .. } => None,
        })
    }
}

/// Rewrite a replacement string into `regex` expansion syntax.
///
/// `$1`..`$99` and `$<name>` refer to groups that exist in `regex`, `$&` is
/// the whole match and `$$` a single `$`. Any other `$` is literal text.
fn replacement_template(replacement: &str, regex: &Regex) -> String {
    let groups = regex.captures_len() - 1;
    let names: Vec<&str> = regex.capture_names().flatten().collect();
    let chars: Vec<char> = replacement.chars().collect();
    let mut out = String::with_capacity(replacement.len());
    let mut i = 0;
    while i < chars.len() {
        if chars[i] != '$' {
            out.push(chars[i]);
            i += 1;
            continue;
        }
        match chars.get(i + 1) {
            Some('$') => {
                out.push_str("$$");
                i += 2;
            }
            Some('&') => {
                out.push_str("${0}");
                i += 2;
            }
            Some(d) if d.is_ascii_digit() => {
                let one = d.to_digit(10).unwrap_or(0) as usize;
                let two = chars
                    .get(i + 2)
                    .and_then(|c| c.to_digit(10))
                    .map(|c| one * 10 + c as usize);
                match two {
                    Some(n) if (1..=groups).contains(&n) => {
                        out.push_str(&format!("${{{n}}}"));
                        i += 3;
                    }
                    _ if (1..=groups).contains(&one) => {
                        out.push_str(&format!("${{{one}}}"));
                        i += 2;
                    }
                    _ => {
                        out.push_str("$$");
                        i += 1;
                    }
                }
            }
            Some('<') => {
                let rest: String = chars[i + 2..].iter().collect();
                match rest.find('>').map(|end| &rest[..end]) {
                    Some(name) if names.contains(&name) => {
                        out.push_str(&format!("${{{name}}}"));
                        i += 3 + name.chars().count();
                    }
                    _ => {
                        out.push_str("$$");
                        i += 1;
                    }
                }
            }
            _ => {
                out.push_str("$$");
                i += 1;
            }
        }
    }
    out
}

/// Accepts RFC 3339, `YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS`,
/// `YYYY-MM-DDTHH:MM:SS`, or epoch milliseconds.
pub fn parse_datetime(value: &Value) -> Option<NaiveDateTime> {
    match value {
        Value::Number(n) => {
            let ms = n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))?;
            Utc.timestamp_millis_opt(ms).single().map(|dt| dt.naive_utc())
        }
        Value::String(s) => {
            let s = s.trim();
            if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
                return Some(dt.naive_local());
            }
            for layout in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
                if let Ok(dt) = NaiveDateTime::parse_from_str(s, layout) {
                    return Some(dt);
                }
            }
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        }
        _ => None,
    }
}

const DATE_TOKENS: [(&str, &str); 6] = [
    ("YYYY", "%Y"),
    ("MM", "%m"),
    ("DD", "%d"),
    ("HH", "%H"),
    ("mm", "%M"),
    ("ss", "%S"),
];

/// Substitute `YYYY MM DD HH mm ss` in `pattern`; everything else is literal.
pub fn render_date(pattern: &str, dt: &NaiveDateTime) -> String {
    let mut spec = String::with_capacity(pattern.len());
    let mut rest = pattern;
    'scan: while let Some(ch) = rest.chars().next() {
        for (token, directive) in DATE_TOKENS {
            if let Some(after) = rest.strip_prefix(token) {
                spec.push_str(directive);
                rest = after;
                continue 'scan;
            }
        }
        if ch == '%' {
            spec.push_str("%%");
        } else {
            spec.push(ch);
        }
        rest = &rest[ch.len_utf8()..];
    }
    dt.format(&spec).to_string()
}

#[derive(Debug, Clone)]
pub struct Format {
    pub fields: Vec<(String, FieldFormat)>,
}

impl Format {
    pub fn from_config(config: &Value) -> Result<Self, OpError> {
        let map = args::object(config, "format")?;
        if map.is_empty() {
            return Err(OpError::Config("format needs at least one field".into()));
        }
        let fields = map
            .iter()
            .map(|(field, spec)| Ok((field.clone(), FieldFormat::from_config(field, spec)?)))
            .collect::<Result<Vec<_>, OpError>>()?;
        Ok(Self { fields })
    }
}

impl Operator for Format {
    fn name(&self) -> &'static str {
        "format"
    }

    fn apply(&self, input: &Collection, ctx: &OpContext<'_>) -> Result<Collection, OpError> {
        input.map_records(|idx, record| {
            let mut out = record.clone();
            for (field, format) in &self.fields {
                match format.apply(resolve(&out, field), ctx) {
                    Ok(Some(v)) => {
                        out.insert(field.clone(), v);
                    }
                    Ok(None) => {}
                    Err(msg) => ctx.warn(self.name(), format!("record {idx}: '{field}': {msg}")),
                }
            }
            Ok(out)
        })
    }
}
