//! `mask`: redact field values.

use serde_json::Value;

use recast_core::path::resolve;
use recast_core::types::{kind_name, Collection};
use recast_core::value::display;

use crate::args::{self, Args};
use crate::traits::{OpContext, OpError, Operator};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaskKind {
    /// Keep up to two leading characters of the local part and the domain.
    Email,
    /// Keep the last four digits; separators stay in place.
    Digits,
    Full,
    Custom { head: usize, tail: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaskRule {
    pub kind: MaskKind,
    pub fill: char,
}

impl MaskRule {
    pub fn from_config(field: &str, config: &Value) -> Result<Self, OpError> {
        let empty = Args::new();
        let (kind, settings) = match config {
            Value::String(kind) => (kind.as_str(), &empty),
            Value::Object(settings) => match settings.get("type") {
                Some(Value::String(kind)) => (kind.as_str(), settings),
                None => ("full", settings),
                Some(other) => {
                    return Err(OpError::Config(format!(
                        "field '{field}': mask type must be a string, got {}",
                        kind_name(other)
                    )))
                }
            },
            other => {
                return Err(OpError::Config(format!(
                    "field '{field}': mask must be a type name or a mapping, got {}",
                    kind_name(other)
                )))
            }
        };
        let kind = match kind.to_ascii_lowercase().as_str() {
            "email" => MaskKind::Email,
            "phone" | "card" | "creditcard" | "credit_card" => MaskKind::Digits,
            "full" | "all" => MaskKind::Full,
            "custom" => MaskKind::Custom {
                head: args::optional_count(settings, &["showFirst", "head", "start"])?
                    .unwrap_or(0),
                tail: args::optional_count(settings, &["showLast", "tail", "end"])?
                    .unwrap_or(0),
            },
            other => {
                return Err(OpError::Config(format!(
                    "field '{field}': unknown mask type '{other}'"
                )))
            }
        };
        Ok(Self {
            kind,
            fill: args::optional_char(settings, &["char", "maskChar"], '*')?,
        })
    }

    pub fn apply(&self, text: &str) -> String {
        match self.kind {
            MaskKind::Email => self.email(text),
            MaskKind::Digits => self.digits(text),
            MaskKind::Full => self.fill_n(text.chars().count()),
            MaskKind::Custom { head, tail } => self.custom(text, head, tail),
        }
    }

    fn fill_n(&self, n: usize) -> String {
        std::iter::repeat(self.fill).take(n).collect()
    }

    fn email(&self, text: &str) -> String {
        let Some((local, domain)) = text.split_once('@') else {
            return self.fill_n(text.chars().count());
        };
        let len = local.chars().count();
        let shown = (len / 2).min(2);
        let mut out: String = local.chars().take(shown).collect();
        out.push_str(&self.fill_n(len - shown));
        out.push('@');
        out.push_str(domain);
        out
    }

    fn digits(&self, text: &str) -> String {
        let total = text.chars().filter(char::is_ascii_digit).count();
        let hidden = if total <= 4 { total } else { total - 4 };
        let mut seen = 0;
        text.chars()
            .map(|c| {
                if c.is_ascii_digit() {
                    seen += 1;
                    if seen <= hidden {
                        return self.fill;
                    }
                }
                c
            })
            .collect()
    }

    fn custom(&self, text: &str, head: usize, tail: usize) -> String {
        let chars: Vec<char> = text.chars().collect();
        if head.saturating_add(tail) >= chars.len() {
            return self.fill_n(chars.len());
        }
        chars
            .iter()
            .enumerate()
            .map(|(i, c)| {
                if i < head || i >= chars.len() - tail {
                    *c
                } else {
                    self.fill
                }
            })
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct Mask {
    pub fields: Vec<(String, MaskRule)>,
}

impl Mask {
    pub fn from_config(config: &Value) -> Result<Self, OpError> {
        let map = args::object(config, "mask")?;
        if map.is_empty() {
            return Err(OpError::Config("mask needs at least one field".into()));
        }
        let fields = map
            .iter()
            .map(|(field, rule)| Ok((field.clone(), MaskRule::from_config(field, rule)?)))
            .collect::<Result<Vec<_>, OpError>>()?;
        Ok(Self { fields })
    }
}

impl Operator for Mask {
    fn name(&self) -> &'static str {
        "mask"
    }

    fn apply(&self, input: &Collection, _ctx: &OpContext<'_>) -> Result<Collection, OpError> {
        input.map_records(|_, record| {
            let mut out = record.clone();
            for (field, rule) in &self.fields {
                match resolve(record, field) {
                    None | Some(Value::Null) => {}
                    Some(v) => {
                        out.insert(field.clone(), Value::String(rule.apply(&display(v))));
                    }
                }
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

    fn rule(config: Value) -> MaskRule {
        MaskRule::from_config("f", &config).unwrap()
    }

    #[test]
    fn email_reveals_at_most_two_local_chars() {
        let r = rule(json!("email"));
        assert_eq!(r.apply("alice@example.com"), "al***@example.com");
        assert_eq!(r.apply("bo@x.io"), "b*@x.io");
        assert_eq!(r.apply("a@x.io"), "*@x.io");
        assert_eq!(r.apply("not-an-email"), "************");
    }

    #[test]
    fn digits_keep_last_four_and_separators() {
        let r = rule(json!({"type": "card"}));
        assert_eq!(r.apply("4111-1111-1111-1234"), "****-****-****-1234");
        let r = rule(json!({"type": "phone", "char": "#"}));
        assert_eq!(r.apply("(555) 123-4567"), "(###) ###-4567");
        assert_eq!(r.apply("1234"), "####");
    }

    #[test]
    fn custom_and_full() {
        let r = rule(json!({"type": "custom", "showFirst": 2, "showLast": 1}));
        assert_eq!(r.apply("secret"), "se***t");
        assert_eq!(r.apply("abc"), "***");
        assert_eq!(rule(json!("full")).apply("abc"), "***");
    }

    #[test]
    fn custom_with_huge_counts_masks_everything() {
        let r = rule(json!({"type": "custom", "showFirst": u64::MAX, "showLast": u64::MAX}));
        assert_eq!(r.apply("secret"), "******");
    }

    #[test]
    fn masks_stringified_values_and_skips_absent() {
        let op = Mask::from_config(&json!({"ssn": "full", "card": "card"})).unwrap();
        let (out, _) = run(&op, json!([{"ssn": 123456789, "card": null}, {"name": "x"}]));
        assert_eq!(out, json!([{"ssn": "*********", "card": null}, {"name": "x"}]));
    }

    #[test]
    fn unknown_type_is_config_error() {
        assert!(Mask::from_config(&json!({"f": "blur"})).is_err());
        assert!(Mask::from_config(&json!({"f": 3})).is_err());
    }
}
