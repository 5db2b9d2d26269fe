//! Field-set operators: `select`, `exclude`, `rename`.

use serde_json::Value;

use recast_core::path::resolve;
use recast_core::types::{Collection, Record};

use crate::args;
use crate::traits::{OpContext, OpError, Operator};

/// Keep only the named paths; each output key is the path as written.
#[derive(Debug, Clone)]
pub struct Select {
    pub paths: Vec<String>,
}

impl Select {
    pub fn from_config(config: &Value) -> Result<Self, OpError> {
        let paths = match config {
            Value::Object(map) => args::required_list(map, &["fields", "paths"])?,
            other => args::string_list(other, "select")?,
        };
        Ok(Self { paths })
    }
}

impl Operator for Select {
    fn name(&self) -> &'static str {
        "select"
    }

    fn apply(&self, input: &Collection, _ctx: &OpContext<'_>) -> Result<Collection, OpError> {
        input.map_records(|_, record| {
            let mut out = Record::new();
            for path in &self.paths {
                if let Some(v) = resolve(record, path) {
                    out.insert(path.clone(), v.clone());
                }
            }
            Ok(out)
        })
    }
}

/// Drop the named top-level fields.
#[derive(Debug, Clone)]
pub struct Exclude {
    pub fields: Vec<String>,
}

impl Exclude {
    pub fn from_config(config: &Value) -> Result<Self, OpError> {
        let fields = match config {
            Value::Object(map) => args::required_list(map, &["fields"])?,
            other => args::string_list(other, "exclude")?,
        };
        Ok(Self { fields })
    }
}

impl Operator for Exclude {
    fn name(&self) -> &'static str {
        "exclude"
    }

    fn apply(&self, input: &Collection, _ctx: &OpContext<'_>) -> Result<Collection, OpError> {
        input.map_records(|_, record| {
            Ok(record
                .iter()
                .filter(|(k, _)| !self.fields.iter().any(|f| f == *k))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect())
        })
    }
}

/// Rename top-level fields in place; field order is preserved.
#[derive(Debug, Clone)]
pub struct Rename {
    /// old name -> new name, in config order
    pub renames: Vec<(String, String)>,
}

impl Rename {
    pub fn from_config(config: &Value) -> Result<Self, OpError> {
        let map = args::object(config, "rename")?;
        if map.is_empty() {
            return Err(OpError::Config("rename needs at least one mapping".into()));
        }
        let renames = map
            .iter()
            .map(|(old, new)| Ok((old.clone(), args::string(new, old)?)))
            .collect::<Result<Vec<_>, OpError>>()?;
        Ok(Self { renames })
    }

    fn target<'a>(&'a self, name: &'a str) -> &'a str {
        self.renames
            .iter()
            .find(|(old, _)| old == name)
            .map(|(_, new)| new.as_str())
            .unwrap_or(name)
    }
}

impl Operator for Rename {
    fn name(&self) -> &'static str {
        "rename"
    }

    fn apply(&self, input: &Collection, _ctx: &OpContext<'_>) -> Result<Collection, OpError> {
        input.map_records(|_, record| {
            let mut out = Record::new();
            for (k, v) in record {
                out.insert(self.target(k).to_string(), v.clone());
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
    fn select_keeps_named_paths_and_skips_missing() {
        let op = Select::from_config(&json!(["name", "user.city", "missing"])).unwrap();
        let (out, _) = run(
            &op,
            json!([{"name": "A", "age": 3, "user": {"city": "Oslo", "zip": 1}}]),
        );
        assert_eq!(out, json!([{"name": "A", "user.city": "Oslo"}]));
    }

    #[test]
    fn select_requires_fields() {
        assert!(Select::from_config(&json!([])).is_err());
        assert!(Select::from_config(&json!({})).is_err());
        assert!(Select::from_config(&json!("name")).is_ok());
    }

    #[test]
    fn select_works_on_single_record() {
        let op = Select::from_config(&json!(["a"])).unwrap();
        let (out, diags) = run(&op, json!({"a": 1, "b": 2}));
        assert_eq!(out, json!({"a": 1}));
        assert!(diags.is_empty());
    }

    #[test]
    fn exclude_drops_top_level_fields() {
        let op = Exclude::from_config(&json!(["secret", "nope"])).unwrap();
        let (out, _) = run(&op, json!([{"id": 1, "secret": "x"}]));
        assert_eq!(out, json!([{"id": 1}]));
    }

    #[test]
    fn rename_preserves_position_and_unmapped_fields() {
        let op = Rename::from_config(&json!({"fname": "first_name"})).unwrap();
        let (out, _) = run(&op, json!([{"id": 1, "fname": "Ada", "x": true}]));
        assert_eq!(
            serde_json::to_string(&out).unwrap(),
            r#"[{"id":1,"first_name":"Ada","x":true}]"#
        );
    }

    #[test]
    fn rename_rejects_non_string_targets() {
        assert!(Rename::from_config(&json!({"a": 1})).is_err());
        assert!(Rename::from_config(&json!({})).is_err());
    }
}
