//! Raw steps → operators.

use std::fmt;

use serde_json::{Map, Value};

use recast_core::config::EngineConfig;
use recast_core::error::{Error, Result};
use recast_core::hash::{hash_value, Hash256};
use recast_operators::{OpError, Operator, OperatorKind};

use crate::dsl::document::{parse_document, PipelineConfig, PipelineDocument, RawStep};

/// A step whose operator has been resolved and built.
pub struct CompiledStep {
    pub index: usize,
    pub kind: OperatorKind,
    /// The step's config as written, kept for hashing and `explain`.
    pub config: Value,
    pub op: Box<dyn Operator>,
}

impl fmt::Debug for CompiledStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledStep")
            .field("index", &self.index)
            .field("kind", &self.kind)
            .field("config", &self.config)
            .finish()
    }
}

impl CompiledStep {
    fn compile(raw: RawStep) -> Result<Self> {
        let kind = OperatorKind::from_name(&raw.op).ok_or_else(|| Error::UnknownOperator {
            step: raw.index,
            op: raw.op.clone(),
        })?;
        let op = kind.build(&raw.config).map_err(|e| match e {
            OpError::Config(message) => Error::Config {
                step: raw.index,
                op: kind.as_str().to_string(),
                message,
            },
        })?;
        Ok(Self {
            index: raw.index,
            kind,
            config: raw.config,
            op,
        })
    }
}

/// An ordered, fully built pipeline. Read-only once compiled.
#[derive(Debug, Default)]
pub struct Pipeline {
    pub config: PipelineConfig,
    pub steps: Vec<CompiledStep>,
}

impl Pipeline {
    /// Build every step of `doc`, stopping at the first bad one.
    pub fn compile(doc: PipelineDocument, base: &EngineConfig) -> Result<Self> {
        let max_steps = doc.config.max_steps.unwrap_or(base.max_steps);
        if doc.transforms.len() > max_steps {
            return Err(Error::Document(format!(
                "pipeline declares {} steps; the limit is {max_steps}",
                doc.transforms.len()
            )));
        }
        let steps = doc
            .transforms
            .into_iter()
            .map(CompiledStep::compile)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            config: doc.config,
            steps,
        })
    }

    /// Parse and compile YAML or JSON text.
    pub fn parse(src: &str, base: &EngineConfig) -> Result<Self> {
        Self::compile(parse_document(src)?, base)
    }

    /// Compile an already-decoded document value.
    pub fn from_value(doc: &Value, base: &EngineConfig) -> Result<Self> {
        Self::compile(PipelineDocument::from_value(doc)?, base)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// `base` with this pipeline's `config` block applied.
    pub fn engine_config(&self, base: &EngineConfig) -> EngineConfig {
        let mut cfg = base.clone();
        self.config.apply_to(&mut cfg);
        cfg
    }

    /// The steps as a `transforms`-style list of `{op: config}` mappings.
    pub fn to_value(&self) -> Value {
        Value::Array(
            self.steps
                .iter()
                .map(|s| {
                    let mut m = Map::new();
                    m.insert(s.kind.as_str().to_string(), s.config.clone());
                    Value::Object(m)
                })
                .collect(),
        )
    }

    /// Structural digest of the step list; identical pipelines written with
    /// different key order or YAML/JSON syntax hash the same.
    pub fn fingerprint(&self) -> Hash256 {
        hash_value(&self.to_value())
    }

    /// One line per step, for `explain`.
    pub fn describe(&self) -> Vec<String> {
        self.steps
            .iter()
            .map(|s| {
                let shape = if s.kind.requires_sequence() {
                    " [sequence]"
                } else {
                    ""
                };
                format!("{:>3}. {}{} {}", s.index, s.kind, shape, s.config)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn compile(src: &str) -> Result<Pipeline> {
        Pipeline::parse(src, &EngineConfig::default())
    }

    #[test]
    fn compiles_known_operators() {
        let p = compile(
            r#"
transforms:
  - filter: "age >= 18"
  - addIndex: row
  - add_index: {field: n, start: 0}
"#,
        )
        .unwrap();
        assert_eq!(p.len(), 3);
        assert_eq!(p.steps[1].kind, OperatorKind::AddIndex);
        assert_eq!(p.steps[2].op.name(), "addIndex");
    }

    #[test]
    fn unknown_operator_names_step() {
        let err = compile("transforms: [{limit: 1}, {explode: tags}]").unwrap_err();
        assert_eq!(
            err,
            Error::UnknownOperator {
                step: 1,
                op: "explode".into()
            }
        );
    }

    #[test]
    fn config_errors_carry_step_and_operator() {
        let err = compile("transforms: [{limit: 1}, {select: []}]").unwrap_err();
        assert_eq!(err.step(), Some(1));
        assert_eq!(err.op(), Some("select"));
        assert!(matches!(err, Error::Config { .. }));

        let err = compile("transforms: [{filter: 'no operator'}]").unwrap_err();
        assert!(err.to_string().contains("no operator"));

        let err = compile("transforms: [{compute: {x: 'a +'}}]").unwrap_err();
        assert_eq!(err.op(), Some("compute"));
    }

    #[test]
    fn step_limit_respects_config_block() {
        let src = "config: {max_steps: 1}\ntransforms: [{limit: 1}, {skip: 1}]";
        assert!(matches!(compile(src).unwrap_err(), Error::Document(_)));
        let cfg = EngineConfig {
            max_steps: 1,
            ..EngineConfig::default()
        };
        assert!(Pipeline::parse("transforms: [{limit: 1}, {skip: 1}]", &cfg).is_err());
    }

    #[test]
    fn fingerprint_ignores_syntax() {
        let a = compile("transforms:\n  - sort: {field: a, order: desc}\n").unwrap();
        let b = Pipeline::from_value(
            &json!({"transforms": [{"sort": {"order": "desc", "field": "a"}}]}),
            &EngineConfig::default(),
        )
        .unwrap();
        let c = compile("transforms: [{sort: a}]").unwrap();
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.fingerprint(), c.fingerprint());
    }

    #[test]
    fn engine_config_applies_overrides() {
        let p = compile("config: {list_separator: ';'}").unwrap();
        assert!(p.is_empty());
        let cfg = p.engine_config(&EngineConfig::default());
        assert_eq!(cfg.list_separator, ";");
    }

    #[test]
    fn describe_lists_steps() {
        let p = compile("transforms: [{limit: 2}, {set: {a: 1}}]").unwrap();
        let lines = p.describe();
        assert_eq!(lines[0], "  0. limit [sequence] 2");
        assert_eq!(lines[1], "  1. set {\"a\":1}");
    }
}
