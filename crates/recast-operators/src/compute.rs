//! `compute`: derive fields from arithmetic/string expressions.
//!
//! Expressions are parsed when the pipeline is built; a syntax error fails
//! the step. At run time an expression that cannot be evaluated for a record
//! sets that record's field to null and the run continues.

use serde_json::Value;

use recast_core::types::Collection;
use recast_expr::{evaluate, parse, Expr};

use crate::args;
use crate::traits::{OpContext, OpError, Operator};

#[derive(Debug, Clone)]
pub struct Compute {
    /// target field -> expression, evaluated in order
    pub fields: Vec<(String, Expr)>,
}

impl Compute {
    pub fn from_config(config: &Value) -> Result<Self, OpError> {
        let map = args::object(config, "compute")?;
        if map.is_empty() {
            return Err(OpError::Config("compute needs at least one field".into()));
        }
        let fields = map
            .iter()
            .map(|(field, source)| {
                let expr = match source {
                    Value::String(s) => parse(s)
                        .map_err(|e| OpError::Config(format!("field '{field}': {e}")))?,
                    Value::Number(n) => Expr::Number(n.as_f64().unwrap_or_default()),
                    other => {
                        return Err(OpError::Config(format!(
                            "field '{field}': expression must be a string, got {other}"
                        )))
                    }
                };
                Ok((field.clone(), expr))
            })
            .collect::<Result<Vec<_>, OpError>>()?;
        Ok(Self { fields })
    }
}

impl Operator for Compute {
    fn name(&self) -> &'static str {
        "compute"
    }

    fn apply(&self, input: &Collection, ctx: &OpContext<'_>) -> Result<Collection, OpError> {
        input.map_records(|idx, record| {
            let mut out = record.clone();
            for (field, expr) in &self.fields {
                // Later fields see earlier results.
                let value = match evaluate(expr, &out) {
                    Ok(v) => v,
                    Err(e) => {
                        ctx.warn(
                            self.name(),
                            format!("record {idx}: '{field}' set to null: {e}"),
                        );
                        Value::Null
                    }
                };
                out.insert(field.clone(), value);
            }
            Ok(out)
        })
    }
}
