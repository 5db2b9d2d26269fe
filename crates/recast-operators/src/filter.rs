//! Filter operator over the condition grammar.
//!
//! Supports conditions of the form "path OP literal" where OP ∈ {==, !=, <, <=,
//! >, >=, contains, startswith, endswith}.

use serde_json::Value;

use recast_core::types::Collection;
use recast_expr::Condition;

use crate::args;
use crate::traits::{sequence_only, OpContext, OpError, Operator};

#[derive(Debug, Clone)]
pub struct Filter {
    pub condition: Condition,
}

impl Filter {
    /// Accepts `"status == 'active'"` or `{condition: "..."}`.
    pub fn from_config(config: &Value) -> Result<Self, OpError> {
        let text = match config {
            Value::String(s) => s.clone(),
            other => args::required_str(args::object(other, "filter")?, &["condition", "where"])?,
        };
        Ok(Self {
            condition: Condition::parse(&text)?,
        })
    }
}

impl Operator for Filter {
    fn name(&self) -> &'static str {
        "filter"
    }

    fn apply(&self, input: &Collection, ctx: &OpContext<'_>) -> Result<Collection, OpError> {
        sequence_only(self.name(), input, ctx, |records| {
            Ok(records
                .iter()
                .filter(|r| self.condition.evaluate(r))
                .cloned()
                .collect())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::testing::run;
    use serde_json::json;

    #[test]
    fn keeps_matching_records_in_order() {
        let op = Filter::from_config(&json!("age >= 18")).unwrap();
        let (out, _) = run(
            &op,
            json!([{"age": 30}, {"age": 12}, {"age": "18"}, {"name": "x"}]),
        );
        assert_eq!(out, json!([{"age": 30}, {"age": "18"}]));
    }

    #[test]
    fn object_config_form() {
        let op = Filter::from_config(&json!({"condition": "x == 1"})).unwrap();
        assert_eq!(op.condition.path, "x");
    }

    #[test]
    fn malformed_condition_is_config_error() {
        let err = Filter::from_config(&json!("status active")).unwrap_err();
        assert!(err.to_string().contains("status active"));
        assert!(Filter::from_config(&json!(5)).is_err());
    }

    #[test]
    fn single_record_passes_through_with_diagnostic() {
        let op = Filter::from_config(&json!("age > 100")).unwrap();
        let (out, diags) = run(&op, json!({"age": 1}));
        assert_eq!(out, json!({"age": 1}));
        assert_eq!(diags.len(), 1);
        assert!(diags[0].contains("sequence"));
    }
}
