use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExprError {
    /// The expression text does not fit the grammar. Fatal at parse time.
    #[error("syntax error: {0}")]
    Syntax(String),

    /// Evaluation failed for one record. Callers recover per record.
    #[error("evaluation error: {0}")]
    Eval(String),
}
