//! Per-record evaluation of `compute` expressions.
//!
//! Operands are numbers or text. Field values that are numbers, or strings
//! that read as numbers, are numeric. `+` adds two numbers and otherwise
//! concatenates; `-`, `*`, `/` need two numeric operands. Absent, null,
//! boolean, and container fields cannot take part in an expression.

use serde_json::Value;

use recast_core::path::resolve;
use recast_core::types::Record;
use recast_core::value::{display, format_f64, number, parse_number};

use crate::ast::{BinaryOp, Expr};
use crate::error::ExprError;

#[derive(Debug, Clone, PartialEq)]
enum Operand {
    Num(f64),
    Text(String),
}

impl Operand {
    fn as_num(&self, op: BinaryOp) -> Result<f64, ExprError> {
        match self {
            Operand::Num(n) => Ok(*n),
            Operand::Text(s) => parse_number(s).ok_or_else(|| {
                ExprError::Eval(format!("'{s}' is not numeric for '{}'", op.symbol()))
            }),
        }
    }

    fn into_text(self) -> String {
        match self {
            Operand::Num(n) => format_f64(n),
            Operand::Text(s) => s,
        }
    }
}

/// Evaluate `expr` against `record`.
pub fn evaluate(expr: &Expr, record: &Record) -> Result<Value, ExprError> {
    match eval_operand(expr, record)? {
        Operand::Num(n) => {
            number(n).ok_or_else(|| ExprError::Eval("result is not a finite number".into()))
        }
        Operand::Text(s) => Ok(Value::String(s)),
    }
}

fn eval_operand(expr: &Expr, record: &Record) -> Result<Operand, ExprError> {
    match expr {
        Expr::Number(n) => Ok(Operand::Num(*n)),
        Expr::Str(s) => Ok(Operand::Text(s.clone())),
        Expr::Field(path) => field_operand(record, path),
        Expr::Neg(inner) => {
            let v = eval_operand(inner, record)?;
            match v {
                Operand::Num(n) => Ok(Operand::Num(-n)),
                Operand::Text(s) => parse_number(&s).map(|n| Operand::Num(-n)).ok_or_else(|| {
                    ExprError::Eval(format!("cannot negate non-numeric '{s}'"))
                }),
            }
        }
        Expr::Binary { op, lhs, rhs } => {
            let l = eval_operand(lhs, record)?;
            let r = eval_operand(rhs, record)?;
            apply(*op, l, r)
        }
    }
}

fn field_operand(record: &Record, path: &str) -> Result<Operand, ExprError> {
    match resolve(record, path) {
        None => Err(ExprError::Eval(format!("field '{path}' is absent"))),
        Some(Value::Null) => Err(ExprError::Eval(format!("field '{path}' is null"))),
        Some(Value::Number(n)) => n
            .as_f64()
            .map(Operand::Num)
            .ok_or_else(|| ExprError::Eval(format!("field '{path}' is not a float64"))),
        Some(Value::String(s)) => Ok(match parse_number(s) {
            Some(n) => Operand::Num(n),
            None => Operand::Text(s.clone()),
        }),
        Some(other) => Err(ExprError::Eval(format!(
            "field '{path}' holds {} which cannot be used in an expression",
            display(other)
        ))),
    }
}

fn apply(op: BinaryOp, l: Operand, r: Operand) -> Result<Operand, ExprError> {
    if op == BinaryOp::Add {
        return Ok(match (l, r) {
            (Operand::Num(a), Operand::Num(b)) => Operand::Num(a + b),
            (l, r) => Operand::Text(l.into_text() + &r.into_text()),
        });
    }
    let a = l.as_num(op)?;
    let b = r.as_num(op)?;
    match op {
        BinaryOp::Sub => Ok(Operand::Num(a - b)),
        BinaryOp::Mul => Ok(Operand::Num(a * b)),
        BinaryOp::Div if b == 0.0 => Err(ExprError::Eval("division by zero".into())),
        BinaryOp::Div => Ok(Operand::Num(a / b)),
        BinaryOp::Add => Ok(Operand::Num(a + b)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use serde_json::json;

    fn eval(src: &str, record: Value) -> Result<Value, ExprError> {
        let expr = parse(src).unwrap();
        evaluate(&expr, record.as_object().unwrap())
    }

    #[test]
    fn arithmetic_over_fields() {
        let r = json!({"price": 2.5, "qty": 4, "order": {"discount": "1"}});
        assert_eq!(eval("price * qty", r.clone()).unwrap(), json!(10));
        assert_eq!(eval("price * qty - order.discount", r.clone()).unwrap(), json!(9));
        assert_eq!(eval("(qty + 1) / 2", r.clone()).unwrap(), json!(2.5));
        assert_eq!(eval("-qty", r).unwrap(), json!(-4));
    }

    #[test]
    fn plus_concatenates_text() {
        let r = json!({"first": "Ada", "last": "Lovelace", "n": 3});
        assert_eq!(
            eval("first + ' ' + last", r.clone()).unwrap(),
            json!("Ada Lovelace")
        );
        assert_eq!(eval("'#' + n", r).unwrap(), json!("#3"));
    }

    #[test]
    fn non_numeric_operands_fail_per_record() {
        let r = json!({"price": "abc", "qty": 2, "flag": true});
        assert!(matches!(eval("price * qty", r.clone()), Err(ExprError::Eval(_))));
        assert!(matches!(eval("missing + 1", r.clone()), Err(ExprError::Eval(_))));
        assert!(matches!(eval("flag * 2", r.clone()), Err(ExprError::Eval(_))));
        assert!(matches!(eval("qty / 0", r), Err(ExprError::Eval(_))));
    }
}
