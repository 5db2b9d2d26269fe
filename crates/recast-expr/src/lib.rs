#![forbid(unsafe_code)]
//! recast-expr: the two constrained expression grammars used by pipeline steps.
//!
//! - [`condition`]: `<path> <operator> <literal>` predicates for `filter`/`if`.
//! - [`parser`] + [`eval`]: arithmetic/string expressions for `compute`,
//!   parsed once into an [`ast::Expr`] and evaluated per record.
//!
//! Nothing here executes caller-supplied text; both grammars are fixed.

pub mod ast;
pub mod condition;
pub mod error;
pub mod eval;
pub mod lexer;
pub mod parser;

pub use ast::{BinaryOp, Expr};
pub use condition::{CompareOp, Condition};
pub use error::ExprError;
pub use eval::evaluate;
pub use parser::parse;
