//! mrepo OCL
//!
//! Tree-walking evaluator for object-constraint expressions.
//!
//! Responsibilities:
//! - Define the constraint expression AST
//! - Evaluate expressions against a model through the access port
//! - Scope variables for let, iterate and iterator bodies
//! - Provide the collection, string and numeric operation library
//! - Dispatch type tests, casts and user-defined operations

mod ast;
mod config;
mod error;
mod eval;
mod iterators;
mod library;
mod operators;
mod scope;

pub use ast::{CollectionPart, Expr, InfixOp, IteratorKind, Literal, PrefixOp, TypeName, TypeOpKind};
pub use config::EvalConfig;
pub use error::{EvalError, EvalResult};
pub use eval::Evaluator;
pub use scope::Scope;
