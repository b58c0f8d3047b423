//! mrepo GQL
//!
//! Graph-pattern queries over a model reached through the access port.
//!
//! Responsibilities:
//! - Define the query AST (MATCH / OPTIONAL MATCH / WHERE / RETURN)
//! - Match node, edge, quantified and nested path patterns
//! - Evaluate WHERE and RETURN expressions and built-in functions
//! - Project bindings into a named-column result table

mod ast;
mod binding;
mod config;
mod error;
mod eval;
mod executor;
mod functions;
mod matcher;

pub use ast::{
    BinaryOp, Direction, EdgePattern, Expr, MatchClause, NodePattern, PathElement, PathPattern,
    Projection, Quantifier, Query, ReturnClause, ReturnItem, UnaryOp,
};
pub use binding::Binding;
pub use config::ExecutorConfig;
pub use error::{QueryError, QueryResult};
pub use executor::QueryExecutor;
