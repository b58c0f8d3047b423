//! Evaluation error types.

use mrepo_core::PortError;
use thiserror::Error;

/// Errors that abort a constraint evaluation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    /// Operator symbol not recognized.
    #[error("Unknown operator '{op}'")]
    UnknownOperator { op: String },

    /// Iterator name not recognized.
    #[error("Unknown iterator '{name}'")]
    UnknownIterator { name: String },

    /// No built-in or user-defined operation of that name on the receiver.
    #[error("Unknown operation '{name}' on {receiver}")]
    UnknownOperation { name: String, receiver: String },

    /// Variable not in scope and not a property of self.
    #[error("Unbound variable '{name}'")]
    UnboundVariable { name: String },

    /// Operand of the wrong type for the operation.
    #[error("type mismatch: {message}")]
    TypeMismatch { message: String },

    /// A declared parameter had no positional argument.
    #[error("missing required argument '{parameter}' for operation '{operation}'")]
    MissingArgument { operation: String, parameter: String },

    /// More arguments than the operation declares.
    #[error("operation '{operation}' takes {expected} argument(s), got {found}")]
    TooManyArguments {
        operation: String,
        expected: usize,
        found: usize,
    },

    /// The access port failed to invoke an operation.
    #[error("operation invocation failed: {0}")]
    InvocationFailed(#[from] PortError),

    /// Enum literal without a `Kind::Literal` shape.
    #[error("malformed enum literal '{literal}'")]
    MalformedEnumLiteral { literal: String },

    /// Type operand did not name a type.
    #[error("type expression must evaluate to a type name, got {found}")]
    InvalidTypeExpression { found: String },

    /// 1-based index outside the collection or string.
    #[error("index {index} out of range for size {size}")]
    IndexOutOfRange { index: i64, size: usize },

    /// Division by zero.
    #[error("Division by zero")]
    DivisionByZero,

    /// Ordering requested between incomparable values.
    #[error("values are not comparable: {left} and {right}")]
    NotComparable { left: String, right: String },

    /// Expression nesting deeper than the configured limit.
    #[error("evaluation depth limit {limit} exceeded")]
    DepthExceeded { limit: usize },
}

impl EvalError {
    pub fn unknown_operator(op: impl Into<String>) -> Self {
        Self::UnknownOperator { op: op.into() }
    }

    pub fn unknown_iterator(name: impl Into<String>) -> Self {
        Self::UnknownIterator { name: name.into() }
    }

    pub fn unknown_operation(name: impl Into<String>, receiver: impl Into<String>) -> Self {
        Self::UnknownOperation {
            name: name.into(),
            receiver: receiver.into(),
        }
    }

    pub fn unbound_variable(name: impl Into<String>) -> Self {
        Self::UnboundVariable { name: name.into() }
    }

    pub fn type_mismatch(message: impl Into<String>) -> Self {
        Self::TypeMismatch {
            message: message.into(),
        }
    }

    pub fn missing_argument(operation: impl Into<String>, parameter: impl Into<String>) -> Self {
        Self::MissingArgument {
            operation: operation.into(),
            parameter: parameter.into(),
        }
    }

    pub fn too_many_arguments(operation: impl Into<String>, expected: usize, found: usize) -> Self {
        Self::TooManyArguments {
            operation: operation.into(),
            expected,
            found,
        }
    }

    pub fn malformed_enum_literal(literal: impl Into<String>) -> Self {
        Self::MalformedEnumLiteral {
            literal: literal.into(),
        }
    }

    pub fn invalid_type_expression(found: impl Into<String>) -> Self {
        Self::InvalidTypeExpression {
            found: found.into(),
        }
    }

    pub fn index_out_of_range(index: i64, size: usize) -> Self {
        Self::IndexOutOfRange { index, size }
    }

    pub fn not_comparable(left: impl Into<String>, right: impl Into<String>) -> Self {
        Self::NotComparable {
            left: left.into(),
            right: right.into(),
        }
    }
}

/// Result type for evaluation.
pub type EvalResult<T> = Result<T, EvalError>;
