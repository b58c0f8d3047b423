//! Query error types.

use thiserror::Error;

/// Result type for query operations.
pub type QueryResult<T> = Result<T, QueryError>;

/// Errors that abort query execution.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryError {
    /// Unbound variable in expression.
    #[error("Unbound variable '{name}'")]
    UnboundVariable { name: String },

    /// Type mismatch in expression.
    #[error("Type error: {message}")]
    TypeError { message: String },

    /// Unknown built-in function name.
    #[error("Unknown function '{name}'")]
    UnknownFunction { name: String },

    /// Bad argument count or value for a built-in function.
    #[error("Invalid argument to {function}: {message}")]
    InvalidArgument { function: String, message: String },

    /// Division by zero.
    #[error("Division by zero")]
    DivisionByZero,

    /// Path pattern with misplaced edges.
    #[error("Invalid pattern: {message}")]
    InvalidPattern { message: String },

    /// Quantifier with min greater than max.
    #[error("Invalid quantifier: {message}")]
    InvalidQuantifier { message: String },
}

impl QueryError {
    pub fn unbound_variable(name: impl Into<String>) -> Self {
        Self::UnboundVariable { name: name.into() }
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        Self::TypeError {
            message: message.into(),
        }
    }

    pub fn unknown_function(name: impl Into<String>) -> Self {
        Self::UnknownFunction { name: name.into() }
    }

    pub fn invalid_argument(function: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            function: function.into(),
            message: message.into(),
        }
    }

    pub fn invalid_pattern(message: impl Into<String>) -> Self {
        Self::InvalidPattern {
            message: message.into(),
        }
    }

    pub fn invalid_quantifier(message: impl Into<String>) -> Self {
        Self::InvalidQuantifier {
            message: message.into(),
        }
    }
}
