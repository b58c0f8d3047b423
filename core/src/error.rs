//! Access port error types.

use crate::ObjectId;
use thiserror::Error;

/// Errors an access port may report back to an evaluator.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum PortError {
    /// The referenced element does not exist in the model.
    #[error("Unknown object: {0}")]
    UnknownObject(ObjectId),

    /// No definition of the operation on the class or its ancestors.
    #[error("Unknown operation '{operation}' on class '{class}'")]
    UnknownOperation { class: String, operation: String },

    /// The operation body itself failed.
    #[error("Operation '{operation}' failed: {message}")]
    OperationFailed { operation: String, message: String },
}

impl PortError {
    pub fn unknown_operation(class: impl Into<String>, operation: impl Into<String>) -> Self {
        Self::UnknownOperation {
            class: class.into(),
            operation: operation.into(),
        }
    }

    pub fn operation_failed(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::OperationFailed {
            operation: operation.into(),
            message: message.into(),
        }
    }
}

/// Result type for access port calls.
pub type PortResult<T> = Result<T, PortError>;
