//! Model construction error types.

use mrepo_core::ObjectId;
use thiserror::Error;

/// Errors that can occur while building a model.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Class name already defined.
    #[error("Duplicate class name: {0}")]
    DuplicateClass(String),

    /// Parent class not defined before its child.
    #[error("Unknown parent class: {0}")]
    UnknownParentClass(String),

    /// Class name not defined.
    #[error("Unknown class: {0}")]
    UnknownClass(String),

    /// Association name already defined.
    #[error("Duplicate association name: {0}")]
    DuplicateAssociation(String),

    /// Association name not defined.
    #[error("Unknown association: {0}")]
    UnknownAssociation(String),

    /// Object id not created by this builder.
    #[error("Unknown object: {0}")]
    UnknownObject(ObjectId),
}

/// Result type for model construction.
pub type ModelResult<T> = Result<T, ModelError>;
