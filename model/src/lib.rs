//! mrepo Model
//!
//! In-memory reference implementation of the access port.
//!
//! Responsibilities:
//! - Class registry with multiple inheritance and subclass index
//! - Objects with stored properties and per-class derived properties
//! - Named associations with forward and reverse adjacency
//! - User-defined operations dispatched along the inheritance chain

mod builder;
mod class;
mod error;
mod index;
mod model;

pub use builder::{ClassBuilder, ModelBuilder};
pub use class::{ClassDef, DerivedFn, OperationDef, OperationFn};
pub use error::{ModelError, ModelResult};
pub use model::Model;
