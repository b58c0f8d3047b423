//! mrepo Core Types
//!
//! This crate provides the foundational types shared by both evaluators:
//! - Identity types (ObjectId, ObjectRef)
//! - Value types (the Value enum with scalar, reference, view and collection values)
//! - The AccessPort trait through which evaluators reach the model
//! - The BindingTable query result representation

mod error;
mod id;
mod port;
mod table;
mod value;

pub use error::*;
pub use id::*;
pub use port::*;
pub use table::*;
pub use value::*;
