//! # Domain Layer
//!
//! The entity contract, declarative filters and the error taxonomy.
//! This layer is independent of the document store driver.

mod error;
pub mod models;

pub use error::*;
pub use models::*;
