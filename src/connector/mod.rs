//! # Connector Layer
//!
//! Adapters implementing the application ports:
//! - Generic typed repository over any document collection
//! - MongoDB document store
//! - In-memory document store for tests and local runs
//! - Composition root wiring the store and repositories together

pub mod adapter;
pub mod api;

pub use adapter::*;
pub use api::*;
