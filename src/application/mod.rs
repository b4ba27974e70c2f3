//! # Application Layer
//!
//! Ports: the typed repository surface and the document store seam the
//! connector adapters implement.

mod interfaces;

pub use interfaces::*;
