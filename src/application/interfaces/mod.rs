mod document_store;
mod repository;

pub use document_store::*;
pub use repository::*;
