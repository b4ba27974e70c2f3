mod document_repository;
mod in_memory_document_store;
mod mongo_document_store;

pub use document_repository::*;
pub use in_memory_document_store::*;
pub use mongo_document_store::*;
